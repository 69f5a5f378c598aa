// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::convert::{convert, PayloadType};
use crate::engine::{Ctx, Data, NodeError};

/// Declared type of one parameter of a [`Callable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// The invocation context.
    Context,
    /// An optional error.
    Error,
    /// Accepts anything, including the context and the error.
    Any,
    /// A concrete payload type.
    Payload(PayloadType),
}

impl ParamType {
    pub fn payload<T: 'static>() -> Self {
        ParamType::Payload(PayloadType::of::<T>())
    }

    pub fn accepts_context(&self) -> bool {
        matches!(self, ParamType::Context | ParamType::Any)
    }

    pub fn accepts_error(&self) -> bool {
        matches!(self, ParamType::Error | ParamType::Any)
    }

    /// Convert a payload to this parameter's type.
    ///
    /// `Any` takes the payload unchanged. `Error` only takes a payload that
    /// already holds a [`NodeError`]; `Context` takes nothing.
    pub fn convert(&self, data: &Data) -> Option<Data> {
        match self {
            ParamType::Any => Some(data.clone()),
            ParamType::Payload(target) => convert(data, target),
            ParamType::Error => data.is::<NodeError>().then(|| data.clone()),
            ParamType::Context => None,
        }
    }
}

/// A callable whose shape is only known at runtime.
///
/// This is the escape hatch for handlers that cannot be typed at compile
/// time. The structural adapter checks [`Callable::params`] once when the
/// callable is registered and then calls [`Callable::call`] with the payload
/// already converted to the declared third parameter type.
pub trait Callable: Send + Sync + 'static {
    /// Name used in logs when the shape is rejected.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn params(&self) -> &[ParamType];

    fn call(&self, ctx: &Ctx, error: Option<&NodeError>, payload: Option<&Data>);
}
