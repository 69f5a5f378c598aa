// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Handler shapes and their adaptation into the canonical [`Handler`].
//!
//! Callers can hand the engine any of the [`Shape`] variants; every variant is
//! resolved once, at registration, into the one form nodes execute:
//! `(ctx, Option<&NodeError>, Option<&Data>)`.
//!
//! | Shape      | Error branch                    | Data branch                               |
//! |------------|---------------------------------|-------------------------------------------|
//! | `Handler`  | called as is                    | called as is                              |
//! | `Data`     | error forwarded via `write`     | data handler called, payload may be absent|
//! | `Error`    | payload forwarded via `write`   | error handler called with `None`          |
//! | `Typed`    | called with `(ctx, err, None)`  | payload downcast/converted, else skipped  |
//! | `Dynamic`  | called with `(ctx, err, None)`  | payload converted to param 3, else skipped|
//!
//! Only `Dynamic` can be rejected: it must declare exactly three parameters,
//! the first accepting the context and the second accepting the error.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::engine::context::Ctx;
use crate::engine::value::{Data, NodeError, Value};
use crate::observability::messages::{node::ShapeRejected, StructuredLog};
use crate::traits::{Callable, ParamType};

/// The canonical handler every node executes.
pub type Handler = Arc<dyn Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync>;

/// Handler that only cares about data.
pub type DataHandler = Arc<dyn Fn(&Ctx, Option<&Data>) + Send + Sync>;

/// Handler that only cares about errors.
pub type ErrorHandler = Arc<dyn Fn(&Ctx, Option<&NodeError>) + Send + Sync>;

/// Every handler form the engine accepts.
#[derive(Clone)]
pub enum Shape {
    Handler(Handler),
    Data(DataHandler),
    Error(ErrorHandler),
    Dynamic(Arc<dyn Callable>),
}

impl Shape {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync + 'static,
    {
        Shape::Handler(Arc::new(f))
    }

    pub fn data<F>(f: F) -> Self
    where
        F: Fn(&Ctx, Option<&Data>) + Send + Sync + 'static,
    {
        Shape::Data(Arc::new(f))
    }

    pub fn error<F>(f: F) -> Self
    where
        F: Fn(&Ctx, Option<&NodeError>) + Send + Sync + 'static,
    {
        Shape::Error(Arc::new(f))
    }

    /// A handler whose payload type is fixed at compile time.
    ///
    /// Resolves straight to a canonical handler, see [`wrap_typed`].
    pub fn typed<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Ctx, Option<&NodeError>, Option<&T>) + Send + Sync + 'static,
    {
        Shape::Handler(wrap_typed(f))
    }

    pub fn dynamic(callable: impl Callable) -> Self {
        Shape::Dynamic(Arc::new(callable))
    }
}

impl From<Handler> for Shape {
    fn from(handler: Handler) -> Self {
        Shape::Handler(handler)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Handler(_) => f.write_str("Shape::Handler"),
            Shape::Data(_) => f.write_str("Shape::Data"),
            Shape::Error(_) => f.write_str("Shape::Error"),
            Shape::Dynamic(c) => write!(f, "Shape::Dynamic({})", c.name()),
        }
    }
}

/// Resolve any shape into the canonical handler.
///
/// Returns `None` only for a [`Shape::Dynamic`] the structural adapter rejects.
pub fn resolve(shape: Shape) -> Option<Handler> {
    match shape {
        Shape::Handler(handler) => Some(handler),
        Shape::Data(dh) => Some(wrap_data(dh)),
        Shape::Error(eh) => Some(wrap_error(eh)),
        Shape::Dynamic(callable) => adapt(callable),
    }
}

/// Wrap a data handler. Errors are forwarded through the running node's own
/// `write`; without an error the handler runs, with `None` for an absent payload.
pub fn wrap_data(dh: DataHandler) -> Handler {
    Arc::new(move |ctx: &Ctx, err: Option<&NodeError>, data: Option<&Data>| {
        match err {
            Some(err) => ctx.rw().write(ctx, Value::Error(Arc::clone(err))),
            None => dh(ctx, data),
        }
    })
}

/// Wrap an error handler.
///
/// With no error present the handler is called with `None`; when an error is
/// present the payload (absent on the error branch) is forwarded through the
/// running node's `write`.
pub fn wrap_error(eh: ErrorHandler) -> Handler {
    Arc::new(move |ctx: &Ctx, err: Option<&NodeError>, data: Option<&Data>| {
        if err.is_none() {
            eh(ctx, None);
            return;
        }
        ctx.rw().write(ctx, Value::from(data.cloned()));
    })
}

/// Wrap a handler typed on its payload.
///
/// On the data branch the payload is downcast to `T`, falling back to the
/// runtime conversions in [`crate::engine::convert`]. When neither works the
/// call is skipped.
pub fn wrap_typed<T, F>(f: F) -> Handler
where
    T: Any + Send + Sync,
    F: Fn(&Ctx, Option<&NodeError>, Option<&T>) + Send + Sync + 'static,
{
    let target = ParamType::payload::<T>();
    Arc::new(move |ctx: &Ctx, err: Option<&NodeError>, data: Option<&Data>| {
        if err.is_some() {
            f(ctx, err, None);
            return;
        }
        let Some(data) = data else { return };
        if let Some(value) = data.downcast_ref::<T>() {
            f(ctx, None, Some(value));
            return;
        }
        if let Some(converted) = target.convert(data) {
            if let Some(value) = converted.downcast_ref::<T>() {
                f(ctx, None, Some(value));
            }
        }
    })
}

fn reject(callable: &dyn Callable, reason: &str) -> Option<Handler> {
    ShapeRejected {
        callable: callable.name(),
        reason,
    }
    .log();
    None
}

/// Structural adapter for callables whose shape is only known at runtime.
///
/// Accepts exactly three parameters where the first accepts the context and
/// the second accepts the error. The third parameter's declared type is the
/// payload type every call converts to. Any other shape yields `None`.
pub fn adapt(callable: Arc<dyn Callable>) -> Option<Handler> {
    let params = callable.params();
    if params.len() != 3 {
        return reject(callable.as_ref(), "expected exactly three parameters");
    }
    if !params[0].accepts_context() {
        return reject(callable.as_ref(), "first parameter does not accept the context");
    }
    if !params[1].accepts_error() {
        return reject(callable.as_ref(), "second parameter does not accept an error");
    }
    let payload = params[2];

    Some(Arc::new(
        move |ctx: &Ctx, err: Option<&NodeError>, data: Option<&Data>| {
            if err.is_some() {
                callable.call(ctx, err, None);
                return;
            }
            let Some(data) = data else { return };
            let Some(converted) = payload.convert(data) else {
                return;
            };
            callable.call(ctx, None, Some(&converted));
        },
    ))
}

/// A [`Callable`] built from a closure and an explicit parameter list.
///
/// ```
/// use signalflow::engine::adapter::{adapt, DynamicFn};
/// use signalflow::traits::ParamType;
///
/// let ok = DynamicFn::new(
///     "sum",
///     vec![ParamType::Context, ParamType::Error, ParamType::payload::<i64>()],
///     |_ctx, _err, _payload| {},
/// );
/// assert!(adapt(std::sync::Arc::new(ok)).is_some());
///
/// let two_args = DynamicFn::new("short", vec![ParamType::Context, ParamType::Error], |_, _, _| {});
/// assert!(adapt(std::sync::Arc::new(two_args)).is_none());
/// ```
pub struct DynamicFn<F> {
    name: String,
    params: Vec<ParamType>,
    f: F,
}

impl<F> DynamicFn<F>
where
    F: Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, params: Vec<ParamType>, f: F) -> Self {
        Self {
            name: name.into(),
            params,
            f,
        }
    }
}

impl<F> Callable for DynamicFn<F>
where
    F: Fn(&Ctx, Option<&NodeError>, Option<&Data>) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &[ParamType] {
        &self.params
    }

    fn call(&self, ctx: &Ctx, error: Option<&NodeError>, payload: Option<&Data>) {
        (self.f)(ctx, error, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Runtime, SequentialGenerator};
    use parking_lot::Mutex;

    fn runtime() -> Runtime {
        Runtime::builder()
            .id_generator(SequentialGenerator::new("t"))
            .build()
    }

    fn dynamic(params: Vec<ParamType>) -> Arc<dyn Callable> {
        Arc::new(DynamicFn::new("probe", params, |_, _, _| {}))
    }

    #[test]
    fn rejects_wrong_arity() {
        let two = vec![ParamType::Context, ParamType::Error];
        let four = vec![ParamType::Context, ParamType::Error, ParamType::Any, ParamType::Any];
        assert!(adapt(dynamic(two)).is_none());
        assert!(adapt(dynamic(four)).is_none());
        assert!(adapt(dynamic(vec![])).is_none());
    }

    #[test]
    fn rejects_first_param_that_is_not_a_context() {
        let params = vec![ParamType::payload::<i32>(), ParamType::Error, ParamType::Any];
        assert!(adapt(dynamic(params)).is_none());

        let params = vec![ParamType::Error, ParamType::Error, ParamType::Any];
        assert!(adapt(dynamic(params)).is_none());
    }

    #[test]
    fn rejects_second_param_that_is_not_an_error() {
        let params = vec![ParamType::Context, ParamType::payload::<String>(), ParamType::Any];
        assert!(adapt(dynamic(params)).is_none());

        let params = vec![ParamType::Context, ParamType::Context, ParamType::Any];
        assert!(adapt(dynamic(params)).is_none());
    }

    #[test]
    fn accepts_any_in_context_and_error_positions() {
        let params = vec![ParamType::Any, ParamType::Any, ParamType::payload::<u8>()];
        assert!(adapt(dynamic(params)).is_some());
    }

    #[test]
    fn dynamic_call_converts_payload_to_declared_type() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callable = DynamicFn::new(
            "widen",
            vec![ParamType::Context, ParamType::Error, ParamType::payload::<i64>()],
            move |_ctx, _err, payload| {
                if let Some(v) = payload.and_then(|p| p.downcast_ref::<i64>()) {
                    sink.lock().push(*v);
                }
            },
        );

        let node = runtime()
            .node(Shape::dynamic(callable), crate::engine::DispatchMode::Sync)
            .expect("three-parameter callable is accepted");

        node.read(7i32, None);
        node.read("not a number", None);
        node.read(9u8, None);

        assert_eq!(*seen.lock(), vec![7, 9]);
    }

    #[test]
    fn dynamic_error_branch_passes_no_payload() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let callable = DynamicFn::new(
            "errors",
            vec![ParamType::Context, ParamType::Error, ParamType::Any],
            move |_ctx, err, payload| {
                sink.lock().push((err.map(|e| e.to_string()), payload.is_some()));
            },
        );
        let node = runtime()
            .node(Shape::dynamic(callable), crate::engine::DispatchMode::Sync)
            .unwrap();

        node.read(Value::of(anyhow::anyhow!("broken")), None);
        node.read(Value::Empty, None);

        assert_eq!(*calls.lock(), vec![(Some("broken".to_string()), false)]);
    }

    #[test]
    fn typed_handler_skips_unconvertible_payloads() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let node = runtime().typed_sync(
            move |_ctx: &Ctx, _err: Option<&NodeError>, name: Option<&String>| {
                if let Some(name) = name {
                    sink.lock().push(name.clone());
                }
            },
        );

        node.read("ada", None);
        node.read(3.5f64, None);
        node.read("grace".to_string(), None);

        assert_eq!(*seen.lock(), vec!["ada".to_string(), "grace".to_string()]);
    }

    #[test]
    fn data_wrapper_forwards_errors_through_write() {
        let rt = runtime();
        let handled = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&handled);
        let node = rt.data_sync(move |_ctx, _data| *counter.lock() += 1);

        let forwarded = Arc::new(Mutex::new(Vec::new()));
        let tap = Arc::clone(&forwarded);
        node.signal_node(&rt.sink(move |_ctx: &Ctx, value: &Value| {
            tap.lock().push(value.class());
        }));

        node.read(1u32, None);
        node.read(Value::error(std::fmt::Error), None);

        assert_eq!(*handled.lock(), 1);
        assert_eq!(*forwarded.lock(), vec![crate::engine::ValueClass::Error]);
    }

    #[test]
    fn data_wrapper_runs_on_an_absent_payload() {
        let rt = runtime();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&calls);
        let node = rt.data_sync(move |_ctx, data| {
            recorder.lock().push(data.and_then(|d| d.downcast_ref::<u8>()).copied());
        });

        let forwarded = Arc::new(Mutex::new(0usize));
        let tap = Arc::clone(&forwarded);
        node.signal_node(&rt.sink(move |_ctx: &Ctx, _value: &Value| *tap.lock() += 1));

        node.read((), None);
        node.read(Value::Empty, None);
        node.read(4u8, None);

        assert_eq!(*calls.lock(), vec![None, None, Some(4)]);
        assert_eq!(*forwarded.lock(), 0);
    }

    #[test]
    fn error_wrapper_runs_only_without_an_error() {
        let rt = runtime();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&calls);
        let node = rt.error_sync(move |_ctx, err| recorder.lock().push(err.is_some()));

        let forwarded = Arc::new(Mutex::new(Vec::new()));
        let tap = Arc::clone(&forwarded);
        node.signal_node(&rt.sink(move |_ctx: &Ctx, value: &Value| {
            tap.lock().push(value.class());
        }));

        node.read(5u8, None);
        node.read(Value::error(std::fmt::Error), None);

        assert_eq!(*calls.lock(), vec![false]);
        assert_eq!(*forwarded.lock(), vec![crate::engine::ValueClass::Empty]);
    }
}
