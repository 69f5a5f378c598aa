// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dynamic payloads carried through the graph.
//!
//! Every value travelling between nodes is a [`Value`]: a data-class payload
//! ([`Data`]), an error-class payload ([`NodeError`]) or the absent payload
//! ([`Value::Empty`]). Nodes match on the variant at every hop; nothing about
//! the class is cached on the node.

use std::any::{Any, TypeId};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Shared error payload.
pub type NodeError = Arc<dyn Error + Send + Sync + 'static>;

/// Shared, type-erased data payload.
#[derive(Clone)]
pub struct Data {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Data {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an already boxed value whose concrete type is not known statically.
    pub fn from_boxed(value: Box<dyn Any + Send + Sync>) -> Self {
        Self {
            inner: Arc::from(value),
            type_name: "<dynamic>",
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// `TypeId` of the payload itself, not of the shared pointer around it.
    pub fn type_id(&self) -> TypeId {
        Any::type_id(self.inner.as_ref())
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data({})", self.type_name)
    }
}

/// Which branch of a handler a value is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Data,
    Error,
    Empty,
}

impl ValueClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueClass::Data => "data",
            ValueClass::Error => "error",
            ValueClass::Empty => "empty",
        }
    }
}

/// A payload moving through the graph.
#[derive(Clone, Debug)]
pub enum Value {
    Data(Data),
    Error(NodeError),
    /// The absent payload. Delivered on the data branch with no data.
    Empty,
}

impl Value {
    /// Wrap `value` as a data-class payload without inspecting it.
    pub fn data<T: Any + Send + Sync>(value: T) -> Self {
        Value::Data(Data::new(value))
    }

    /// Wrap any error type as an error-class payload.
    ///
    /// This is the way to send a concrete error type such as `ParseIntError`
    /// or a crate's own error enum; [`Value::of`] cannot see the `Error`
    /// impl of an arbitrary type.
    pub fn error<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Value::Error(Arc::new(error))
    }

    /// `Ok` becomes data (through [`Value::of`]), `Err` becomes an error.
    ///
    /// ```
    /// use signalflow::{Value, ValueClass};
    ///
    /// assert_eq!(Value::from_result("7".parse::<i32>()).class(), ValueClass::Data);
    /// assert_eq!(Value::from_result("x".parse::<i32>()).class(), ValueClass::Error);
    /// ```
    pub fn from_result<T, E>(result: Result<T, E>) -> Self
    where
        T: Any + Send + Sync,
        E: Error + Send + Sync + 'static,
    {
        match result {
            Ok(value) => Value::of(value),
            Err(error) => Value::error(error),
        }
    }

    /// Classify a value whose type is only known as `Any`.
    ///
    /// Only these are recognized as errors: `NodeError`, boxed
    /// `dyn Error + Send + Sync`, `std::io::Error` and `anyhow::Error`. `()`
    /// becomes [`Value::Empty`]; a `Value` or `Data` is taken as is. Every
    /// other type, including error types not in that list, is data: use
    /// [`Value::error`] or [`Value::from_result`] for those.
    ///
    /// ```
    /// use signalflow::Value;
    ///
    /// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk");
    /// assert!(Value::of(err).is_error());
    /// assert!(!Value::of(vec![1, 2, 3]).is_error());
    /// ```
    pub fn of<T: Any + Send + Sync>(value: T) -> Self {
        Self::classify(Box::new(value))
    }

    /// Runtime classification of a boxed value. See [`Value::of`].
    pub fn classify(value: Box<dyn Any + Send + Sync>) -> Self {
        let value = match value.downcast::<Value>() {
            Ok(v) => return *v,
            Err(other) => other,
        };
        let value = match value.downcast::<Data>() {
            Ok(d) => return Value::Data(*d),
            Err(other) => other,
        };
        let value = match value.downcast::<NodeError>() {
            Ok(e) => return Value::Error(*e),
            Err(other) => other,
        };
        let value = match value.downcast::<Box<dyn Error + Send + Sync>>() {
            Ok(e) => return Value::Error(Arc::from(*e)),
            Err(other) => other,
        };
        let value = match value.downcast::<std::io::Error>() {
            Ok(e) => return Value::Error(Arc::new(*e)),
            Err(other) => other,
        };
        let value = match value.downcast::<anyhow::Error>() {
            Ok(e) => {
                let boxed: Box<dyn Error + Send + Sync> = (*e).into();
                return Value::Error(Arc::from(boxed));
            }
            Err(other) => other,
        };
        if value.is::<()>() {
            return Value::Empty;
        }
        Value::Data(Data::from_boxed(value))
    }

    pub fn class(&self) -> ValueClass {
        match self {
            Value::Data(_) => ValueClass::Data,
            Value::Error(_) => ValueClass::Error,
            Value::Empty => ValueClass::Empty,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_data(&self) -> Option<&Data> {
        match self {
            Value::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&NodeError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Shortcut for `as_data()` followed by a downcast.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_data().and_then(Data::downcast_ref::<T>)
    }
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        Value::Data(data)
    }
}

impl From<NodeError> for Value {
    fn from(error: NodeError) -> Self {
        Value::Error(error)
    }
}

impl From<Option<Data>> for Value {
    fn from(data: Option<Data>) -> Self {
        data.map(Value::Data).unwrap_or(Value::Empty)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Empty
    }
}

macro_rules! data_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::data(value)
                }
            }
        )*
    };
}

data_from!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    String, &'static str, Vec<u8>,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl Error for Boom {}

    #[test]
    fn classify_recognizes_error_carriers() {
        let shared: NodeError = Arc::new(Boom);
        assert!(Value::of(shared).is_error());

        let boxed: Box<dyn Error + Send + Sync> = Box::new(Boom);
        assert!(Value::of(boxed).is_error());

        assert!(Value::of(anyhow::anyhow!("bad input")).is_error());
        assert!(Value::of(std::io::Error::new(std::io::ErrorKind::Other, "io")).is_error());
    }

    #[test]
    fn classify_keeps_plain_values_as_data() {
        let value = Value::of(vec![3, 1]);
        assert_eq!(value.class(), ValueClass::Data);
        assert_eq!(value.downcast_ref::<Vec<i32>>(), Some(&vec![3, 1]));
    }

    #[test]
    fn classify_unit_is_empty_and_value_passes_through() {
        assert_eq!(Value::of(()).class(), ValueClass::Empty);

        let inner = Value::from(7u8);
        let outer = Value::of(inner);
        assert_eq!(outer.downcast_ref::<u8>(), Some(&7));
    }

    #[test]
    fn data_reports_payload_type_id() {
        let data = Data::new(42i64);
        assert_eq!(data.type_id(), TypeId::of::<i64>());
        assert!(data.is::<i64>());
        assert!(!data.is::<i32>());

        let dynamic = Data::from_boxed(Box::new(1.5f32));
        assert_eq!(dynamic.type_id(), TypeId::of::<f32>());
        assert_eq!(dynamic.type_name(), "<dynamic>");
    }

    #[test]
    fn concrete_error_types_need_the_explicit_constructor() {
        assert_eq!(Value::of(Boom).class(), ValueClass::Data);

        assert!(Value::error(Boom).is_error());
        let parse = "x".parse::<i32>().unwrap_err();
        assert!(Value::error(parse).is_error());

        let failed: Result<u8, Boom> = Err(Boom);
        assert!(Value::from_result(failed).is_error());
        let ok: Result<u8, Boom> = Ok(3);
        assert_eq!(Value::from_result(ok).downcast_ref::<u8>(), Some(&3));
        let unit: Result<(), Boom> = Ok(());
        assert_eq!(Value::from_result(unit).class(), ValueClass::Empty);
    }

    #[test]
    fn error_display_survives_wrapping() {
        let value = Value::error(Boom);
        assert_eq!(value.as_error().map(|e| e.to_string()), Some("boom".to_string()));
        assert!(value.as_data().is_none());
    }
}
