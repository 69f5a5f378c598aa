// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime payload conversion used by the structural adapter.
//!
//! A payload converts to a target type when it already is that type, when both
//! are primitive numbers (converted with `as` semantics, so narrowing wraps
//! and floats truncate), or between the string-like types `String`,
//! `&'static str` and `Vec<u8>`. Anything else fails and the adapted call is
//! skipped.

use std::any::TypeId;

use crate::engine::value::Data;

/// A payload type known only at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadType {
    id: TypeId,
    name: &'static str,
}

impl PayloadType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i128),
    Uint(u128),
    Float(f64),
}

macro_rules! read_number {
    ($data:expr, $variant:ident as $wide:ty => $($t:ty),*) => {
        $(
            if let Some(v) = $data.downcast_ref::<$t>() {
                return Some(Number::$variant(*v as $wide));
            }
        )*
    };
}

fn as_number(data: &Data) -> Option<Number> {
    read_number!(data, Int as i128 => i8, i16, i32, i64, i128, isize);
    read_number!(data, Uint as u128 => u8, u16, u32, u64, u128, usize);
    read_number!(data, Float as f64 => f32, f64);
    None
}

macro_rules! write_number {
    ($target:expr, $number:expr => $($t:ty),*) => {
        $(
            if $target == TypeId::of::<$t>() {
                let converted = match $number {
                    Number::Int(v) => v as $t,
                    Number::Uint(v) => v as $t,
                    Number::Float(v) => v as $t,
                };
                return Some(Data::new(converted));
            }
        )*
    };
}

fn number_to(target: TypeId, number: Number) -> Option<Data> {
    write_number!(
        target, number =>
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
    );
    None
}

fn as_text(data: &Data) -> Option<Vec<u8>> {
    if let Some(s) = data.downcast_ref::<String>() {
        return Some(s.clone().into_bytes());
    }
    if let Some(s) = data.downcast_ref::<&'static str>() {
        return Some(s.as_bytes().to_vec());
    }
    data.downcast_ref::<Vec<u8>>().cloned()
}

fn text_to(target: TypeId, bytes: Vec<u8>) -> Option<Data> {
    if target == TypeId::of::<String>() {
        return Some(Data::new(String::from_utf8_lossy(&bytes).into_owned()));
    }
    if target == TypeId::of::<Vec<u8>>() {
        return Some(Data::new(bytes));
    }
    None
}

/// Convert `data` to `target`, returning `None` when no conversion exists.
pub fn convert(data: &Data, target: &PayloadType) -> Option<Data> {
    if data.type_id() == target.id() {
        return Some(data.clone());
    }
    if let Some(number) = as_number(data) {
        return number_to(target.id(), number);
    }
    if let Some(bytes) = as_text(data) {
        return text_to(target.id(), bytes);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keeps_the_same_payload() {
        let data = Data::new(vec![1u16, 2]);
        let converted = convert(&data, &PayloadType::of::<Vec<u16>>()).unwrap();
        assert_eq!(converted.downcast_ref::<Vec<u16>>(), Some(&vec![1, 2]));
    }

    #[test]
    fn numbers_convert_between_widths() {
        let data = Data::new(42i32);
        let wide = convert(&data, &PayloadType::of::<i64>()).unwrap();
        assert_eq!(wide.downcast_ref::<i64>(), Some(&42));

        let float = convert(&data, &PayloadType::of::<f64>()).unwrap();
        assert_eq!(float.downcast_ref::<f64>(), Some(&42.0));

        let truncated = convert(&Data::new(3.9f64), &PayloadType::of::<u8>()).unwrap();
        assert_eq!(truncated.downcast_ref::<u8>(), Some(&3));
    }

    #[test]
    fn narrowing_wraps() {
        let wrapped = convert(&Data::new(300u32), &PayloadType::of::<u8>()).unwrap();
        assert_eq!(wrapped.downcast_ref::<u8>(), Some(&44));
    }

    #[test]
    fn text_converts_between_string_and_bytes() {
        let bytes = convert(&Data::new("hi"), &PayloadType::of::<Vec<u8>>()).unwrap();
        assert_eq!(bytes.downcast_ref::<Vec<u8>>(), Some(&b"hi".to_vec()));

        let text = convert(&Data::new(b"ok".to_vec()), &PayloadType::of::<String>()).unwrap();
        assert_eq!(text.downcast_ref::<String>().map(String::as_str), Some("ok"));
    }

    #[test]
    fn unrelated_types_do_not_convert() {
        assert!(convert(&Data::new("12"), &PayloadType::of::<i32>()).is_none());
        assert!(convert(&Data::new(12i32), &PayloadType::of::<String>()).is_none());
        assert!(convert(&Data::new(vec![1i32]), &PayloadType::of::<Vec<i64>>()).is_none());
    }
}
