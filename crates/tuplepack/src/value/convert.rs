// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversions between Rust values and [`Value`].
//!
//! `ToValue`/`FromValue` are what `#[derive(Schema)]` calls for every
//! field. `Option<T>` maps `None` to the absent marker; every other type
//! rejects `Nil` with [`ValueError::MissingField`].

use super::{Record, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Errors converting a [`Value`] back into a Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Value has the wrong shape for the target type.
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Required (non-`Option`) field holds the absent marker.
    MissingField { path: String },
    /// Integer does not fit the target type.
    OutOfRange {
        path: String,
        target: &'static str,
        value: i64,
    },
    /// Record belongs to a different owning type.
    WrongRecordType {
        path: String,
        expected: String,
        found: String,
    },
}

impl ValueError {
    /// Build a mismatch error for `found`, reporting `Nil` as a missing field.
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        if found.is_nil() {
            Self::MissingField {
                path: String::new(),
            }
        } else {
            Self::TypeMismatch {
                path: String::new(),
                expected,
                found: found.kind_name(),
            }
        }
    }

    /// Prefix the error path with an enclosing field name.
    #[must_use]
    pub fn in_field(mut self, field: &str) -> Self {
        let path = match &mut self {
            Self::TypeMismatch { path, .. }
            | Self::MissingField { path }
            | Self::OutOfRange { path, .. }
            | Self::WrongRecordType { path, .. } => path,
        };
        *path = if path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", field, path)
        };
        self
    }

    /// Field path the error refers to (empty for the top-level value).
    pub fn path(&self) -> &str {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::MissingField { path }
            | Self::OutOfRange { path, .. }
            | Self::WrongRecordType { path, .. } => path,
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = |path: &str| {
            if path.is_empty() {
                String::from("<value>")
            } else {
                path.to_string()
            }
        };
        match self {
            Self::TypeMismatch {
                path,
                expected,
                found,
            } => write!(f, "{}: expected {}, found {}", at(path), expected, found),
            Self::MissingField { path } => write!(f, "{}: required field is absent", at(path)),
            Self::OutOfRange {
                path,
                target,
                value,
            } => write!(f, "{}: {} does not fit in {}", at(path), value, target),
            Self::WrongRecordType {
                path,
                expected,
                found,
            } => write!(
                f,
                "{}: expected record of type {}, found {}",
                at(path),
                expected,
                found
            ),
        }
    }
}

impl std::error::Error for ValueError {}

/// Convert a Rust value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Rebuild a Rust value from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(ValueError::mismatch("bool", &other)),
        }
    }
}

/// Generate integer conversions through `i64` (range-checked on the way back).
macro_rules! impl_int_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(v).map_err(|_| ValueError::OutOfRange {
                            path: String::new(),
                            target: stringify!($ty),
                            value: v,
                        }),
                        other => Err(ValueError::mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

impl_int_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(ValueError::mismatch("f64", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            #[allow(clippy::cast_possible_truncation)] // f32 fields round-trip through f64 exactly
            Value::Float(v) => Ok(v as f32),
            other => Err(ValueError::mismatch("f32", &other)),
        }
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(v) => Ok(v),
            other => Err(ValueError::mismatch("string", &other)),
        }
    }
}

impl ToValue for Record {
    fn to_value(&self) -> Value {
        Value::Record(self.clone())
    }
}

impl FromValue for Record {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Record(v) => Ok(v),
            other => Err(ValueError::mismatch("record", &other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Nil, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.in_field(&i.to_string())))
                .collect(),
            other => Err(ValueError::mismatch("list", &other)),
        }
    }
}

impl<T: ToValue> ToValue for BTreeMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (Value::Str(k.clone()), v.to_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(pairs) => pairs
                .into_iter()
                .map(|(k, v)| {
                    let key = String::from_value(k).map_err(|e| e.in_field("<key>"))?;
                    let value = T::from_value(v).map_err(|e| e.in_field(&key))?;
                    Ok((key, value))
                })
                .collect(),
            other => Err(ValueError::mismatch("map", &other)),
        }
    }
}
