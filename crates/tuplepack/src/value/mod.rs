// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value model.
//!
//! `Value` is the term domain the engine and the generic value codec work
//! on: scalars, ordered containers, and record instances. `Value::Nil` is
//! the absent marker placed in tuple slots for fields without a value.

mod convert;
mod record;

pub use convert::{FromValue, ToValue, ValueError};
pub use record::{OwningType, Record};

/// A dynamic value that can hold any serializable term.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent marker (no value set).
    #[default]
    Nil,

    // Scalars
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Symbolic constant (enum-like tag).
    Atom(String),

    // Composites
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered key/value pairs (insertion order is preserved on the wire).
    Map(Vec<(Value, Value)>),
    Record(Record),
}

impl Value {
    /// Build a tuple from anything iterable.
    pub fn tuple<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Tuple(items.into_iter().collect())
    }

    /// Build an atom.
    pub fn atom(name: impl Into<String>) -> Self {
        Self::Atom(name.into())
    }

    /// Check if value is the absent marker.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Atom(_) => "atom",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get the atom name.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get list elements.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get tuple elements.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get map pairs.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Consume into a record.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Read a record field (`None` if this is not a record).
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.as_record().map(|r| r.get(name))
    }

    /// Follow a path of field names through nested records.
    ///
    /// ```ignore
    /// let country = user.path(&["address", "country", "code"]);
    /// ```
    pub fn path(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, name| current.get_field(name))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}
