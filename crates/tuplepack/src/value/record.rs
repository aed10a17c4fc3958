// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record instances and owning type identity.

use super::Value;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

static NIL: Value = Value::Nil;

/// Identity of the type a record instance belongs to.
///
/// For derived schemas this is the fully-qualified Rust path
/// (`module_path!()::Ident`). Dynamic records may use any stable string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwningType(Arc<str>);

impl OwningType {
    /// Create a new owning type identity.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Borrow as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for OwningType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OwningType {
    fn from(v: &str) -> Self {
        Self(v.into())
    }
}

impl From<String> for OwningType {
    fn from(v: String) -> Self {
        Self(v.into())
    }
}

impl From<&OwningType> for OwningType {
    fn from(v: &OwningType) -> Self {
        v.clone()
    }
}

/// A record instance: owning type plus named field values.
///
/// A field that was never set reads as [`Value::Nil`]; equality treats a
/// missing field and a `Nil` field as the same thing.
#[derive(Debug, Clone)]
pub struct Record {
    owning_type: OwningType,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record of the given type.
    pub fn new(owning_type: impl Into<OwningType>) -> Self {
        Self {
            owning_type: owning_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Owning type of this record.
    pub fn owning_type(&self) -> &OwningType {
        &self.owning_type
    }

    /// Set a field, returning the previous value if any.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Get a field value (`Nil` when absent).
    pub fn get(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&NIL)
    }

    /// Remove a field and return its value (`Nil` when absent).
    pub fn take(&mut self, name: &str) -> Value {
        self.fields.remove(name).unwrap_or_default()
    }

    /// Iterate over all stored fields in name order, including `Nil` ones.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over fields holding a value.
    pub fn populated(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields().filter(|(_, v)| !v.is_nil())
    }

    /// Number of fields holding a value.
    pub fn populated_len(&self) -> usize {
        self.populated().count()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.owning_type == other.owning_type
            && self.populated_len() == other.populated_len()
            && self.populated().all(|(name, value)| other.get(name) == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_reads_nil() {
        let record = Record::new("app::User").with("name", "ada");
        assert_eq!(record.get("name").as_str(), Some("ada"));
        assert!(record.get("email").is_nil());
    }

    #[test]
    fn test_nil_field_equals_missing_field() {
        let a = Record::new("app::User").with("name", "ada");
        let b = Record::new("app::User")
            .with("name", "ada")
            .with("email", Value::Nil);
        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn test_owning_type_participates_in_equality() {
        let a = Record::new("app::User").with("name", "ada");
        let b = Record::new("app::Admin").with("name", "ada");
        assert_ne!(a, b);
    }

    #[test]
    fn test_take_leaves_nil() {
        let mut record = Record::new("app::User").with("age", 36i64);
        assert_eq!(record.take("age"), Value::Int(36));
        assert!(record.take("age").is_nil());
    }
}
