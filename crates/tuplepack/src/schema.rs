// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed schemas.
//!
//! `Schema` ties a Rust type to its descriptor and to the [`Record`] form
//! the engine works on. It is normally derived:
//!
//! ```ignore
//! use tuplepack::Schema;
//!
//! #[derive(Schema)]
//! #[schema(name = "User")]
//! struct User {
//!     #[schema(index = 1)]
//!     name: String,
//!     #[schema(index = 2)]
//!     email: Option<String>,
//! }
//!
//! User::register(Registry::global())?;
//! ```

use crate::descriptor::{Descriptor, DescriptorError};
use crate::error::Result;
use crate::registry::{Registration, Registry};
use crate::value::{FromValue, Record, ToValue, ValueError};
use std::sync::Arc;

/// A Rust type with a schema descriptor.
pub trait Schema: ToValue + FromValue {
    /// Owning type identity stored on records (`module::path::Type`).
    fn owning_type() -> &'static str;

    /// Schema name used by context converters.
    fn schema_name() -> &'static str;

    /// Build the descriptor from the type declaration.
    fn descriptor() -> core::result::Result<Descriptor, DescriptorError>;

    /// Convert into a record (every declared field is set, absent ones to `Nil`).
    fn to_record(&self) -> Record;

    /// Rebuild from a record of this type's owning type.
    fn from_record(record: Record) -> core::result::Result<Self, ValueError>;

    /// Register this type's descriptor.
    fn register(registry: &Registry) -> Result<Arc<Registration>> {
        let descriptor = Self::descriptor()?;
        Ok(registry.register(descriptor, Self::owning_type())?)
    }
}

/// Check that `record` belongs to `S`, for use by `from_record` impls.
#[doc(hidden)]
pub fn expect_owning_type<S: Schema>(record: &Record) -> core::result::Result<(), ValueError> {
    if record.owning_type().as_str() == S::owning_type() {
        Ok(())
    } else {
        Err(ValueError::WrongRecordType {
            path: String::new(),
            expected: S::owning_type().to_string(),
            found: record.owning_type().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::Schema;

    #[derive(Debug, PartialEq, Schema)]
    #[schema(name = "Point")]
    struct Point {
        x: i64,
        y: i64,
        label: Option<String>,
    }

    #[test]
    fn test_derived_descriptor() {
        let d = Point::descriptor().unwrap();
        assert_eq!(d.name(), "Point");
        assert_eq!(d.field_index("label"), Some(3));
        assert_eq!(Point::owning_type(), concat!(module_path!(), "::Point"));
        assert_eq!(Point::schema_name(), "Point");
    }

    #[test]
    fn test_record_conversion() {
        let p = Point {
            x: 1,
            y: -2,
            label: None,
        };
        let record = p.to_record();
        assert_eq!(record.get("y"), &Value::Int(-2));
        assert!(record.get("label").is_nil());
        assert_eq!(Point::from_record(record).unwrap(), p);
    }

    #[test]
    fn test_from_record_checks_type_and_fields() {
        let foreign = Record::new("other::Point").with("x", 1i64).with("y", 2i64);
        assert!(matches!(
            Point::from_record(foreign),
            Err(ValueError::WrongRecordType { .. })
        ));

        let partial = Record::new(Point::owning_type()).with("x", 1i64);
        let err = Point::from_record(partial).unwrap_err();
        assert_eq!(err, ValueError::MissingField { path: "y".into() });
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = Registry::new();
        let a = Point::register(&registry).unwrap();
        let b = Point::register(&registry).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.lookup_by_type(Point::owning_type()).is_some());
    }
}
