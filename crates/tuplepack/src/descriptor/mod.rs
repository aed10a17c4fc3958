// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema descriptors: record name plus the field ↔ index mapping.
//!
//! A descriptor fixes which tuple slot each field occupies on the wire.
//! Indices are positive and unique; with [`IndexPolicy::Sequential`] they
//! are the 1-based declaration positions, so fields may only be appended.
//! [`IndexPolicy::Explicit`] lets each field pin its own index, which also
//! allows removing or reordering fields without moving the others.
//!
//! ```
//! use tuplepack::{Descriptor, IndexPolicy, FieldDecl};
//!
//! let user = Descriptor::sequential("User", &["name", "email"]).unwrap();
//! assert_eq!(user.field_index("email"), Some(2));
//!
//! let event = Descriptor::define(
//!     "Event",
//!     [FieldDecl::at("id", 1), FieldDecl::at("payload", 5)],
//!     IndexPolicy::Explicit,
//! )
//! .unwrap();
//! assert_eq!(event.max_index(), 5);
//! assert_eq!(event.index_field(5), Some("payload"));
//! ```

mod builder;
pub mod evolution;

pub use builder::DescriptorBuilder;

use crate::config::MAX_FIELD_INDEX;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How field indices are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IndexPolicy {
    /// Index = 1-based declaration position.
    Sequential,
    /// Every field carries its own index.
    Explicit,
}

/// One field in a descriptor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDecl {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub index: Option<i64>,
}

impl FieldDecl {
    /// Field with a position-assigned index.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// Field with an explicit index.
    pub fn at(name: impl Into<String>, index: i64) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

/// Errors raised while defining a descriptor.
///
/// These are declaration-time failures: a process should refuse to load
/// a schema that produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Schema name is empty or contains unsupported characters.
    InvalidName(String),
    /// Field name is empty or contains unsupported characters.
    InvalidFieldName { schema: String, field: String },
    /// Two fields share a name.
    DuplicateFieldName { schema: String, field: String },
    /// Two fields share an index.
    DuplicateFieldIndex {
        schema: String,
        index: u32,
        first: String,
        second: String,
    },
    /// Index missing, not positive, out of range, or given under the
    /// sequential policy.
    InvalidIndex {
        schema: String,
        field: String,
        index: Option<i64>,
    },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid schema name {:?}", name),
            Self::InvalidFieldName { schema, field } => {
                write!(f, "schema {}: invalid field name {:?}", schema, field)
            }
            Self::DuplicateFieldName { schema, field } => {
                write!(f, "schema {}: duplicate field name '{}'", schema, field)
            }
            Self::DuplicateFieldIndex {
                schema,
                index,
                first,
                second,
            } => write!(
                f,
                "schema {}: fields '{}' and '{}' share index {}",
                schema, first, second, index
            ),
            Self::InvalidIndex {
                schema,
                field,
                index: Some(index),
            } => write!(
                f,
                "schema {}: field '{}' has invalid index {} (expected 1..={})",
                schema, field, index, MAX_FIELD_INDEX
            ),
            Self::InvalidIndex {
                schema,
                field,
                index: None,
            } => write!(f, "schema {}: field '{}' has no index", schema, field),
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Check an identifier used for schema, field and context names:
/// non-empty ASCII alphanumerics plus `_ . : -`.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
}

/// Immutable schema descriptor.
///
/// Cheap to clone; shared through the [`Registry`](crate::Registry) as
/// `Arc<Registration>`.
#[derive(Debug, Clone)]
pub struct Descriptor {
    name: Arc<str>,
    /// Field names in declaration order.
    fields: Vec<Arc<str>>,
    /// `indices[i]` is the wire index of `fields[i]`.
    indices: Vec<u32>,
    field_indices: HashMap<Arc<str>, u32>,
    /// Wire index -> position in `fields`.
    index_fields: HashMap<u32, usize>,
    max_index: u32,
    policy: IndexPolicy,
}

impl Descriptor {
    /// Define a descriptor, validating names and indices.
    pub fn define<I>(name: &str, fields: I, policy: IndexPolicy) -> Result<Self, DescriptorError>
    where
        I: IntoIterator<Item = FieldDecl>,
    {
        if !is_valid_identifier(name) {
            return Err(DescriptorError::InvalidName(name.to_string()));
        }

        let fields = fields.into_iter();
        let mut descriptor = Self {
            name: Arc::from(name),
            fields: Vec::with_capacity(fields.size_hint().0),
            indices: Vec::with_capacity(fields.size_hint().0),
            field_indices: HashMap::new(),
            index_fields: HashMap::new(),
            max_index: 0,
            policy,
        };

        for (pos, decl) in fields.enumerate() {
            let index = descriptor.resolve_index(pos, &decl)?;
            descriptor.push_field(&decl.name, index)?;
        }

        log::trace!(
            "[descriptor] defined {} ({} fields, max index {})",
            descriptor.name,
            descriptor.fields.len(),
            descriptor.max_index
        );
        Ok(descriptor)
    }

    /// Sequential descriptor from a plain field list.
    pub fn sequential(name: &str, fields: &[&str]) -> Result<Self, DescriptorError> {
        Self::define(
            name,
            fields.iter().map(|f| FieldDecl::named(*f)),
            IndexPolicy::Sequential,
        )
    }

    /// Explicit descriptor from `(field, index)` pairs.
    pub fn explicit(name: &str, fields: &[(&str, i64)]) -> Result<Self, DescriptorError> {
        Self::define(
            name,
            fields.iter().map(|(f, i)| FieldDecl::at(*f, *i)),
            IndexPolicy::Explicit,
        )
    }

    fn resolve_index(&self, pos: usize, decl: &FieldDecl) -> Result<u32, DescriptorError> {
        let invalid = |index| DescriptorError::InvalidIndex {
            schema: self.name.to_string(),
            field: decl.name.clone(),
            index,
        };
        match (self.policy, decl.index) {
            (IndexPolicy::Sequential, None) => {
                u32::try_from(pos + 1).map_err(|_| invalid(None))
            }
            (IndexPolicy::Sequential, Some(index)) => Err(invalid(Some(index))),
            (IndexPolicy::Explicit, None) => Err(invalid(None)),
            (IndexPolicy::Explicit, Some(index)) => {
                if (1..=MAX_FIELD_INDEX).contains(&index) {
                    u32::try_from(index).map_err(|_| invalid(Some(index)))
                } else {
                    Err(invalid(Some(index)))
                }
            }
        }
    }

    fn push_field(&mut self, field: &str, index: u32) -> Result<(), DescriptorError> {
        if !is_valid_identifier(field) {
            return Err(DescriptorError::InvalidFieldName {
                schema: self.name.to_string(),
                field: field.to_string(),
            });
        }
        if self.field_indices.contains_key(field) {
            return Err(DescriptorError::DuplicateFieldName {
                schema: self.name.to_string(),
                field: field.to_string(),
            });
        }
        if let Some(&pos) = self.index_fields.get(&index) {
            return Err(DescriptorError::DuplicateFieldIndex {
                schema: self.name.to_string(),
                index,
                first: self.fields[pos].to_string(),
                second: field.to_string(),
            });
        }

        let field: Arc<str> = Arc::from(field);
        self.index_fields.insert(index, self.fields.len());
        self.field_indices.insert(Arc::clone(&field), index);
        self.fields.push(field);
        self.indices.push(index);
        self.max_index = self.max_index.max(index);
        Ok(())
    }

    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| &**f)
    }

    /// `(field, index)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.fields
            .iter()
            .zip(&self.indices)
            .map(|(f, i)| (&**f, *i))
    }

    /// Wire index of a field, `None` if the descriptor does not define it.
    pub fn field_index(&self, field: &str) -> Option<u32> {
        self.field_indices.get(field).copied()
    }

    /// Field occupying a wire index, `None` if no field uses it.
    pub fn index_field(&self, index: u32) -> Option<&str> {
        self.index_fields.get(&index).map(|&pos| &*self.fields[pos])
    }

    /// Highest field index (0 for a descriptor without fields).
    pub fn max_index(&self) -> u32 {
        self.max_index
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the descriptor has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Index assignment policy this descriptor was declared with.
    pub fn policy(&self) -> IndexPolicy {
        self.policy
    }

    /// Declarations that rebuild this descriptor with [`define`](Self::define).
    pub fn field_decls(&self) -> Vec<FieldDecl> {
        self.entries()
            .map(|(name, index)| match self.policy {
                IndexPolicy::Sequential => FieldDecl::named(name),
                IndexPolicy::Explicit => FieldDecl::at(name, i64::from(index)),
            })
            .collect()
    }
}

/// Descriptors are equal when they put the same fields at the same
/// indices. Neither declaration order nor policy is part of the wire
/// layout.
impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.field_indices == other.field_indices
    }
}

impl Eq for Descriptor {}
