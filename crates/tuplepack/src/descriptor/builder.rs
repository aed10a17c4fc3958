// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder for descriptors declared at runtime.

use super::{Descriptor, DescriptorError, FieldDecl, IndexPolicy};

/// Builder for [`Descriptor`].
///
/// The policy is inferred: if any field is added with
/// [`field_at`](Self::field_at) the descriptor is explicit and every field
/// needs an index.
///
/// ```
/// use tuplepack::DescriptorBuilder;
///
/// let d = DescriptorBuilder::new("Order")
///     .field_at("id", 1)
///     .field_at("total", 3)
///     .build()
///     .unwrap();
/// assert_eq!(d.max_index(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    name: String,
    fields: Vec<FieldDecl>,
}

impl DescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field whose index is its position.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDecl::named(name));
        self
    }

    /// Add a field with an explicit index.
    #[must_use]
    pub fn field_at(mut self, name: impl Into<String>, index: i64) -> Self {
        self.fields.push(FieldDecl::at(name, index));
        self
    }

    pub fn build(self) -> Result<Descriptor, DescriptorError> {
        let policy = if self.fields.iter().any(|f| f.index.is_some()) {
            IndexPolicy::Explicit
        } else {
            IndexPolicy::Sequential
        };
        Descriptor::define(&self.name, self.fields, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_infers_sequential() {
        let d = DescriptorBuilder::new("User")
            .field("name")
            .field("email")
            .build()
            .unwrap();
        assert_eq!(d.policy(), IndexPolicy::Sequential);
        assert_eq!(d.field_index("email"), Some(2));
    }

    #[test]
    fn test_builder_mixed_fields_rejected() {
        let err = DescriptorBuilder::new("User")
            .field_at("name", 1)
            .field("email")
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidIndex { index: None, .. }));
    }
}
