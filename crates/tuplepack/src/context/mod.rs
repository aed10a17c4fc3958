// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Context converters: scoped schema index ↔ schema name mappings.
//!
//! A context is a small, explicitly declared table such as
//! `[(1, "User"), (2, "Address")]`. The index is what goes on the wire;
//! the context itself never does. Two contexts may therefore use the same
//! index for different schemas without conflict, as long as each payload
//! is decoded with the context it was encoded with.
//!
//! Construction validates the table eagerly. Whether the named schemas
//! exist is only checked on first use ([`ContextConverter::ensure_verified`]),
//! so contexts can be declared before the schemas they name are loaded.
//!
//! ```
//! use tuplepack::ContextConverter;
//!
//! let ctx = ContextConverter::build("accounts", [(1, "User"), (2, "Address")]).unwrap();
//! assert_eq!(ctx.index_for("Address").unwrap(), 2);
//! assert_eq!(ctx.name_for(1).unwrap(), "User");
//! assert!(ctx.name_for(3).is_err());
//! ```

use crate::config::MAX_SCHEMA_INDEX;
use crate::descriptor::is_valid_identifier;
use crate::registry::Registry;
use crate::schema::Schema;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Errors from building or querying a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Context or schema name is empty or contains unsupported characters.
    InvalidName { context: String, name: String },
    /// Index is not a positive integer in range.
    InvalidIndex { context: String, index: i64 },
    /// Two entries share an index.
    DuplicateIndex {
        context: String,
        index: u32,
        first: String,
        second: String,
    },
    /// The same schema appears twice.
    DuplicateName {
        context: String,
        name: String,
        first: u32,
        second: u32,
    },
    /// Schema has no index in this context (encode side).
    NotInContext { context: String, schema: String },
    /// Index not declared in this context (decode side).
    UnknownIndex { context: String, index: i64 },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName { context, name } => {
                write!(f, "context {}: invalid name {:?}", context, name)
            }
            Self::InvalidIndex { context, index } => write!(
                f,
                "context {}: invalid index {} (expected 1..={})",
                context, index, MAX_SCHEMA_INDEX
            ),
            Self::DuplicateIndex {
                context,
                index,
                first,
                second,
            } => write!(
                f,
                "context {}: index {} used by both {} and {}",
                context, index, first, second
            ),
            Self::DuplicateName {
                context,
                name,
                first,
                second,
            } => write!(
                f,
                "context {}: schema {} mapped at both {} and {}",
                context, name, first, second
            ),
            Self::NotInContext { context, schema } => {
                write!(f, "schema {} is not in context {}", schema, context)
            }
            Self::UnknownIndex { context, index } => {
                write!(f, "index {} is not declared in context {}", index, context)
            }
        }
    }
}

impl std::error::Error for ContextError {}

/// Immutable index ↔ schema name table for one context.
#[derive(Debug, Clone)]
pub struct ContextConverter {
    name: Arc<str>,
    /// Entries in declaration order.
    entries: Vec<(u32, Arc<str>)>,
    by_index: HashMap<u32, Arc<str>>,
    by_name: HashMap<Arc<str>, u32>,
    /// Schema names found missing on first use.
    verified: OnceLock<Vec<String>>,
}

impl ContextConverter {
    /// Build a converter from `(index, schema_name)` pairs.
    ///
    /// Fails on an invalid context or schema name, a non-positive or
    /// out-of-range index, a repeated index, or a repeated schema name.
    pub fn build<I, S>(context_name: &str, mapping: I) -> Result<Self, ContextError>
    where
        I: IntoIterator<Item = (i64, S)>,
        S: AsRef<str>,
    {
        if !is_valid_identifier(context_name) {
            return Err(ContextError::InvalidName {
                context: context_name.to_string(),
                name: context_name.to_string(),
            });
        }

        let mut ctx = Self {
            name: Arc::from(context_name),
            entries: Vec::new(),
            by_index: HashMap::new(),
            by_name: HashMap::new(),
            verified: OnceLock::new(),
        };

        for (index, schema) in mapping {
            ctx.push(index, schema.as_ref())?;
        }

        log::debug!(
            "[context] built {} with {} schemas",
            ctx.name,
            ctx.entries.len()
        );
        Ok(ctx)
    }

    fn push(&mut self, index: i64, schema: &str) -> Result<(), ContextError> {
        let context = || self.name.to_string();

        if !is_valid_identifier(schema) {
            return Err(ContextError::InvalidName {
                context: context(),
                name: schema.to_string(),
            });
        }
        let slot = match u32::try_from(index) {
            Ok(slot) if slot > 0 && i64::from(slot) <= MAX_SCHEMA_INDEX => slot,
            _ => {
                return Err(ContextError::InvalidIndex {
                    context: context(),
                    index,
                })
            }
        };
        if let Some(first) = self.by_index.get(&slot) {
            return Err(ContextError::DuplicateIndex {
                context: context(),
                index: slot,
                first: first.to_string(),
                second: schema.to_string(),
            });
        }
        if let Some(&first) = self.by_name.get(schema) {
            return Err(ContextError::DuplicateName {
                context: context(),
                name: schema.to_string(),
                first,
                second: slot,
            });
        }

        let schema: Arc<str> = Arc::from(schema);
        self.by_index.insert(slot, Arc::clone(&schema));
        self.by_name.insert(Arc::clone(&schema), slot);
        self.entries.push((slot, schema));
        Ok(())
    }

    /// Context name (diagnostics only, never serialized).
    pub fn context_name(&self) -> &str {
        &self.name
    }

    /// Wire index for a schema name.
    pub fn index_for(&self, schema: &str) -> Result<u32, ContextError> {
        self.by_name
            .get(schema)
            .copied()
            .ok_or_else(|| ContextError::NotInContext {
                context: self.name.to_string(),
                schema: schema.to_string(),
            })
    }

    /// Schema name for a wire index.
    pub fn name_for(&self, index: i64) -> Result<&str, ContextError> {
        u32::try_from(index)
            .ok()
            .and_then(|slot| self.by_index.get(&slot))
            .map(|name| &**name)
            .ok_or_else(|| ContextError::UnknownIndex {
                context: self.name.to_string(),
                index,
            })
    }

    /// `(index, schema_name)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.entries.iter().map(|(i, n)| (*i, &**n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schema names this context declares that `registry` does not know.
    pub fn verify(&self, registry: &Registry) -> Vec<String> {
        let snapshot = registry.snapshot();
        self.entries
            .iter()
            .filter(|(_, name)| !snapshot.contains(name))
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Run [`verify`](Self::verify) once and remember the result.
    ///
    /// Missing schemas are logged, not rejected: encoding a schema that
    /// does exist must keep working, and a missing one fails on its own
    /// lookup with a precise error.
    pub fn ensure_verified(&self, registry: &Registry) -> &[String] {
        self.verified.get_or_init(|| {
            let missing = self.verify(registry);
            if missing.is_empty() {
                log::debug!(
                    "[context] {}: all {} schemas registered",
                    self.name,
                    self.entries.len()
                );
            } else {
                log::warn!(
                    "[context] {}: schemas not registered at first use: {}",
                    self.name,
                    missing.join(", ")
                );
            }
            missing
        })
    }
}

/// Builder collecting context entries, typed or by name.
///
/// ```ignore
/// let ctx = ContextBuilder::new("accounts")
///     .schema::<User>(1)
///     .schema::<Address>(2)
///     .entry(3, "Country")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    name: String,
    mapping: Vec<(i64, String)>,
}

impl ContextBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping: Vec::new(),
        }
    }

    /// Map `index` to the schema of `T`.
    #[must_use]
    pub fn schema<T: Schema>(self, index: i64) -> Self {
        self.entry(index, T::schema_name())
    }

    /// Map `index` to a schema name.
    #[must_use]
    pub fn entry(mut self, index: i64, schema: impl Into<String>) -> Self {
        self.mapping.push((index, schema.into()));
        self
    }

    pub fn build(self) -> Result<ContextConverter, ContextError> {
        ContextConverter::build(&self.name, self.mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    #[test]
    fn test_lookups() {
        let ctx = ContextConverter::build("shop", [(1, "Order"), (7, "Line")]).unwrap();
        assert_eq!(ctx.context_name(), "shop");
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.index_for("Line"), Ok(7));
        assert_eq!(ctx.name_for(1), Ok("Order"));
        assert_eq!(
            ctx.index_for("Refund"),
            Err(ContextError::NotInContext {
                context: "shop".into(),
                schema: "Refund".into()
            })
        );
        assert!(matches!(ctx.name_for(2), Err(ContextError::UnknownIndex { index: 2, .. })));
        assert!(matches!(ctx.name_for(-1), Err(ContextError::UnknownIndex { index: -1, .. })));
        let entries: Vec<_> = ctx.entries().collect();
        assert_eq!(entries, vec![(1, "Order"), (7, "Line")]);
    }

    #[test]
    fn test_duplicate_index() {
        let err = ContextConverter::build("shop", [(1, "Order"), (1, "Line")]).unwrap_err();
        assert_eq!(
            err,
            ContextError::DuplicateIndex {
                context: "shop".into(),
                index: 1,
                first: "Order".into(),
                second: "Line".into()
            }
        );
    }

    #[test]
    fn test_duplicate_name() {
        let err = ContextConverter::build("shop", [(1, "Order"), (2, "Order")]).unwrap_err();
        assert!(matches!(err, ContextError::DuplicateName { first: 1, second: 2, .. }));
    }

    #[test]
    fn test_invalid_indices() {
        for bad in [0, -5, MAX_SCHEMA_INDEX + 1] {
            let err = ContextConverter::build("shop", [(bad, "Order")]).unwrap_err();
            assert!(matches!(err, ContextError::InvalidIndex { index, .. } if index == bad));
        }
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            ContextConverter::build("shop", [(1, "")]),
            Err(ContextError::InvalidName { .. })
        ));
        assert!(matches!(
            ContextConverter::build("shop", [(1, "has space")]),
            Err(ContextError::InvalidName { .. })
        ));
        assert!(matches!(
            ContextConverter::build("", [(1, "Order")]),
            Err(ContextError::InvalidName { .. })
        ));
        assert!(ContextConverter::build("billing.v2", [(1, "app::Order-v2")]).is_ok());
    }

    #[test]
    fn test_same_index_in_two_contexts() {
        let a = ContextConverter::build("a", [(1, "User")]).unwrap();
        let b = ContextConverter::build("b", [(1, "Invoice")]).unwrap();
        assert_eq!(a.name_for(1), Ok("User"));
        assert_eq!(b.name_for(1), Ok("Invoice"));
    }

    #[test]
    fn test_verification_is_lazy_and_cached() {
        let registry = Registry::new();
        let ctx = ContextConverter::build("shop", [(1, "Order"), (2, "Line")]).unwrap();

        registry
            .register(Descriptor::sequential("Order", &["id"]).unwrap(), "shop::Order")
            .unwrap();
        assert_eq!(ctx.verify(&registry), vec!["Line".to_string()]);
        assert_eq!(ctx.ensure_verified(&registry), ["Line".to_string()]);

        // Cached: later registrations do not change the first-use result.
        registry
            .register(Descriptor::sequential("Line", &["sku"]).unwrap(), "shop::Line")
            .unwrap();
        assert_eq!(ctx.ensure_verified(&registry).len(), 1);
        assert!(ctx.verify(&registry).is_empty());
    }

    #[test]
    fn test_builder_entries() {
        let ctx = ContextBuilder::new("shop")
            .entry(1, "Order")
            .entry(2, "Line")
            .build()
            .unwrap();
        assert_eq!(ctx.index_for("Line"), Ok(2));
    }
}
