// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide schema registry.
//!
//! Maps schema names and owning types to descriptors. The table is
//! populated while schemas are declared (typically at start-up) and read
//! by every encode and decode afterwards.
//!
//! # Concurrency
//!
//! - **Lock-free reads**: the table is an immutable snapshot behind
//!   `ArcSwap`; lookups never block
//! - **Serialized writes**: registration takes a mutex, copies the table,
//!   inserts and publishes the new snapshot
//! - **Idempotent**: re-registering an identical descriptor under the
//!   same owning type returns the existing entry, so redundant concurrent
//!   registration is not a race
//!
//! Nothing here is persisted. After a restart the registry is rebuilt by
//! declaring the same schemas again.

use crate::descriptor::Descriptor;
use crate::value::OwningType;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// A descriptor bound to the type whose instances it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub descriptor: Descriptor,
    pub owning_type: OwningType,
}

impl Registration {
    /// Schema name of the bound descriptor.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors produced by [`Registry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Name already bound to different content (field layout or owning type).
    SchemaConflict {
        name: String,
        existing_type: String,
        new_type: String,
    },
    /// Owning type already bound to a different schema name.
    OwningTypeConflict {
        owning_type: String,
        existing: String,
        new: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaConflict {
                name,
                existing_type,
                new_type,
            } => {
                if existing_type == new_type {
                    write!(f, "schema {} already registered with a different layout", name)
                } else {
                    write!(
                        f,
                        "schema {} already registered for {} (attempted {})",
                        name, existing_type, new_type
                    )
                }
            }
            Self::OwningTypeConflict {
                owning_type,
                existing,
                new,
            } => write!(
                f,
                "type {} already bound to schema {} (attempted {})",
                owning_type, existing, new
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct Table {
    by_name: HashMap<Arc<str>, Arc<Registration>>,
    by_type: HashMap<OwningType, Arc<Registration>>,
}

/// Immutable view of the registry at one point in time.
///
/// An encode or decode works against a single snapshot, so registrations
/// landing mid-call are not observed half-way.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    table: Arc<Table>,
}

impl RegistrySnapshot {
    pub fn lookup_by_name(&self, name: &str) -> Option<&Arc<Registration>> {
        self.table.by_name.get(name)
    }

    pub fn lookup_by_type(&self, owning_type: &str) -> Option<&Arc<Registration>> {
        self.table.by_type.get(owning_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.by_name.is_empty()
    }

    /// All registrations in schema name order.
    pub fn registrations(&self) -> Vec<Arc<Registration>> {
        let mut all: Vec<_> = self.table.by_name.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Schema registry: name → descriptor and owning type → descriptor.
#[derive(Debug)]
pub struct Registry {
    table: ArcSwap<Table>,
    write_lock: Mutex<()>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty, independent registry.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(Table::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Process-wide registry, created on first access.
    pub fn global() -> &'static Registry {
        GLOBAL_REGISTRY.get_or_init(Registry::new)
    }

    /// Bind `descriptor` to `owning_type`.
    ///
    /// Returns the stored entry. Registering the same layout for the same
    /// type again is a no-op returning the existing entry.
    pub fn register(
        &self,
        descriptor: Descriptor,
        owning_type: impl Into<OwningType>,
    ) -> Result<Arc<Registration>, RegistryError> {
        let owning_type = owning_type.into();

        // Fast path: already registered, no lock needed.
        if let Some(existing) = self.check(&descriptor, &owning_type)? {
            return Ok(existing);
        }

        let _guard = self.write_lock.lock();

        // Re-check under the lock: another writer may have won the race.
        if let Some(existing) = self.check(&descriptor, &owning_type)? {
            return Ok(existing);
        }

        let entry = Arc::new(Registration {
            descriptor,
            owning_type,
        });

        let mut next = Table::clone(&self.table.load());
        next.by_name
            .insert(Arc::from(entry.name()), Arc::clone(&entry));
        next.by_type
            .insert(entry.owning_type.clone(), Arc::clone(&entry));
        self.table.store(Arc::new(next));

        log::debug!(
            "[registry] registered schema {} for {} ({} fields)",
            entry.name(),
            entry.owning_type,
            entry.descriptor.len()
        );
        Ok(entry)
    }

    /// `Ok(Some)` when an identical registration exists, `Ok(None)` when the
    /// name and type are both free, `Err` on conflict.
    fn check(
        &self,
        descriptor: &Descriptor,
        owning_type: &OwningType,
    ) -> Result<Option<Arc<Registration>>, RegistryError> {
        let table = self.table.load();

        if let Some(existing) = table.by_name.get(descriptor.name()) {
            if existing.descriptor == *descriptor && existing.owning_type == *owning_type {
                return Ok(Some(Arc::clone(existing)));
            }
            return Err(RegistryError::SchemaConflict {
                name: descriptor.name().to_string(),
                existing_type: existing.owning_type.to_string(),
                new_type: owning_type.to_string(),
            });
        }

        if let Some(existing) = table.by_type.get(owning_type) {
            return Err(RegistryError::OwningTypeConflict {
                owning_type: owning_type.to_string(),
                existing: existing.name().to_string(),
                new: descriptor.name().to_string(),
            });
        }

        Ok(None)
    }

    /// Look up by schema name.
    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<Registration>> {
        self.table.load().by_name.get(name).cloned()
    }

    /// Look up by owning type.
    pub fn lookup_by_type(&self, owning_type: &str) -> Option<Arc<Registration>> {
        self.table.load().by_type.get(owning_type).cloned()
    }

    /// Whether a schema name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.table.load().by_name.contains_key(name)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.table.load().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered schema names, sorted.
    pub fn schema_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .table
            .load()
            .by_name
            .keys()
            .map(|k| k.to_string())
            .collect();
        names.sort();
        names
    }

    /// Consistent view for a sequence of lookups.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            table: self.table.load_full(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_v1() -> Descriptor {
        Descriptor::sequential("User", &["name", "email"]).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        registry.register(user_v1(), "app::User").unwrap();

        assert!(registry.contains("User"));
        assert_eq!(registry.len(), 1);
        let by_type = registry.lookup_by_type("app::User").unwrap();
        assert_eq!(by_type.name(), "User");
        let by_name = registry.lookup_by_name("User").unwrap();
        assert!(Arc::ptr_eq(&by_type, &by_name));
        assert!(registry.lookup_by_name("Order").is_none());
    }

    #[test]
    fn test_identical_registration_is_noop() {
        let registry = Registry::new();
        let first = registry.register(user_v1(), "app::User").unwrap();
        let second = registry.register(user_v1(), "app::User").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reordered_declaration_is_noop() {
        let registry = Registry::new();
        let first = registry
            .register(
                Descriptor::explicit("Event", &[("a", 1), ("b", 2)]).unwrap(),
                "app::Event",
            )
            .unwrap();
        let second = registry
            .register(
                Descriptor::explicit("Event", &[("b", 2), ("a", 1)]).unwrap(),
                "app::Event",
            )
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_layout() {
        let registry = Registry::new();
        registry.register(user_v1(), "app::User").unwrap();

        let v2 = Descriptor::sequential("User", &["name", "email", "age"]).unwrap();
        let err = registry.register(v2, "app::User").unwrap_err();
        assert!(matches!(err, RegistryError::SchemaConflict { .. }));
        assert_eq!(
            err.to_string(),
            "schema User already registered with a different layout"
        );
        // Original entry untouched
        assert_eq!(registry.lookup_by_name("User").unwrap().descriptor, user_v1());
    }

    #[test]
    fn test_same_name_other_type_conflicts() {
        let registry = Registry::new();
        registry.register(user_v1(), "app::User").unwrap();
        let err = registry.register(user_v1(), "legacy::User").unwrap_err();
        assert!(matches!(err, RegistryError::SchemaConflict { .. }));
    }

    #[test]
    fn test_owning_type_conflict() {
        let registry = Registry::new();
        registry.register(user_v1(), "app::User").unwrap();
        let other = Descriptor::sequential("Customer", &["name"]).unwrap();
        let err = registry.register(other, "app::User").unwrap_err();
        assert_eq!(
            err,
            RegistryError::OwningTypeConflict {
                owning_type: "app::User".into(),
                existing: "User".into(),
                new: "Customer".into()
            }
        );
    }

    #[test]
    fn test_snapshot_is_stable() {
        let registry = Registry::new();
        registry.register(user_v1(), "app::User").unwrap();
        let snapshot = registry.snapshot();

        let order = Descriptor::sequential("Order", &["id"]).unwrap();
        registry.register(order, "app::Order").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains("Order"));
        assert_eq!(registry.schema_names(), vec!["Order", "User"]);
        let names: Vec<_> = registry
            .snapshot()
            .registrations()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["Order", "User"]);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(Registry::global(), Registry::global()));
    }
}
