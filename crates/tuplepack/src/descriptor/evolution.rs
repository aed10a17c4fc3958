// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compare two versions of a descriptor.
//!
//! Data written under one version is read by matching tuple slots to
//! field indices, so what matters is whether an index keeps its meaning:
//!
//! - adding a field at a fresh index is safe (old data reads it as absent)
//! - renaming a field in place is safe (the slot is the same)
//! - removing a field is safe as long as its index is never reused
//! - moving a field to another index silently reinterprets old data
//!
//! A new name at a removed field's index looks the same whether it is a
//! rename or an unrelated field reusing the slot. It is reported as
//! [`FieldChange::IndexReused`] (breaking) unless the caller declares the
//! rename through [`check_evolution_with_renames`].

use super::Descriptor;
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Overall verdict of an evolution check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    /// Same name, same fields at the same indices.
    Identical,
    /// Old and new data decode correctly under either version.
    Compatible,
    /// Some index changes meaning between the versions.
    Breaking,
}

/// A single field-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    /// Field name the old version did not have.
    Added { field: String, index: u32 },
    /// Field and its index no longer present.
    Removed { field: String, index: u32 },
    /// Same index, different field name, declared as a rename.
    Renamed { index: u32, from: String, to: String },
    /// Removed field's index taken by a field not declared as its rename.
    IndexReused { index: u32, from: String, to: String },
    /// Same field name, different index.
    Reindexed { field: String, from: u32, to: u32 },
}

impl FieldChange {
    /// Whether this change alone keeps old and new data interchangeable.
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Self::Reindexed { .. } | Self::IndexReused { .. })
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { field, index } => write!(f, "added field '{}' at {}", field, index),
            Self::Removed { field, index } => {
                write!(f, "removed field '{}' (index {})", field, index)
            }
            Self::Renamed { index, from, to } => {
                write!(f, "renamed index {}: '{}' -> '{}'", index, from, to)
            }
            Self::IndexReused { index, from, to } => {
                write!(f, "index {} reused: '{}' replaced by '{}'", index, from, to)
            }
            Self::Reindexed { field, from, to } => {
                write!(f, "moved field '{}': index {} -> {}", field, from, to)
            }
        }
    }
}

/// Result of [`check_evolution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionReport {
    pub compatibility: Compatibility,
    pub changes: Vec<FieldChange>,
    /// Set when the two descriptors carry different schema names.
    pub renamed_schema: Option<(String, String)>,
}

impl EvolutionReport {
    pub fn is_compatible(&self) -> bool {
        self.compatibility != Compatibility::Breaking
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Classify the changes from `old` to `new`, with no declared field renames.
///
/// A schema rename is reported but does not affect compatibility: the
/// name only matters to context converters, which map indices to names.
pub fn check_evolution(old: &Descriptor, new: &Descriptor) -> EvolutionReport {
    check_evolution_with_renames(old, new, &[])
}

/// Like [`check_evolution`], treating each `(from, to)` pair in `renames`
/// as an intended in-place field rename.
///
/// ```
/// use tuplepack::descriptor::evolution::{check_evolution_with_renames, Compatibility};
/// use tuplepack::Descriptor;
///
/// let v1 = Descriptor::explicit("User", &[("mail", 1)]).unwrap();
/// let v2 = Descriptor::explicit("User", &[("email", 1)]).unwrap();
/// let report = check_evolution_with_renames(&v1, &v2, &[("mail", "email")]);
/// assert_eq!(report.compatibility, Compatibility::Compatible);
/// ```
pub fn check_evolution_with_renames(
    old: &Descriptor,
    new: &Descriptor,
    renames: &[(&str, &str)],
) -> EvolutionReport {
    let renamed_schema = (old.name() != new.name())
        .then(|| (old.name().to_string(), new.name().to_string()));

    let old_by_index: HashMap<u32, &str> = old.entries().map(|(f, i)| (i, f)).collect();
    let new_by_index: HashMap<u32, &str> = new.entries().map(|(f, i)| (i, f)).collect();

    let mut changes = Vec::new();

    // Fields that kept their name but moved.
    for (field, old_index) in old.entries() {
        if let Some(new_index) = new.field_index(field) {
            if new_index != old_index {
                changes.push(FieldChange::Reindexed {
                    field: field.to_string(),
                    from: old_index,
                    to: new_index,
                });
            }
        }
    }

    // Slots whose occupant changed name. A field that moved here is
    // already reported as reindexed.
    for (field, index) in new.entries() {
        if old.field_index(field).is_some() {
            continue;
        }
        match old_by_index.get(&index) {
            Some(&previous) if new.field_index(previous).is_none() => {
                let (from, to) = (previous.to_string(), field.to_string());
                if renames.contains(&(previous, field)) {
                    changes.push(FieldChange::Renamed { index, from, to });
                } else {
                    changes.push(FieldChange::IndexReused { index, from, to });
                }
            }
            _ => changes.push(FieldChange::Added {
                field: field.to_string(),
                index,
            }),
        }
    }

    for (field, index) in old.entries() {
        if new.field_index(field).is_some() {
            continue;
        }
        let renamed = new_by_index
            .get(&index)
            .is_some_and(|occupant| old.field_index(occupant).is_none());
        if !renamed {
            changes.push(FieldChange::Removed {
                field: field.to_string(),
                index,
            });
        }
    }

    let compatibility = if changes.is_empty() {
        Compatibility::Identical
    } else if changes.iter().any(|c| !c.is_compatible()) {
        Compatibility::Breaking
    } else {
        Compatibility::Compatible
    };

    if compatibility == Compatibility::Breaking {
        log::debug!(
            "[evolution] {} -> {}: breaking ({} changes)",
            old.name(),
            new.name(),
            changes.len()
        );
    }

    EvolutionReport {
        compatibility,
        changes,
        renamed_schema,
    }
}
