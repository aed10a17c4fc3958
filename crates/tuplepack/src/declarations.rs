// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Export and import of schema and context declarations (JSON).
//!
//! A declaration file is a copy of what the code declares, never a
//! source of truth on its own: [`Declarations::apply`] re-runs the same
//! validation and registration as declaring the schemas in code, so a
//! file that disagrees with the loaded schemas fails with a conflict.
//!
//! ```json
//! {
//!   "descriptors": [
//!     { "name": "User", "owning_type": "app::User", "policy": "sequential",
//!       "fields": [ { "name": "name" }, { "name": "email" } ] }
//!   ],
//!   "contexts": [
//!     { "name": "accounts", "entries": [ { "index": 1, "schema": "User" } ] }
//!   ]
//! }
//! ```

use crate::context::{ContextConverter, ContextError};
use crate::descriptor::{Descriptor, DescriptorError, FieldDecl, IndexPolicy};
use crate::error::Result;
use crate::registry::{Registration, Registry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ---------------------------------------------------------------------------
// DescriptorDecl
// ---------------------------------------------------------------------------

/// Static declaration of one descriptor and the type it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorDecl {
    pub name: String,
    pub owning_type: String,
    pub policy: IndexPolicy,
    pub fields: Vec<FieldDecl>,
}

impl DescriptorDecl {
    pub fn from_registration(registration: &Registration) -> Self {
        Self {
            name: registration.name().to_string(),
            owning_type: registration.owning_type.to_string(),
            policy: registration.descriptor.policy(),
            fields: registration.descriptor.field_decls(),
        }
    }

    /// Validate and build the descriptor.
    pub fn to_descriptor(&self) -> core::result::Result<Descriptor, DescriptorError> {
        Descriptor::define(&self.name, self.fields.iter().cloned(), self.policy)
    }
}

// ---------------------------------------------------------------------------
// ContextDecl
// ---------------------------------------------------------------------------

/// One `(index, schema)` pair of a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub index: i64,
    pub schema: String,
}

/// Static declaration of a context converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDecl {
    pub name: String,
    pub entries: Vec<ContextEntry>,
}

impl ContextDecl {
    pub fn from_converter(ctx: &ContextConverter) -> Self {
        Self {
            name: ctx.context_name().to_string(),
            entries: ctx
                .entries()
                .map(|(index, schema)| ContextEntry {
                    index: i64::from(index),
                    schema: schema.to_string(),
                })
                .collect(),
        }
    }

    /// Validate and build the converter.
    pub fn build(&self) -> core::result::Result<ContextConverter, ContextError> {
        ContextConverter::build(
            &self.name,
            self.entries.iter().map(|e| (e.index, e.schema.as_str())),
        )
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A bundle of descriptor and context declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    #[serde(default)]
    pub descriptors: Vec<DescriptorDecl>,
    #[serde(default)]
    pub contexts: Vec<ContextDecl>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every descriptor in `registry`, in schema name order.
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            descriptors: registry
                .snapshot()
                .registrations()
                .iter()
                .map(|r| DescriptorDecl::from_registration(r))
                .collect(),
            contexts: Vec::new(),
        }
    }

    /// Add a context declaration.
    #[must_use]
    pub fn with_context(mut self, ctx: &ContextConverter) -> Self {
        self.contexts.push(ContextDecl::from_converter(ctx));
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Register every descriptor and build every context.
    ///
    /// Registration is idempotent, so applying declarations that match
    /// what the code already registered is a no-op. Stops at the first
    /// error; descriptors registered before it stay registered.
    pub fn apply(&self, registry: &Registry) -> Result<Vec<ContextConverter>> {
        for decl in &self.descriptors {
            let descriptor = decl.to_descriptor()?;
            registry.register(descriptor, decl.owning_type.as_str())?;
        }
        let contexts = self
            .contexts
            .iter()
            .map(ContextDecl::build)
            .collect::<core::result::Result<Vec<_>, _>>()?;

        log::debug!(
            "[declarations] applied {} descriptors, {} contexts",
            self.descriptors.len(),
            contexts.len()
        );
        Ok(contexts)
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::debug!("[declarations] saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Read a file written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }
}
