// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tuplepack - compact schema-indexed serialization
//!
//! Records are written as positional tuples instead of name/value maps:
//! field names never reach the wire, only the field index declared by the
//! schema descriptor and a small integer that identifies the schema within
//! a *context*.
//!
//! ## Quick Start
//!
//! ```rust
//! use tuplepack::{Codec, ContextBuilder, Registry, Result, Schema};
//!
//! #[derive(Schema, Debug, PartialEq)]
//! struct User {
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! fn main() -> Result<()> {
//!     let registry = Registry::new();
//!     User::register(&registry)?;
//!     let ctx = ContextBuilder::new("accounts").schema::<User>(1).build()?;
//!
//!     let codec = Codec::new(&registry);
//!     let user = User { name: "ada".into(), email: None };
//!     let bytes = codec.encode_typed(&user, &ctx)?;
//!     assert_eq!(codec.decode_as::<User>(&bytes, &ctx)?, user);
//!     Ok(())
//! }
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Descriptor`] | Schema name and field name ↔ index mapping |
//! | [`Registry`] | Descriptors by schema name and owning type |
//! | [`ContextConverter`] | Schema name ↔ schema index within one context |
//! | [`Codec`] | Record ↔ bytes through a registry and a context |
//! | [`Record`] | Dynamic record value, tagged with its owning type |
//!
//! ## Modules Overview
//!
//! - [`value`] - generic values and records
//! - [`descriptor`] - schema descriptors and evolution checks
//! - [`registry`] - schema registry
//! - [`context`] - context converters
//! - [`engine`] - encode/decode pipeline
//! - [`codec`] - generic value codec (tagged binary)
//! - [`compress`] - optional payload compression

// Lets `#[derive(Schema)]` expand to `::tuplepack::...` inside this crate.
extern crate self as tuplepack;

pub mod codec;
pub mod compress;
pub mod config;
pub mod context;
#[cfg(feature = "serde")]
pub mod declarations;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod registry;
pub mod schema;
pub mod value;

pub use codec::{CodecError, TaggedCodec, ValueCodec};
pub use compress::{CompressConfig, CompressionAlgo, Compressor};
pub use config::CodecConfig;
pub use context::{ContextBuilder, ContextConverter, ContextError};
#[cfg(feature = "serde")]
pub use declarations::Declarations;
pub use descriptor::evolution::{
    check_evolution, check_evolution_with_renames, Compatibility, EvolutionReport,
};
pub use descriptor::{Descriptor, DescriptorBuilder, DescriptorError, FieldDecl, IndexPolicy};
pub use engine::{decode, encode, Codec};
pub use error::{Error, Result};
pub use registry::{Registration, Registry, RegistryError, RegistrySnapshot};
pub use schema::Schema;
pub use value::{FromValue, OwningType, Record, ToValue, Value, ValueError};

/// Derive macro for [`Schema`](trait@Schema).
pub use tuplepack_derive::Schema;
