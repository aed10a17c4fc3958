// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encode/decode engine.
//!
//! # Pipeline
//!
//! ```text
//! encode: Record ─► registry (by owning type) ─► context (name → index)
//!                ─► (index, slot tuple) ─► value codec ─► compressor ─► bytes
//!
//! decode: bytes ─► decompress ─► value codec ─► (index, slot tuple)
//!               ─► context (index → name) ─► registry (by name) ─► Record
//! ```
//!
//! Slot `i` of the tuple holds the field with index `i + 1`; fields
//! without a value hold `Nil`. A nested record whose type is registered
//! is replaced by the marker `(NEST_TAG, index, slots)`, resolved through
//! the same context as its parent.
//!
//! Every call works on one registry snapshot and has no other shared
//! state, so a `Codec` can be used from many threads at once.

mod decode;
mod encode;

use crate::codec::{TaggedCodec, ValueCodec};
use crate::compress::Compressor;
use crate::config::CodecConfig;
use crate::context::ContextConverter;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::schema::Schema;
use crate::value::{Record, Value};
use decode::Unpacker;
use encode::Packer;
use std::sync::OnceLock;

static GLOBAL_CODEC: OnceLock<Codec<'static>> = OnceLock::new();

/// Schema-indexed encoder/decoder bound to a registry.
pub struct Codec<'r> {
    registry: &'r Registry,
    value_codec: Box<dyn ValueCodec>,
    compressor: Compressor,
    config: CodecConfig,
}

impl std::fmt::Debug for Codec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("value_codec", &self.value_codec.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'r> Codec<'r> {
    /// Codec with default configuration.
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_config(registry, CodecConfig::default())
    }

    /// Codec with explicit configuration.
    pub fn with_config(registry: &'r Registry, config: CodecConfig) -> Self {
        Self {
            registry,
            value_codec: Box::new(TaggedCodec::with_max_depth(config.max_depth)),
            compressor: Compressor::new(config.compress.clone()),
            config,
        }
    }

    /// Replace the generic value codec.
    #[must_use]
    pub fn with_value_codec(mut self, value_codec: Box<dyn ValueCodec>) -> Self {
        self.value_codec = value_codec;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Compressor, for statistics.
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Encode a record using `ctx` for schema indices.
    ///
    /// Populating more fields never shrinks the value-codec output. The
    /// compressed frame carries no such guarantee: a larger payload can
    /// cross the compression threshold and come out smaller.
    pub fn encode(&self, record: &Record, ctx: &ContextConverter) -> Result<Vec<u8>> {
        let wire = self.pack(record, ctx)?;
        let raw = self.value_codec.encode(&wire);
        let bytes = self.compressor.compress(&raw)?;
        log::trace!(
            "[engine] encoded {} via {}: {} value bytes, {} on the wire",
            record.owning_type(),
            ctx.context_name(),
            raw.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Encode a typed value.
    pub fn encode_typed<T: Schema>(&self, value: &T, ctx: &ContextConverter) -> Result<Vec<u8>> {
        self.encode(&value.to_record(), ctx)
    }

    /// Decode bytes produced by [`encode`](Self::encode) with the same context.
    pub fn decode(&self, bytes: &[u8], ctx: &ContextConverter) -> Result<Record> {
        let raw = self.compressor.decompress(bytes)?;
        let wire = self.value_codec.decode(&raw)?;
        let record = self.unpack(wire, ctx)?;
        log::trace!(
            "[engine] decoded {} via {}: {} wire bytes",
            record.owning_type(),
            ctx.context_name(),
            bytes.len()
        );
        Ok(record)
    }

    /// Decode into `T`, failing with [`Error::TypeMismatch`] if the payload
    /// holds another schema.
    pub fn decode_as<T: Schema>(&self, bytes: &[u8], ctx: &ContextConverter) -> Result<T> {
        let record = self.decode(bytes, ctx)?;
        if record.owning_type().as_str() != T::owning_type() {
            return Err(Error::TypeMismatch {
                expected: T::owning_type().to_string(),
                found: record.owning_type().to_string(),
            });
        }
        Ok(T::from_record(record)?)
    }

    /// Build the wire value `(index, slots)` without serializing it.
    pub fn pack(&self, record: &Record, ctx: &ContextConverter) -> Result<Value> {
        ctx.ensure_verified(self.registry);
        let snapshot = self.registry.snapshot();
        Packer::new(&snapshot, ctx, self.config.trim_trailing_absent).pack_top(record)
    }

    /// Rebuild a record from a wire value produced by [`pack`](Self::pack).
    pub fn unpack(&self, wire: Value, ctx: &ContextConverter) -> Result<Record> {
        ctx.ensure_verified(self.registry);
        let snapshot = self.registry.snapshot();
        Unpacker::new(&snapshot, ctx).unpack_top(wire)
    }
}

impl Codec<'static> {
    /// Process-wide codec over [`Registry::global`], configured from the
    /// environment on first use.
    pub fn global() -> &'static Codec<'static> {
        GLOBAL_CODEC.get_or_init(|| {
            let config = CodecConfig::from_env();
            log::debug!("[engine] global codec: {:?}", config);
            Codec::with_config(Registry::global(), config)
        })
    }
}

/// Encode with the global codec.
pub fn encode(record: &Record, ctx: &ContextConverter) -> Result<Vec<u8>> {
    Codec::global().encode(record, ctx)
}

/// Decode with the global codec.
pub fn decode(bytes: &[u8], ctx: &ContextConverter) -> Result<Record> {
    Codec::global().decode(bytes, ctx)
}
