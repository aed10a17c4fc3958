// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! tuplepack configuration - single source of truth.
//!
//! Wire constants and defaults live here and nowhere else.
//!
//! - **Level 1 (Static)**: wire constants and limits
//! - **Level 2 (Runtime)**: [`CodecConfig`], built in code or from the
//!   environment with [`CodecConfig::from_env`]
//!
//! # Environment
//!
//! | Variable                   | Values                  | Default   |
//! |----------------------------|-------------------------|-----------|
//! | `TUPLEPACK_COMPRESSION`    | `none`, `deflate`, `lz4`| `deflate` |
//! | `TUPLEPACK_DEFLATE_LEVEL`  | `0`..=`9`               | `6`       |
//! | `TUPLEPACK_MAX_DEPTH`      | positive integer        | `128`     |

use crate::compress::{CompressConfig, CompressionAlgo};

// =======================================================================
// Wire constants
// =======================================================================

/// First element of a nesting marker `(NEST_TAG, nested_index, tuple)`.
///
/// Schema indices are positive, so a negative leading integer never
/// collides with a top-level payload. Literal user data of the same shape
/// is disambiguated at decode time by resolving the index.
pub const NEST_TAG: i64 = -1;

/// Largest explicit field index a descriptor accepts.
///
/// Value tuples are dense up to the highest index, so this bounds the
/// slot vector a single record can allocate.
pub const MAX_FIELD_INDEX: i64 = 65_536;

/// Largest schema index a context accepts.
pub const MAX_SCHEMA_INDEX: i64 = u32::MAX as i64;

/// Default maximum container nesting accepted by the value decoder.
pub const MAX_NESTING_DEPTH: usize = 128;

// =======================================================================
// Compression defaults
// =======================================================================

/// Payloads smaller than this are stored uncompressed.
pub const DEFAULT_COMPRESS_THRESHOLD: usize = 64;

/// Compressed output must be at most this fraction of the input.
pub const DEFAULT_RATIO_GATE: f32 = 0.9;

/// Deflate level used when none is configured.
pub const DEFAULT_DEFLATE_LEVEL: u32 = 6;

/// Largest original length a compressed frame may declare (64 MiB).
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Upper bound on deflate expansion (output bytes per input byte).
pub const DEFLATE_MAX_EXPANSION: usize = 1032;

/// Upper bound on LZ4 block expansion (output bytes per input byte).
pub const LZ4_MAX_EXPANSION: usize = 255;

// =======================================================================
// Environment variables
// =======================================================================

pub const ENV_COMPRESSION: &str = "TUPLEPACK_COMPRESSION";
pub const ENV_DEFLATE_LEVEL: &str = "TUPLEPACK_DEFLATE_LEVEL";
pub const ENV_MAX_DEPTH: &str = "TUPLEPACK_MAX_DEPTH";

/// Runtime configuration of a [`Codec`](crate::Codec).
#[derive(Debug, Clone, PartialEq)]
pub struct CodecConfig {
    /// Compression applied around the value codec output.
    pub compress: CompressConfig,
    /// Maximum container nesting accepted when decoding.
    pub max_depth: usize,
    /// Drop trailing absent slots from value tuples.
    pub trim_trailing_absent: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compress: CompressConfig::default(),
            max_depth: MAX_NESTING_DEPTH,
            trim_trailing_absent: true,
        }
    }
}

impl CodecConfig {
    /// Set the compression algorithm.
    #[must_use]
    pub fn with_compression(mut self, algo: CompressionAlgo) -> Self {
        self.compress.algo = algo;
        self
    }

    /// Replace the whole compression configuration.
    #[must_use]
    pub fn with_compress_config(mut self, compress: CompressConfig) -> Self {
        self.compress = compress;
        self
    }

    /// Set the largest original length accepted from a compressed frame.
    #[must_use]
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.compress.max_payload = max_payload;
        self
    }

    /// Set the decode nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Keep or drop trailing absent slots.
    #[must_use]
    pub fn with_trim_trailing_absent(mut self, trim: bool) -> Self {
        self.trim_trailing_absent = trim;
        self
    }

    /// Defaults overridden by `TUPLEPACK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    ///
    /// Invalid values are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_COMPRESSION) {
            match CompressionAlgo::from_name(&raw) {
                Some(algo) if algo.is_available() => config.compress.algo = algo,
                Some(algo) => log::warn!(
                    "{}={:?}: {:?} not compiled in, keeping {:?}",
                    ENV_COMPRESSION,
                    raw,
                    algo,
                    config.compress.algo
                ),
                None => log::warn!("{}={:?}: unknown algorithm, ignored", ENV_COMPRESSION, raw),
            }
        }

        if let Some(raw) = lookup(ENV_DEFLATE_LEVEL) {
            match raw.trim().parse::<u32>() {
                Ok(level) if level <= 9 => config.compress.deflate_level = level,
                _ => log::warn!("{}={:?}: expected 0-9, ignored", ENV_DEFLATE_LEVEL, raw),
            }
        }

        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => log::warn!(
                    "{}={:?}: expected a positive integer, ignored",
                    ENV_MAX_DEPTH,
                    raw
                ),
            }
        }

        config
    }
}
