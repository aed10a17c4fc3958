// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload compression around the value codec output.
//!
//! - **Threshold**: payloads smaller than `threshold` are stored as-is
//! - **Ratio gate**: compressed output is kept only if it is actually smaller
//!
//! # Algorithms
//!
//! - **Deflate** (always available via flate2)
//! - **LZ4** (feature `lz4`, via lz4_flex)
//!
//! # Frame Format
//!
//! ```text
//! stored     = 0x00 | payload
//! compressed = algo(u8) | orig_len(varint) | compressed_bytes
//! ```
//!
//! The algorithm byte makes every frame self-describing: a decoder
//! configured for Deflate still reads stored frames and vice versa.

use crate::codec::varint::{decode_varint, push_varint, varint_len};
use crate::config::{
    DEFAULT_COMPRESS_THRESHOLD, DEFAULT_DEFLATE_LEVEL, DEFAULT_MAX_PAYLOAD, DEFAULT_RATIO_GATE,
    DEFLATE_MAX_EXPANSION, LZ4_MAX_EXPANSION,
};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// Compression algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CompressionAlgo {
    /// No compression.
    None,
    /// Deflate compression (always available via flate2).
    #[default]
    Deflate,
    /// LZ4 compression (requires the `lz4` feature).
    Lz4,
}

impl CompressionAlgo {
    /// Frame byte identifying this algorithm.
    pub const fn wire_id(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Deflate => 1,
            Self::Lz4 => 2,
        }
    }

    /// Parse a frame byte.
    pub const fn from_wire_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::None),
            1 => Some(Self::Deflate),
            2 => Some(Self::Lz4),
            _ => None,
        }
    }

    /// Most output bytes one input byte can inflate to.
    const fn max_expansion(self) -> usize {
        match self {
            Self::None => 1,
            Self::Deflate => DEFLATE_MAX_EXPANSION,
            Self::Lz4 => LZ4_MAX_EXPANSION,
        }
    }

    /// Parse a configuration name (`none`, `deflate`, `lz4`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "deflate" => Some(Self::Deflate),
            "lz4" => Some(Self::Lz4),
            _ => None,
        }
    }

    /// Whether this algorithm was compiled in.
    pub const fn is_available(self) -> bool {
        match self {
            Self::None | Self::Deflate => true,
            Self::Lz4 => cfg!(feature = "lz4"),
        }
    }
}

/// Compression configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressConfig {
    /// Algorithm to use.
    pub algo: CompressionAlgo,
    /// Minimum payload size to attempt compression (default: 64 bytes).
    pub threshold: usize,
    /// If compressed_size > original_size * ratio_gate, store uncompressed.
    pub ratio_gate: f32,
    /// Deflate compression level (0-9, default: 6).
    pub deflate_level: u32,
    /// Largest original length a frame may declare when decompressing.
    #[cfg_attr(feature = "serde", serde(default = "default_max_payload"))]
    pub max_payload: usize,
}

#[cfg(feature = "serde")]
fn default_max_payload() -> usize {
    DEFAULT_MAX_PAYLOAD
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            algo: CompressionAlgo::default(),
            threshold: DEFAULT_COMPRESS_THRESHOLD,
            ratio_gate: DEFAULT_RATIO_GATE,
            deflate_level: DEFAULT_DEFLATE_LEVEL,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl CompressConfig {
    /// Configuration that never compresses (every frame is stored).
    pub fn disabled() -> Self {
        Self {
            algo: CompressionAlgo::None,
            ..Self::default()
        }
    }
}

/// Error type for compression operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressError {
    /// Empty input where a frame was expected.
    EmptyFrame,
    /// Unknown algorithm byte.
    UnknownAlgo(u8),
    /// Compression algorithm not compiled in.
    AlgoNotAvailable(CompressionAlgo),
    /// Compressor failed.
    CompressFailed,
    /// Decompressor failed or data is corrupt.
    DecompressFailed,
    /// Frame header is malformed.
    InvalidData,
    /// Original length mismatch after decompression.
    LengthMismatch { expected: usize, actual: usize },
    /// Declared original length exceeds the configured maximum or what the
    /// compressed body could possibly expand to.
    PayloadTooLarge { declared: u64, limit: u64 },
}

impl std::fmt::Display for CompressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFrame => write!(f, "empty frame"),
            Self::UnknownAlgo(id) => write!(f, "unknown compression algorithm id {}", id),
            Self::AlgoNotAvailable(algo) => {
                write!(f, "compression algorithm {:?} not available", algo)
            }
            Self::CompressFailed => write!(f, "compression failed"),
            Self::DecompressFailed => write!(f, "decompression failed"),
            Self::InvalidData => write!(f, "invalid compressed data"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "length mismatch: expected {}, got {}", expected, actual)
            }
            Self::PayloadTooLarge { declared, limit } => write!(
                f,
                "declared payload length {} exceeds limit {}",
                declared, limit
            ),
        }
    }
}

impl std::error::Error for CompressError {}

/// Snapshot of compression counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressStats {
    /// Number of payloads compressed.
    pub compressed_count: u64,
    /// Number of payloads stored (below threshold or algorithm `None`).
    pub skipped_threshold: u64,
    /// Number of payloads stored because compression did not pay off.
    pub skipped_ratio: u64,
    /// Total bytes before compression (compressed payloads only).
    pub bytes_in: u64,
    /// Total bytes after compression (compressed payloads only).
    pub bytes_out: u64,
    /// Number of compressed frames inflated.
    pub decompressed_count: u64,
}

impl CompressStats {
    /// Overall compression ratio (0.0 = perfect, 1.0 = no compression).
    pub fn ratio(&self) -> f32 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f32 / self.bytes_in as f32
        }
    }

    /// Bytes saved by compression.
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_in.saturating_sub(self.bytes_out)
    }
}

#[derive(Debug, Default)]
struct Counters {
    compressed_count: AtomicU64,
    skipped_threshold: AtomicU64,
    skipped_ratio: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
    decompressed_count: AtomicU64,
}

/// Frame compressor/decompressor, shareable across threads.
#[derive(Debug)]
pub struct Compressor {
    config: CompressConfig,
    counters: Counters,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(CompressConfig::default())
    }
}

impl Compressor {
    /// Create a compressor with the given configuration.
    pub fn new(config: CompressConfig) -> Self {
        Self {
            config,
            counters: Counters::default(),
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &CompressConfig {
        &self.config
    }

    /// Wrap `payload` in a frame, compressing it when worthwhile.
    pub fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, CompressError> {
        let algo = self.config.algo;
        if algo == CompressionAlgo::None || payload.len() < self.config.threshold {
            self.counters
                .skipped_threshold
                .fetch_add(1, Ordering::Relaxed);
            return Ok(stored(payload));
        }
        if !algo.is_available() {
            return Err(CompressError::AlgoNotAvailable(algo));
        }

        let compressed = self.compress_raw(payload)?;
        let wire_size = 1 + varint_len(payload.len() as u64) + compressed.len();

        let ratio = wire_size as f32 / payload.len() as f32;
        if ratio > self.config.ratio_gate {
            self.counters.skipped_ratio.fetch_add(1, Ordering::Relaxed);
            return Ok(stored(payload));
        }

        let mut frame = Vec::with_capacity(wire_size);
        frame.push(algo.wire_id());
        push_varint(&mut frame, payload.len() as u64);
        frame.extend_from_slice(&compressed);

        self.counters
            .compressed_count
            .fetch_add(1, Ordering::Relaxed);
        self.counters
            .bytes_in
            .fetch_add(payload.len() as u64, Ordering::Relaxed);
        self.counters
            .bytes_out
            .fetch_add(frame.len() as u64, Ordering::Relaxed);

        Ok(frame)
    }

    fn compress_raw(&self, payload: &[u8]) -> Result<Vec<u8>, CompressError> {
        match self.config.algo {
            CompressionAlgo::None => Ok(payload.to_vec()),

            CompressionAlgo::Deflate => {
                use flate2::write::DeflateEncoder;
                use flate2::Compression;

                let mut encoder = DeflateEncoder::new(
                    Vec::with_capacity(payload.len()),
                    Compression::new(self.config.deflate_level.min(9)),
                );
                encoder
                    .write_all(payload)
                    .map_err(|_| CompressError::CompressFailed)?;
                encoder.finish().map_err(|_| CompressError::CompressFailed)
            }

            #[cfg(feature = "lz4")]
            CompressionAlgo::Lz4 => Ok(lz4_flex::block::compress(payload)),

            #[cfg(not(feature = "lz4"))]
            CompressionAlgo::Lz4 => Err(CompressError::AlgoNotAvailable(CompressionAlgo::Lz4)),
        }
    }

    /// Unwrap a frame produced by [`compress`](Self::compress).
    ///
    /// The algorithm is read from the frame, not from this compressor's
    /// configuration.
    pub fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>, CompressError> {
        let (&id, body) = frame.split_first().ok_or(CompressError::EmptyFrame)?;
        let algo = CompressionAlgo::from_wire_id(id).ok_or(CompressError::UnknownAlgo(id))?;
        if algo == CompressionAlgo::None {
            return Ok(body.to_vec());
        }
        if !algo.is_available() {
            return Err(CompressError::AlgoNotAvailable(algo));
        }

        let (orig_len, prefix) = decode_varint(body).map_err(|_| CompressError::InvalidData)?;
        let data = &body[prefix..];

        // Bound the declared length before anything is allocated.
        let limit = self
            .config
            .max_payload
            .min(data.len().saturating_mul(algo.max_expansion()));
        if orig_len > limit as u64 {
            return Err(CompressError::PayloadTooLarge {
                declared: orig_len,
                limit: limit as u64,
            });
        }
        let orig_len = usize::try_from(orig_len).map_err(|_| CompressError::InvalidData)?;

        let output = decompress_raw(algo, data, orig_len)?;
        if output.len() != orig_len {
            return Err(CompressError::LengthMismatch {
                expected: orig_len,
                actual: output.len(),
            });
        }

        self.counters
            .decompressed_count
            .fetch_add(1, Ordering::Relaxed);
        Ok(output)
    }

    /// Get current statistics.
    pub fn stats(&self) -> CompressStats {
        let c = &self.counters;
        CompressStats {
            compressed_count: c.compressed_count.load(Ordering::Relaxed),
            skipped_threshold: c.skipped_threshold.load(Ordering::Relaxed),
            skipped_ratio: c.skipped_ratio.load(Ordering::Relaxed),
            bytes_in: c.bytes_in.load(Ordering::Relaxed),
            bytes_out: c.bytes_out.load(Ordering::Relaxed),
            decompressed_count: c.decompressed_count.load(Ordering::Relaxed),
        }
    }

    /// Reset statistics.
    pub fn reset_stats(&self) {
        let c = &self.counters;
        for counter in [
            &c.compressed_count,
            &c.skipped_threshold,
            &c.skipped_ratio,
            &c.bytes_in,
            &c.bytes_out,
            &c.decompressed_count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

fn stored(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 1);
    frame.push(CompressionAlgo::None.wire_id());
    frame.extend_from_slice(payload);
    frame
}

fn decompress_raw(
    algo: CompressionAlgo,
    data: &[u8],
    expected_len: usize,
) -> Result<Vec<u8>, CompressError> {
    match algo {
        CompressionAlgo::None => Ok(data.to_vec()),

        CompressionAlgo::Deflate => {
            use flate2::read::DeflateDecoder;

            // Read one byte past the declared length so oversized streams are
            // reported as a mismatch instead of inflating without bound.
            let mut decoder =
                DeflateDecoder::new(data).take((expected_len as u64).saturating_add(1));
            let mut output = Vec::with_capacity(expected_len.min(data.len().saturating_mul(4)));
            decoder
                .read_to_end(&mut output)
                .map_err(|_| CompressError::DecompressFailed)?;
            Ok(output)
        }

        #[cfg(feature = "lz4")]
        CompressionAlgo::Lz4 => lz4_flex::block::decompress(data, expected_len)
            .map_err(|_| CompressError::DecompressFailed),

        #[cfg(not(feature = "lz4"))]
        CompressionAlgo::Lz4 => {
            let _ = (data, expected_len);
            Err(CompressError::AlgoNotAvailable(CompressionAlgo::Lz4))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressible() -> Vec<u8> {
        (0..512).map(|i| (i % 16) as u8).collect()
    }

    #[test]
    fn test_compress_config_default() {
        let config = CompressConfig::default();
        assert_eq!(config.algo, CompressionAlgo::Deflate);
        assert_eq!(config.threshold, 64);
        assert!((config.ratio_gate - 0.9).abs() < 0.01);
        assert_eq!(config.deflate_level, 6);
    }

    #[test]
    fn test_small_payload_is_stored() {
        let compressor = Compressor::default();
        let frame = compressor.compress(b"hello").unwrap();
        assert_eq!(frame, b"\x00hello");
        assert_eq!(compressor.stats().skipped_threshold, 1);
        assert_eq!(compressor.decompress(&frame).unwrap(), b"hello");
    }

    #[test]
    fn test_deflate_roundtrip() {
        let compressor = Compressor::default();
        let data = compressible();
        let frame = compressor.compress(&data).unwrap();

        assert_eq!(frame[0], CompressionAlgo::Deflate.wire_id());
        assert!(frame.len() < data.len());
        assert_eq!(compressor.decompress(&frame).unwrap(), data);

        let stats = compressor.stats();
        assert_eq!(stats.compressed_count, 1);
        assert_eq!(stats.decompressed_count, 1);
        assert!(stats.ratio() < 1.0);
        assert!(stats.bytes_saved() > 0);

        compressor.reset_stats();
        assert_eq!(compressor.stats(), CompressStats::default());
    }

    #[test]
    fn test_incompressible_payload_fails_ratio_gate() {
        let compressor = Compressor::default();
        let mut rng = fastrand::Rng::with_seed(7);
        let data: Vec<u8> = (0..256).map(|_| rng.u8(..)).collect();

        let frame = compressor.compress(&data).unwrap();
        assert_eq!(frame[0], CompressionAlgo::None.wire_id());
        assert_eq!(compressor.stats().skipped_ratio, 1);
        assert_eq!(compressor.decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_frames_are_self_describing() {
        let deflating = Compressor::default();
        let plain = Compressor::new(CompressConfig::disabled());
        let data = compressible();

        let frame = deflating.compress(&data).unwrap();
        assert_eq!(plain.decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_malformed_frames() {
        let compressor = Compressor::default();
        assert_eq!(compressor.decompress(&[]), Err(CompressError::EmptyFrame));
        assert_eq!(compressor.decompress(&[9, 1, 2]), Err(CompressError::UnknownAlgo(9)));
        assert_eq!(compressor.decompress(&[1]), Err(CompressError::InvalidData));

        // Re-frame a valid deflate stream with a wrong original length
        let data = compressible();
        let frame = compressor.compress(&data).unwrap();
        let (_, prefix) = decode_varint(&frame[1..]).unwrap();
        let stream = &frame[1 + prefix..];

        let mut short = vec![CompressionAlgo::Deflate.wire_id()];
        push_varint(&mut short, 100);
        short.extend_from_slice(stream);
        assert_eq!(
            compressor.decompress(&short),
            Err(CompressError::LengthMismatch {
                expected: 100,
                actual: 101
            })
        );

        let mut long = vec![CompressionAlgo::Deflate.wire_id()];
        push_varint(&mut long, 1000);
        long.extend_from_slice(stream);
        assert_eq!(
            compressor.decompress(&long),
            Err(CompressError::LengthMismatch {
                expected: 1000,
                actual: data.len()
            })
        );
    }

    #[test]
    fn test_oversized_declared_length_rejected() {
        let compressor = Compressor::default();

        // u64::MAX original length over a tiny body
        let mut frame = vec![CompressionAlgo::Deflate.wire_id()];
        push_varint(&mut frame, u64::MAX);
        frame.extend_from_slice(&[0x03, 0x00]);
        assert!(matches!(
            compressor.decompress(&frame),
            Err(CompressError::PayloadTooLarge { declared: u64::MAX, .. })
        ));

        // Within the expansion bound but above the configured maximum
        let data = compressible();
        let small_limit = Compressor::new(CompressConfig {
            max_payload: 256,
            ..CompressConfig::default()
        });
        let frame = compressor.compress(&data).unwrap();
        assert_eq!(
            small_limit.decompress(&frame),
            Err(CompressError::PayloadTooLarge {
                declared: data.len() as u64,
                limit: 256
            })
        );
        assert_eq!(compressor.decompress(&frame).unwrap(), data);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_oversized_declared_length_rejected() {
        let compressor = Compressor::default();

        // 2^55 declared over a one-byte body must fail before allocating
        let frame = [
            CompressionAlgo::Lz4.wire_id(),
            0x80,
            0x80,
            0x80,
            0x80,
            0x80,
            0x80,
            0x80,
            0x40,
            0x00,
        ];
        assert!(matches!(
            compressor.decompress(&frame),
            Err(CompressError::PayloadTooLarge { declared, limit: 255 }) if declared == 1 << 55
        ));

        // Also bounded by expansion when the configured maximum is generous
        let mut frame = vec![CompressionAlgo::Lz4.wire_id()];
        push_varint(&mut frame, 4 * 255 + 1);
        frame.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            compressor.decompress(&frame),
            Err(CompressError::PayloadTooLarge { limit: 1020, .. })
        ));
    }

    #[cfg(not(feature = "lz4"))]
    #[test]
    fn test_lz4_unavailable_without_feature() {
        let compressor = Compressor::new(CompressConfig {
            algo: CompressionAlgo::Lz4,
            ..CompressConfig::default()
        });
        assert_eq!(
            compressor.compress(&compressible()),
            Err(CompressError::AlgoNotAvailable(CompressionAlgo::Lz4))
        );
        assert_eq!(
            compressor.decompress(&[2, 4, 0]),
            Err(CompressError::AlgoNotAvailable(CompressionAlgo::Lz4))
        );
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_roundtrip() {
        let compressor = Compressor::new(CompressConfig {
            algo: CompressionAlgo::Lz4,
            ..CompressConfig::default()
        });
        let data = compressible();
        let frame = compressor.compress(&data).unwrap();
        assert_eq!(frame[0], CompressionAlgo::Lz4.wire_id());
        assert_eq!(compressor.decompress(&frame).unwrap(), data);
    }

    #[test]
    fn test_algo_names() {
        assert_eq!(CompressionAlgo::from_name("Deflate"), Some(CompressionAlgo::Deflate));
        assert_eq!(CompressionAlgo::from_name(" none "), Some(CompressionAlgo::None));
        assert_eq!(CompressionAlgo::from_name("zstd"), None);
        for algo in [CompressionAlgo::None, CompressionAlgo::Deflate, CompressionAlgo::Lz4] {
            assert_eq!(CompressionAlgo::from_wire_id(algo.wire_id()), Some(algo));
        }
    }
}
