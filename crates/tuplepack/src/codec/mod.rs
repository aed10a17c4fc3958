// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic value codec.
//!
//! The engine hands the wire tuple to a [`ValueCodec`] and never looks at
//! the bytes itself. [`TaggedCodec`] is the default implementation; any
//! lossless, deterministic codec over [`Value`](crate::Value) can be plugged
//! in through [`Codec::with_value_codec`](crate::Codec::with_value_codec).

mod tagged;
pub mod varint;

pub use tagged::TaggedCodec;
pub use varint::VarintError;

use crate::value::Value;
use std::fmt;

/// Errors decoding bytes back into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended inside a value.
    UnexpectedEof { offset: usize },
    /// Unknown type tag.
    InvalidTag { tag: u8, offset: usize },
    /// String or atom bytes are not valid UTF-8.
    InvalidUtf8 { offset: usize },
    /// Malformed length or integer varint.
    Varint(VarintError),
    /// Containers nested deeper than the configured limit.
    DepthExceeded { max: usize },
    /// Declared length/count cannot fit in the remaining input.
    LengthOverflow { declared: u64, remaining: usize },
    /// Extra bytes after the top-level value.
    TrailingBytes { count: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { offset } => {
                write!(f, "unexpected end of input at offset {}", offset)
            }
            Self::InvalidTag { tag, offset } => {
                write!(f, "invalid value tag 0x{:02X} at offset {}", tag, offset)
            }
            Self::InvalidUtf8 { offset } => write!(f, "invalid UTF-8 at offset {}", offset),
            Self::Varint(e) => write!(f, "varint: {}", e),
            Self::DepthExceeded { max } => write!(f, "nesting depth exceeds {}", max),
            Self::LengthOverflow {
                declared,
                remaining,
            } => write!(
                f,
                "declared length {} exceeds remaining {} bytes",
                declared, remaining
            ),
            Self::TrailingBytes { count } => {
                write!(f, "{} trailing bytes after value", count)
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Varint(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VarintError> for CodecError {
    fn from(e: VarintError) -> Self {
        Self::Varint(e)
    }
}

/// Lossless, deterministic serializer for the value domain.
///
/// Implementations must round-trip every [`Value`] variant, and equal values
/// must produce equal bytes.
pub trait ValueCodec: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Serialize a value.
    fn encode(&self, value: &Value) -> Vec<u8>;

    /// Deserialize a value, consuming the whole input.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}
