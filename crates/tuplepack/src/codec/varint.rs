// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ULEB128 varints and zigzag mapping for signed integers.
//!
//! Lengths, counts and integers in the tagged value format all use this
//! encoding, so small values (the common case for schema and field
//! indices) cost a single byte.
//!
//! ```
//! use tuplepack::codec::varint::{decode_varint, push_varint, zigzag_encode};
//!
//! let mut buf = Vec::new();
//! push_varint(&mut buf, 300);
//! assert_eq!(buf, [0xAC, 0x02]);
//! assert_eq!(decode_varint(&buf).unwrap(), (300, 2));
//! assert_eq!(zigzag_encode(-1), 1);
//! ```

/// Maximum bytes needed to encode a u64 in ULEB128.
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION_BIT: u8 = 0x80;
const DATA_MASK: u8 = 0x7F;

/// Error returned when varint decoding fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarintError {
    /// Buffer is empty or truncated mid-varint.
    UnexpectedEof,
    /// Varint is too long (overflow for u64).
    Overflow,
}

impl std::fmt::Display for VarintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of buffer while reading varint"),
            Self::Overflow => write!(f, "varint overflow (too many bytes for u64)"),
        }
    }
}

impl std::error::Error for VarintError {}

/// Append `value` as ULEB128 to `out`, returning the number of bytes written.
#[inline]
pub fn push_varint(out: &mut Vec<u8>, mut value: u64) -> usize {
    let start = out.len();
    loop {
        let byte = (value & u64::from(DATA_MASK)) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out.len() - start;
        }
        out.push(byte | CONTINUATION_BIT);
    }
}

/// Number of bytes `value` occupies once encoded.
#[inline]
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a ULEB128 varint from the start of `buf`.
///
/// Returns `(value, bytes_consumed)`.
#[inline]
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(VarintError::Overflow);
        }

        let data = u64::from(byte & DATA_MASK);

        // 10th byte: only bit 0 still fits in a u64
        if shift == 63 && data > 1 {
            return Err(VarintError::Overflow);
        }

        result |= data << shift;

        if byte & CONTINUATION_BIT == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    Err(VarintError::UnexpectedEof)
}

/// Map a signed integer onto u64 so small magnitudes stay small.
#[inline]
#[must_use]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
#[must_use]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
