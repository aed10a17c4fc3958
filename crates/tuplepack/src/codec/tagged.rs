// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tag-prefixed binary format for [`Value`].
//!
//! ```text
//! value   = tag payload
//! Nil     = 0x00
//! Bool    = 0x01 (false) | 0x02 (true)
//! Int     = 0x03 zigzag(varint)
//! Float   = 0x04 f64 little-endian (8 bytes)
//! Str     = 0x05 len(varint) utf8
//! Bytes   = 0x06 len(varint) raw
//! Atom    = 0x07 len(varint) utf8
//! List    = 0x08 count(varint) value*
//! Tuple   = 0x09 count(varint) value*
//! Map     = 0x0A count(varint) (value value)*
//! Record  = 0x0B len(varint) owning_type count(varint) (len name value)*
//! ```
//!
//! Record fields are written in name order and `Nil` fields are skipped,
//! so two equal records always encode to the same bytes.

use super::varint::{decode_varint, push_varint, zigzag_decode, zigzag_encode};
use super::{CodecError, ValueCodec};
use crate::config::MAX_NESTING_DEPTH;
use crate::value::{Record, Value};

const TAG_NIL: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STR: u8 = 0x05;
const TAG_BYTES: u8 = 0x06;
const TAG_ATOM: u8 = 0x07;
const TAG_LIST: u8 = 0x08;
const TAG_TUPLE: u8 = 0x09;
const TAG_MAP: u8 = 0x0A;
const TAG_RECORD: u8 = 0x0B;

/// Default [`ValueCodec`]: compact tag + varint encoding.
#[derive(Debug, Clone)]
pub struct TaggedCodec {
    max_depth: usize,
}

impl Default for TaggedCodec {
    fn default() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl TaggedCodec {
    /// Create a codec with the default depth limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec that rejects input nested deeper than `max_depth`.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Configured depth limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl ValueCodec for TaggedCodec {
    fn name(&self) -> &'static str {
        "tagged"
    }

    fn encode(&self, value: &Value) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        write_value(&mut out, value);
        out
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let mut reader = Reader {
            buf: bytes,
            pos: 0,
            max_depth: self.max_depth,
        };
        let value = reader.read_value(0)?;
        if reader.remaining() > 0 {
            return Err(CodecError::TrailingBytes {
                count: reader.remaining(),
            });
        }
        Ok(value)
    }
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    push_varint(out, len as u64);
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_len(out, s.len());
    out.extend_from_slice(s.as_bytes());
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Nil => out.push(TAG_NIL),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Int(v) => {
            out.push(TAG_INT);
            push_varint(out, zigzag_encode(*v));
        }
        Value::Float(v) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Str(s) => {
            out.push(TAG_STR);
            write_str(out, s);
        }
        Value::Bytes(b) => {
            out.push(TAG_BYTES);
            write_len(out, b.len());
            out.extend_from_slice(b);
        }
        Value::Atom(a) => {
            out.push(TAG_ATOM);
            write_str(out, a);
        }
        Value::List(items) => {
            out.push(TAG_LIST);
            write_seq(out, items);
        }
        Value::Tuple(items) => {
            out.push(TAG_TUPLE);
            write_seq(out, items);
        }
        Value::Map(pairs) => {
            out.push(TAG_MAP);
            write_len(out, pairs.len());
            for (k, v) in pairs {
                write_value(out, k);
                write_value(out, v);
            }
        }
        Value::Record(record) => write_record(out, record),
    }
}

fn write_seq(out: &mut Vec<u8>, items: &[Value]) {
    write_len(out, items.len());
    for item in items {
        write_value(out, item);
    }
}

fn write_record(out: &mut Vec<u8>, record: &Record) {
    out.push(TAG_RECORD);
    write_str(out, record.owning_type().as_str());
    write_len(out, record.populated_len());
    for (name, value) in record.populated() {
        write_str(out, name);
        write_value(out, value);
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or(CodecError::UnexpectedEof { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_varint(&mut self) -> Result<u64, CodecError> {
        let (value, used) = decode_varint(&self.buf[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    /// Read a length or element count. Every element takes at least one
    /// byte, so a count larger than the remaining input is malformed.
    fn read_len(&mut self) -> Result<usize, CodecError> {
        let declared = self.read_varint()?;
        let remaining = self.remaining();
        if declared > remaining as u64 {
            return Err(CodecError::LengthOverflow {
                declared,
                remaining,
            });
        }
        Ok(declared as usize)
    }

    fn read_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_len()?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let offset = self.pos;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8 { offset })
    }

    fn read_seq(&mut self, depth: usize) -> Result<Vec<Value>, CodecError> {
        let count = self.read_len()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_value(depth + 1)?);
        }
        Ok(items)
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, CodecError> {
        if depth > self.max_depth {
            return Err(CodecError::DepthExceeded {
                max: self.max_depth,
            });
        }

        let offset = self.pos;
        match self.read_u8()? {
            TAG_NIL => Ok(Value::Nil),
            TAG_FALSE => Ok(Value::Bool(false)),
            TAG_TRUE => Ok(Value::Bool(true)),
            TAG_INT => Ok(Value::Int(zigzag_decode(self.read_varint()?))),
            TAG_FLOAT => {
                let end = self.pos + 8;
                let raw = self
                    .buf
                    .get(self.pos..end)
                    .ok_or(CodecError::UnexpectedEof { offset: self.pos })?;
                let mut le = [0u8; 8];
                le.copy_from_slice(raw);
                self.pos = end;
                Ok(Value::Float(f64::from_le_bytes(le)))
            }
            TAG_STR => self.read_string().map(Value::Str),
            TAG_BYTES => self.read_bytes().map(|b| Value::Bytes(b.to_vec())),
            TAG_ATOM => self.read_string().map(Value::Atom),
            TAG_LIST => self.read_seq(depth).map(Value::List),
            TAG_TUPLE => self.read_seq(depth).map(Value::Tuple),
            TAG_MAP => {
                let count = self.read_len()?;
                let mut pairs = Vec::with_capacity(count);
                for _ in 0..count {
                    let k = self.read_value(depth + 1)?;
                    let v = self.read_value(depth + 1)?;
                    pairs.push((k, v));
                }
                Ok(Value::Map(pairs))
            }
            TAG_RECORD => {
                let owning_type = self.read_string()?;
                let count = self.read_len()?;
                let mut record = Record::new(owning_type);
                for _ in 0..count {
                    let name = self.read_string()?;
                    let value = self.read_value(depth + 1)?;
                    record.set(name, value);
                }
                Ok(Value::Record(record))
            }
            tag => Err(CodecError::InvalidTag { tag, offset }),
        }
    }
}
