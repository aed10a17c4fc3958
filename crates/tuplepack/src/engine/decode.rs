// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire value → record.

use crate::config::NEST_TAG;
use crate::context::ContextConverter;
use crate::error::{Error, Result};
use crate::registry::{Registration, RegistrySnapshot};
use crate::value::{Record, Value};

pub(super) struct Unpacker<'s> {
    snapshot: &'s RegistrySnapshot,
    ctx: &'s ContextConverter,
}

impl<'s> Unpacker<'s> {
    pub(super) fn new(snapshot: &'s RegistrySnapshot, ctx: &'s ContextConverter) -> Self {
        Self { snapshot, ctx }
    }

    pub(super) fn unpack_top(&self, wire: Value) -> Result<Record> {
        let (index, slots) = split_wire(wire)?;
        let registration = self.resolve(index)?;
        Ok(self.build_record(registration, slots))
    }

    fn resolve(&self, index: i64) -> Result<&'s Registration> {
        let name = self.ctx.name_for(index)?;
        self.snapshot
            .lookup_by_name(name)
            .map(|r| &**r)
            .ok_or_else(|| Error::SchemaNotFound {
                schema: name.to_string(),
                context: self.ctx.context_name().to_string(),
            })
    }

    /// Missing trailing slots read as absent; slots past the last declared
    /// index are ignored.
    fn build_record(&self, registration: &Registration, slots: Vec<Value>) -> Record {
        let mut slots: Vec<Option<Value>> = slots.into_iter().map(Some).collect();
        let mut record = Record::new(registration.owning_type.clone());
        for (field, index) in registration.descriptor.entries() {
            let value = slots
                .get_mut(index as usize - 1)
                .and_then(Option::take)
                .map_or(Value::Nil, |v| self.unpack_value(v));
            record.set(field, value);
        }
        record
    }

    fn unpack_value(&self, value: Value) -> Value {
        match value {
            Value::Tuple(items) => match nest_marker_index(&items) {
                Some(index) => self.unpack_marker(index, items),
                None => Value::Tuple(self.unpack_all(items)),
            },
            Value::List(items) => Value::List(self.unpack_all(items)),
            Value::Map(pairs) => Value::Map(
                pairs
                    .into_iter()
                    .map(|(k, v)| (self.unpack_value(k), self.unpack_value(v)))
                    .collect(),
            ),
            other => other,
        }
    }

    fn unpack_marker(&self, index: i64, mut items: Vec<Value>) -> Value {
        match self.resolve(index) {
            Ok(registration) => match items.pop() {
                Some(Value::Tuple(slots)) => Value::Record(self.build_record(registration, slots)),
                // nest_marker_index checked the shape
                _ => Value::Nil,
            },
            Err(e) => {
                log::warn!(
                    "[engine] nesting marker with index {} kept as literal data ({})",
                    index,
                    e
                );
                Value::Tuple(self.unpack_all(items))
            }
        }
    }

    fn unpack_all(&self, items: Vec<Value>) -> Vec<Value> {
        items.into_iter().map(|v| self.unpack_value(v)).collect()
    }
}

/// Split the top-level `(index, slots)` pair.
fn split_wire(wire: Value) -> Result<(i64, Vec<Value>)> {
    let found = wire.kind_name();
    let Value::Tuple(mut parts) = wire else {
        return Err(Error::MalformedPayload(format!(
            "expected (index, tuple), found {}",
            found
        )));
    };
    match (parts.pop(), parts.pop(), parts.is_empty()) {
        (Some(Value::Tuple(slots)), Some(Value::Int(index)), true) => Ok((index, slots)),
        _ => Err(Error::MalformedPayload(
            "expected (index, tuple) pair".to_string(),
        )),
    }
}

/// Index of a `(NEST_TAG, index, tuple)` marker, if `items` has that shape.
fn nest_marker_index(items: &[Value]) -> Option<i64> {
    match items {
        [Value::Int(tag), Value::Int(index), Value::Tuple(_)] if *tag == NEST_TAG && *index > 0 => {
            Some(*index)
        }
        _ => None,
    }
}
