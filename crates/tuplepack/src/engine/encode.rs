// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record → wire value.

use crate::config::NEST_TAG;
use crate::context::ContextConverter;
use crate::error::{Error, Result};
use crate::registry::RegistrySnapshot;
use crate::value::{Record, Value};

pub(super) struct Packer<'s> {
    snapshot: &'s RegistrySnapshot,
    ctx: &'s ContextConverter,
    trim_trailing_absent: bool,
}

impl<'s> Packer<'s> {
    pub(super) fn new(
        snapshot: &'s RegistrySnapshot,
        ctx: &'s ContextConverter,
        trim_trailing_absent: bool,
    ) -> Self {
        Self {
            snapshot,
            ctx,
            trim_trailing_absent,
        }
    }

    /// `(schema_index, slots)`
    pub(super) fn pack_top(&self, record: &Record) -> Result<Value> {
        let (index, slots) = self.pack_record(record)?;
        Ok(Value::Tuple(vec![Value::Int(index), Value::Tuple(slots)]))
    }

    fn pack_record(&self, record: &Record) -> Result<(i64, Vec<Value>)> {
        let registration = self
            .snapshot
            .lookup_by_type(record.owning_type().as_str())
            .ok_or_else(|| Error::SchemaNotRegistered {
                owning_type: record.owning_type().to_string(),
            })?;
        let descriptor = &registration.descriptor;
        let index = self.ctx.index_for(descriptor.name())?;

        let mut slots = vec![Value::Nil; descriptor.max_index() as usize];
        for (field, value) in record.populated() {
            let field_index = descriptor
                .field_index(field)
                .ok_or_else(|| Error::UnknownField {
                    schema: descriptor.name().to_string(),
                    field: field.to_string(),
                })?;
            slots[field_index as usize - 1] = self.pack_value(value)?;
        }

        if self.trim_trailing_absent {
            while slots.last().is_some_and(Value::is_nil) {
                slots.pop();
            }
        }

        Ok((i64::from(index), slots))
    }

    fn pack_value(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Record(record)
                if self
                    .snapshot
                    .lookup_by_type(record.owning_type().as_str())
                    .is_some() =>
            {
                let (index, slots) = self.pack_record(record)?;
                Ok(Value::Tuple(vec![
                    Value::Int(NEST_TAG),
                    Value::Int(index),
                    Value::Tuple(slots),
                ]))
            }
            Value::List(items) => self.pack_all(items).map(Value::List),
            Value::Tuple(items) => self.pack_all(items).map(Value::Tuple),
            Value::Map(pairs) => pairs
                .iter()
                .map(|(k, v)| -> Result<(Value, Value)> {
                    Ok((self.pack_value(k)?, self.pack_value(v)?))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Map),
            // Scalars and records of unregistered types pass through as-is.
            other => Ok(other.clone()),
        }
    }

    fn pack_all(&self, items: &[Value]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.pack_value(item)).collect()
    }
}
