//! Row partitioning: groups transformed records by entity class and casts them into typed rows
//! and raw-text rows, side by side.
//!
//! Rules:
//!
//! - Records are processed in arrival order; rows are only ever appended.
//! - The typed row and the raw row of a record are both built before either is appended, so the
//!   two row sets of a class never drift apart.
//! - The first cast failure aborts; no partially typed row is kept.

use serde_json::Value as JsonValue;

use crate::casting::{stringify, ValueCaster};
use crate::error::{ProjectionError, ProjectionResult};
use crate::mapping::{ClassSchema, SchemaSet};
use crate::types::{RawRow, TypedRow};

use super::record::TransformedRecord;

/// Accumulated typed and raw rows of one entity class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassBuffer {
    typed_rows: Vec<TypedRow>,
    raw_rows: Vec<RawRow>,
}

impl ClassBuffer {
    fn push(&mut self, typed: TypedRow, raw: RawRow) {
        self.typed_rows.push(typed);
        self.raw_rows.push(raw);
    }

    /// Typed rows, in arrival order.
    pub fn typed_rows(&self) -> &[TypedRow] {
        &self.typed_rows
    }

    /// Raw rows, in arrival order.
    pub fn raw_rows(&self) -> &[RawRow] {
        &self.raw_rows
    }

    /// Number of records buffered (typed and raw counts are always equal).
    pub fn len(&self) -> usize {
        self.typed_rows.len()
    }

    /// Returns `true` if no record was buffered.
    pub fn is_empty(&self) -> bool {
        self.typed_rows.is_empty()
    }

    /// Consume the buffer into `(typed rows, raw rows)`.
    pub fn into_rows(self) -> (Vec<TypedRow>, Vec<RawRow>) {
        (self.typed_rows, self.raw_rows)
    }
}

/// The buffered rows of one class, handed off together with the class schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassOutput<'s> {
    /// Schema the rows are aligned with.
    pub schema: &'s ClassSchema,
    /// The rows.
    pub buffer: ClassBuffer,
}

/// Projects a table's record stream into per-class [`ClassBuffer`]s.
///
/// One buffer exists per class of the [`SchemaSet`] from construction on; classes that receive
/// no record are simply left out of [`RowPartitioner::finish`].
#[derive(Debug)]
pub struct RowPartitioner<'s> {
    schemas: &'s SchemaSet,
    caster: ValueCaster<'s>,
    buffers: Vec<ClassBuffer>,
    arrival: Vec<usize>,
    records: usize,
}

impl<'s> RowPartitioner<'s> {
    /// Create a partitioner for the classes of `schemas`.
    pub fn new(schemas: &'s SchemaSet, caster: ValueCaster<'s>) -> Self {
        Self {
            schemas,
            caster,
            buffers: vec![ClassBuffer::default(); schemas.len()],
            arrival: Vec::new(),
            records: 0,
        }
    }

    /// Cast one record and append its rows to its class buffer.
    pub fn push(&mut self, record: &TransformedRecord) -> ProjectionResult<()> {
        let class = record.class_name();
        let (idx, class_schema) =
            self.schemas
                .lookup(&class)
                .ok_or_else(|| ProjectionError::UnknownClass {
                    class: class.clone(),
                    row: record.row_index,
                })?;

        let typed = class_schema
            .schema
            .fields
            .iter()
            .map(|field| {
                self.caster
                    .cast(record.fields.get(&field.name), &field.data_type)
                    .map_err(|e| ProjectionError::from_cast(&class, &field.name, record.row_index, e))
            })
            .collect::<ProjectionResult<TypedRow>>()?;

        let rawtext = record.fields.rawtext_index();
        let raw: RawRow = class_schema
            .raw_columns
            .iter()
            .map(|name| rawtext.get(name).and_then(|v| raw_text(v)))
            .collect();

        let buffer = &mut self.buffers[idx];
        if buffer.is_empty() {
            self.arrival.push(idx);
        }
        buffer.push(typed, raw);
        self.records += 1;
        Ok(())
    }

    /// Drain a record stream, stopping at the first upstream or cast failure.
    ///
    /// Returns the number of records consumed by this call.
    pub fn extend<I>(&mut self, records: I) -> ProjectionResult<usize>
    where
        I: IntoIterator<Item = ProjectionResult<TransformedRecord>>,
    {
        let mut consumed = 0;
        for record in records {
            self.push(&record?)?;
            consumed += 1;
        }
        Ok(consumed)
    }

    /// Total records buffered across all classes.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// The buffer of the class at `schemas` position `idx`.
    pub fn buffer(&self, idx: usize) -> Option<&ClassBuffer> {
        self.buffers.get(idx)
    }

    /// Hand off every non-empty buffer, ordered by the arrival of each class's first record.
    pub fn finish(mut self) -> Vec<ClassOutput<'s>> {
        let schemas: Vec<&'s ClassSchema> = self.schemas.iter().collect();
        self.arrival
            .iter()
            .map(|&idx| ClassOutput {
                schema: schemas[idx],
                buffer: std::mem::take(&mut self.buffers[idx]),
            })
            .collect()
    }
}

fn raw_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        other => Some(stringify(other)),
    }
}
