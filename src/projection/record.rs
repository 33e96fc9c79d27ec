//! Transformed records and the extraction source interface.
//!
//! The extraction/transform layer (file readers, worksheet iteration, field-level rules) lives
//! outside this crate. It hands over, per extraction table, the table's mapping metadata plus a
//! lazy stream of [`TransformedRecord`]s.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;

use crate::error::ProjectionResult;
use crate::mapping::TableMapping;
use crate::types::{normalize_raw_column_name, ClassName};

/// Key of the nested raw-text map inside a transformed field-value object.
pub const RAWTEXT_KEY: &str = "rawtext";

/// Transformed field values of one record plus its nested raw-text map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    /// Transformed values keyed by field name (case sensitive).
    pub values: serde_json::Map<String, JsonValue>,
    /// Original text keyed by raw-text column name (any case).
    pub rawtext: serde_json::Map<String, JsonValue>,
}

impl FieldValues {
    /// Empty field values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a flat JSON object: the object under [`RAWTEXT_KEY`] becomes the raw-text map and
    /// every other entry a field value.
    pub fn from_json_object(mut object: serde_json::Map<String, JsonValue>) -> Self {
        let rawtext = match object.remove(RAWTEXT_KEY) {
            Some(JsonValue::Object(raw)) => raw,
            Some(other) => {
                object.insert(RAWTEXT_KEY.to_string(), other);
                serde_json::Map::new()
            }
            None => serde_json::Map::new(),
        };
        Self {
            values: object,
            rawtext,
        }
    }

    /// Set a field value.
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Set a raw-text entry.
    pub fn with_raw(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.rawtext.insert(column.into(), value.into());
        self
    }

    /// The transformed value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.values.get(field)
    }

    /// Raw-text entries keyed by case-folded column name.
    ///
    /// If two keys fold to the same name the one inserted first wins.
    pub fn rawtext_index(&self) -> HashMap<String, &JsonValue> {
        let mut index = HashMap::with_capacity(self.rawtext.len());
        for (key, value) in &self.rawtext {
            index.entry(normalize_raw_column_name(key)).or_insert(value);
        }
        index
    }
}

/// One transformed record: `(instance id, field values, source row index)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    /// Mapping instance that produced the record (`<Class>#<suffix>`).
    pub instance_id: String,
    /// Transformed values and raw text.
    pub fields: FieldValues,
    /// Row index in the source, used in error messages.
    pub row_index: usize,
}

impl TransformedRecord {
    /// Create a record.
    pub fn new(instance_id: impl Into<String>, fields: FieldValues, row_index: usize) -> Self {
        Self {
            instance_id: instance_id.into(),
            fields,
            row_index,
        }
    }

    /// The entity class this record is attributed to.
    pub fn class_name(&self) -> ClassName {
        ClassName::from_instance_id(&self.instance_id)
    }
}

/// One extraction table: its mapping metadata and its (lazy) record stream.
#[derive(Debug)]
pub struct ExtractedTable<R> {
    /// Mapping metadata the table's schemas are derived from.
    pub mapping: TableMapping,
    /// Records in source order.
    pub records: R,
}

impl<R> ExtractedTable<R> {
    /// Create a table.
    pub fn new(mapping: TableMapping, records: R) -> Self {
        Self { mapping, records }
    }
}

/// Produces extraction tables for one input file, in order.
pub trait ExtractionSource {
    /// Record stream of a single table.
    type Records: Iterator<Item = ProjectionResult<TransformedRecord>>;

    /// Path of the input file; its stem prefixes every artifact name.
    fn source_path(&self) -> &Path;

    /// The next table, or `None` once the input is exhausted.
    fn next_table(&mut self) -> Option<ProjectionResult<ExtractedTable<Self::Records>>>;
}

/// An [`ExtractionSource`] over tables already held in memory.
#[derive(Debug)]
pub struct MemorySource {
    path: PathBuf,
    tables: VecDeque<(TableMapping, Vec<ProjectionResult<TransformedRecord>>)>,
}

impl MemorySource {
    /// An empty source named after `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tables: VecDeque::new(),
        }
    }

    /// Append a table.
    pub fn with_table(self, mapping: TableMapping, records: Vec<TransformedRecord>) -> Self {
        self.with_table_results(mapping, records.into_iter().map(Ok).collect())
    }

    /// Append a table whose stream may yield upstream failures.
    pub fn with_table_results(
        mut self,
        mapping: TableMapping,
        records: Vec<ProjectionResult<TransformedRecord>>,
    ) -> Self {
        self.tables.push_back((mapping, records));
        self
    }
}

impl ExtractionSource for MemorySource {
    type Records = std::vec::IntoIter<ProjectionResult<TransformedRecord>>;

    fn source_path(&self) -> &Path {
        &self.path
    }

    fn next_table(&mut self) -> Option<ProjectionResult<ExtractedTable<Self::Records>>> {
        self.tables
            .pop_front()
            .map(|(mapping, records)| Ok(ExtractedTable::new(mapping, records.into_iter())))
    }
}
