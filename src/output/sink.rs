//! Columnar sink interface.
//!
//! A sink persists one column-oriented [`ColumnBatch`] per [`ArtifactName`] and reports where it
//! went and how many rows it holds. Encoding, compression and layout are the sink's business.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SinkError;
use crate::types::{ClassName, Schema, Value};

/// Which of the two per-class artifacts a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactMode {
    /// Typed rows cast per the class schema.
    Mapped,
    /// All-string raw-text audit rows.
    Raw,
}

impl ArtifactMode {
    /// Suffix used in artifact names.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactMode::Mapped => "mapped",
            ArtifactMode::Raw => "raw",
        }
    }
}

/// Deterministic artifact name: `<source stem>.<snake_case class>.<mode>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    /// Input file name without directory and extension.
    pub source_stem: String,
    /// snake_case entity class.
    pub class_stem: String,
    /// Mapped or raw.
    pub mode: ArtifactMode,
}

impl ArtifactName {
    /// Name the `mode` artifact of `class` for the input at `source_path`.
    pub fn new(source_path: &Path, class: &ClassName, mode: ArtifactMode) -> Self {
        Self {
            source_stem: source_stem(source_path),
            class_stem: class.artifact_stem(),
            mode,
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.source_stem, self.class_stem, self.mode.as_str())
    }
}

/// File name of `path` without its (last) extension; `output` if there is none.
pub fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// Column-oriented data for one artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBatch {
    /// Column names and types, in order.
    pub schema: Schema,
    /// One value vector per schema field, all of length `row_count`.
    pub columns: Vec<Vec<Value>>,
    row_count: usize,
}

impl ColumnBatch {
    /// Transpose row-major data into columns.
    ///
    /// Fails if any row is not exactly as wide as the schema.
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self, SinkError> {
        let width = schema.len();
        let row_count = rows.len();
        let mut columns: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(row_count)).collect();

        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(SinkError::Rejected {
                    message: format!("row {idx} has {} values, schema has {width} fields", row.len()),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        Ok(Self {
            schema,
            columns,
            row_count,
        })
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Values of the named column.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.schema
            .index_of(name)
            .and_then(|idx| self.columns.get(idx))
            .map(Vec::as_slice)
    }
}

/// What a sink reports after persisting an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    /// Where the artifact was written (file path, or the artifact name for in-memory sinks).
    pub location: PathBuf,
    /// Rows written.
    pub row_count: usize,
}

/// Persists column batches. Writes are synchronous; a failure aborts the run.
pub trait ColumnarSink {
    /// Persist `batch` as `artifact`.
    fn write(&mut self, artifact: &ArtifactName, batch: &ColumnBatch) -> Result<WrittenArtifact, SinkError>;
}

impl<S: ColumnarSink + ?Sized> ColumnarSink for &mut S {
    fn write(&mut self, artifact: &ArtifactName, batch: &ColumnBatch) -> Result<WrittenArtifact, SinkError> {
        (**self).write(artifact, batch)
    }
}

impl<S: ColumnarSink + ?Sized> ColumnarSink for Box<S> {
    fn write(&mut self, artifact: &ArtifactName, batch: &ColumnBatch) -> Result<WrittenArtifact, SinkError> {
        (**self).write(artifact, batch)
    }
}

/// Keeps every written batch in memory, in write order.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Vec<(ArtifactName, ColumnBatch)>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Written artifacts, in write order.
    pub fn artifacts(&self) -> &[(ArtifactName, ColumnBatch)] {
        &self.artifacts
    }

    /// The batch written under `name` (its display form), if any.
    pub fn get(&self, name: &str) -> Option<&ColumnBatch> {
        self.artifacts
            .iter()
            .find(|(artifact, _)| artifact.to_string() == name)
            .map(|(_, batch)| batch)
    }

    /// Number of written artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ColumnarSink for MemorySink {
    fn write(&mut self, artifact: &ArtifactName, batch: &ColumnBatch) -> Result<WrittenArtifact, SinkError> {
        self.artifacts.push((artifact.clone(), batch.clone()));
        Ok(WrittenArtifact {
            location: PathBuf::from(artifact.to_string()),
            row_count: batch.row_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field};

    #[test]
    fn artifact_names_use_file_stem_and_snake_class() {
        let name = ArtifactName::new(
            Path::new("/data/in/ABC_Collection-June-2020_03.xlsm"),
            &ClassName::new("CrossSheet"),
            ArtifactMode::Mapped,
        );
        assert_eq!(name.to_string(), "ABC_Collection-June-2020_03.cross_sheet.mapped");

        let raw = ArtifactName::new(Path::new("plain"), &ClassName::new("Hash"), ArtifactMode::Raw);
        assert_eq!(raw.to_string(), "plain.hash.raw");
    }

    #[test]
    fn batches_transpose_rows() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int32),
            Field::new("b", DataType::String),
        ]);
        let batch = ColumnBatch::from_rows(
            schema,
            vec![
                vec![Value::Int32(1), Value::Utf8("x".into())],
                vec![Value::Null, Value::Utf8("y".into())],
            ],
        )
        .unwrap();
        assert_eq!(batch.row_count(), 2);
        assert_eq!(batch.column("a").unwrap(), &[Value::Int32(1), Value::Null]);
        assert_eq!(
            batch.column("b").unwrap(),
            &[Value::Utf8("x".into()), Value::Utf8("y".into())]
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let schema = Schema::new(vec![Field::new("a", DataType::Int32)]);
        let err = ColumnBatch::from_rows(schema, vec![vec![]]).unwrap_err();
        assert!(err.to_string().contains("row 0 has 0 values"));
    }

    #[test]
    fn zero_column_batches_keep_their_row_count() {
        let batch = ColumnBatch::from_rows(Schema::default(), vec![vec![], vec![]]).unwrap();
        assert_eq!(batch.row_count(), 2);
        assert!(batch.columns.is_empty());
    }
}
