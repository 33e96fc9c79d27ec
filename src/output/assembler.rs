//! Output assembly: turns per-class row buffers into column batches and hands them to a sink.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{ProjectionError, ProjectionResult, SinkError};
use crate::projection::ClassOutput;
use crate::types::Value;

use super::sink::{ArtifactMode, ArtifactName, ColumnBatch, ColumnarSink};

/// One persisted artifact, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    /// Artifact name (`<source>.<class>.<mapped|raw>`).
    pub artifact: String,
    /// Where the sink put it.
    pub path: PathBuf,
    /// Rows written.
    pub row_count: usize,
}

/// Build the `(mapped, raw)` batches of one class.
///
/// The mapped batch uses the class schema in schema order; the raw batch has one string column
/// per raw-text column, in set order.
pub fn class_batches(output: ClassOutput<'_>) -> Result<(ColumnBatch, ColumnBatch), SinkError> {
    let (typed_rows, raw_rows) = output.buffer.into_rows();
    let mapped = ColumnBatch::from_rows(output.schema.schema.clone(), typed_rows)?;

    let raw_rows = raw_rows
        .into_iter()
        .map(|row| row.into_iter().map(|v| v.map_or(Value::Null, Value::Utf8)).collect())
        .collect();
    let raw = ColumnBatch::from_rows(output.schema.raw_columns.to_schema(), raw_rows)?;

    Ok((mapped, raw))
}

/// Writes class outputs for one input file and records every artifact written.
///
/// Artifact names must be unique across the whole run: a second table producing an already
/// written class fails with [`ProjectionError::DuplicateArtifact`].
#[derive(Debug)]
pub struct OutputAssembler {
    source_path: PathBuf,
    written: HashSet<String>,
    reports: Vec<ArtifactReport>,
}

impl OutputAssembler {
    /// An assembler naming artifacts after `source_path`.
    pub fn new(source_path: impl AsRef<Path>) -> Self {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            written: HashSet::new(),
            reports: Vec::new(),
        }
    }

    /// Write every class output to `sink`, mapped artifact first, then raw.
    ///
    /// A class schema with no typed fields (or no raw columns) produces no mapped (or raw)
    /// artifact. Returns the reports of this call only.
    pub fn assemble<S>(&mut self, outputs: Vec<ClassOutput<'_>>, sink: &mut S) -> ProjectionResult<Vec<ArtifactReport>>
    where
        S: ColumnarSink + ?Sized,
    {
        let mut reports = Vec::new();
        for output in outputs {
            let class = output.schema.class.clone();
            let mapped_name = ArtifactName::new(&self.source_path, &class, ArtifactMode::Mapped);
            let raw_name = ArtifactName::new(&self.source_path, &class, ArtifactMode::Raw);
            for name in [&mapped_name, &raw_name] {
                if self.written.contains(&name.to_string()) {
                    return Err(ProjectionError::DuplicateArtifact {
                        artifact: name.to_string(),
                    });
                }
            }

            let (mapped, raw) = class_batches(output).map_err(|source| ProjectionError::Sink {
                artifact: mapped_name.to_string(),
                source,
            })?;

            for (name, batch) in [(mapped_name, mapped), (raw_name, raw)] {
                if batch.schema.is_empty() {
                    continue;
                }
                reports.push(self.write_one(&name, &batch, sink)?);
            }
        }
        Ok(reports)
    }

    fn write_one<S>(&mut self, name: &ArtifactName, batch: &ColumnBatch, sink: &mut S) -> ProjectionResult<ArtifactReport>
    where
        S: ColumnarSink + ?Sized,
    {
        let artifact = name.to_string();
        let written = sink.write(name, batch).map_err(|source| ProjectionError::Sink {
            artifact: artifact.clone(),
            source,
        })?;

        let report = ArtifactReport {
            artifact: artifact.clone(),
            path: written.location,
            row_count: written.row_count,
        };
        self.written.insert(artifact);
        self.reports.push(report.clone());
        Ok(report)
    }

    /// Every artifact written so far, in write order.
    pub fn reports(&self) -> &[ArtifactReport] {
        &self.reports
    }

    /// Consume the assembler into its reports.
    pub fn into_reports(self) -> Vec<ArtifactReport> {
        self.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casting::{TypeRegistry, ValueCaster};
    use crate::mapping::{derive_schemas, ColumnMapping, FieldMapping, MappingInstance, TableMapping};
    use crate::output::MemorySink;
    use crate::projection::{FieldValues, RowPartitioner, TransformedRecord};
    use crate::types::DataType;

    fn table() -> TableMapping {
        TableMapping::new(vec![
            MappingInstance::new(
                "Hash#1",
                vec![
                    ColumnMapping::new("filename"),
                    ColumnMapping::new("AGE:N").map_to(FieldMapping::new("AGE").kind("int32")),
                ],
            ),
            MappingInstance::new(
                "Unused#1",
                vec![ColumnMapping::new("X").map_to(FieldMapping::new("X"))],
            ),
        ])
    }

    fn record(age: &str) -> TransformedRecord {
        TransformedRecord::new(
            "Hash#1",
            FieldValues::new()
                .with_value("AGE", age)
                .with_raw("filename", "input.xlsx")
                .with_raw("age:n", age),
            0,
        )
    }

    #[test]
    fn writes_mapped_then_raw_and_skips_empty_classes() {
        let registry = TypeRegistry::standard();
        let schemas = derive_schemas(&registry, &table()).unwrap();
        let mut partitioner = RowPartitioner::new(&schemas, ValueCaster::new(&registry));
        partitioner.push(&record("34")).unwrap();
        partitioner.push(&record("35")).unwrap();

        let mut sink = MemorySink::new();
        let mut assembler = OutputAssembler::new("/in/survey.csv");
        let reports = assembler.assemble(partitioner.finish(), &mut sink).unwrap();

        let names: Vec<_> = reports.iter().map(|r| r.artifact.as_str()).collect();
        assert_eq!(names, vec!["survey.hash.mapped", "survey.hash.raw"]);
        assert!(reports.iter().all(|r| r.row_count == 2));
        assert_eq!(assembler.reports(), reports.as_slice());

        let mapped = sink.get("survey.hash.mapped").unwrap();
        assert_eq!(mapped.schema.fields[0].data_type, DataType::Int32);
        assert_eq!(mapped.column("AGE").unwrap(), &[Value::Int32(34), Value::Int32(35)]);

        let raw = sink.get("survey.hash.raw").unwrap();
        assert_eq!(raw.schema.field_names().collect::<Vec<_>>(), vec!["filename", "age:n"]);
        assert_eq!(
            raw.column("age:n").unwrap(),
            &[Value::Utf8("34".into()), Value::Utf8("35".into())]
        );
        assert!(sink.get("survey.unused.mapped").is_none());
    }

    #[test]
    fn second_write_of_an_artifact_is_rejected() {
        let registry = TypeRegistry::standard();
        let schemas = derive_schemas(&registry, &table()).unwrap();
        let mut sink = MemorySink::new();
        let mut assembler = OutputAssembler::new("survey.csv");

        for attempt in 0..2 {
            let mut partitioner = RowPartitioner::new(&schemas, ValueCaster::new(&registry));
            partitioner.push(&record("1")).unwrap();
            let result = assembler.assemble(partitioner.finish(), &mut sink);
            if attempt == 0 {
                assert!(result.is_ok());
            } else {
                assert!(matches!(
                    result,
                    Err(ProjectionError::DuplicateArtifact { artifact }) if artifact == "survey.hash.mapped"
                ));
            }
        }
        assert_eq!(sink.len(), 2);
    }
}
