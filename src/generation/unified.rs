//! Unified generation entrypoint.
//!
//! Most callers should use [`generate`], which drives one input file through the whole pipeline:
//! for every extraction table the source yields, schemas are derived, records are cast and
//! partitioned by entity class, and the per-class mapped/raw batches are handed to a sink.
//!
//! - Tables are processed strictly in order; each gets its own schema set.
//! - The first error aborts the run. Artifacts already written are not rolled back.
//! - If a [`super::observability::GenerationObserver`] is provided, progress, success, failures
//!   and alerts are reported to it.

use std::fmt;
use std::sync::Arc;

use crate::casting::{TypeRegistry, ValueCaster};
use crate::error::{ProjectionError, ProjectionResult};
use crate::mapping::SchemaDeriver;
use crate::output::{ArtifactReport, ColumnarSink, OutputAssembler};
use crate::projection::{ExtractionSource, RowPartitioner};

use super::observability::{GenerationContext, GenerationObserver, GenerationSeverity, GenerationStats};

/// Options controlling a generation run.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct GeneratorOptions {
    /// Kinds accepted in mapping definitions.
    pub registry: TypeRegistry,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn GenerationObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: GenerationSeverity,
}

impl fmt::Debug for GeneratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorOptions")
            .field("registry", &self.registry.names().collect::<Vec<_>>())
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            registry: TypeRegistry::standard(),
            observer: None,
            alert_at_or_above: GenerationSeverity::Critical,
        }
    }
}

/// Externally observable result of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// One entry per written artifact: per class in first-record order, mapped then raw.
    pub artifacts: Vec<ArtifactReport>,
    /// Records projected across all tables.
    pub records: usize,
    /// Extraction tables processed.
    pub tables: usize,
}

impl GenerationReport {
    /// The entry for `artifact` (e.g. `survey.hash.mapped`), if it was written.
    pub fn artifact(&self, artifact: &str) -> Option<&ArtifactReport> {
        self.artifacts.iter().find(|r| r.artifact == artifact)
    }
}

/// Generate typed and raw artifacts for every table of `source` into `sink`.
///
/// When an observer is configured, this function reports:
///
/// - `on_table_started` before each table's schemas are derived
/// - `on_artifact` after each artifact is written
/// - `on_success` on success, with table/record/artifact totals
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```rust
/// use columnar_projection::generation::{generate, GeneratorOptions};
/// use columnar_projection::mapping::{ColumnMapping, FieldMapping, MappingInstance, TableMapping};
/// use columnar_projection::output::MemorySink;
/// use columnar_projection::projection::{FieldValues, MemorySource, TransformedRecord};
///
/// # fn main() -> Result<(), columnar_projection::ProjectionError> {
/// let mapping = TableMapping::new(vec![MappingInstance::new(
///     "Person#1",
///     vec![ColumnMapping::new("Age").map_to(FieldMapping::new("AGE").kind("int32"))],
/// )]);
/// let record = TransformedRecord::new(
///     "Person#1",
///     FieldValues::new().with_value("AGE", "34").with_raw("age", "34 years"),
///     0,
/// );
/// let mut source = MemorySource::new("/data/people.xlsx").with_table(mapping, vec![record]);
/// let mut sink = MemorySink::new();
///
/// let report = generate(&mut source, &mut sink, &GeneratorOptions::default())?;
/// assert_eq!(report.artifact("people.person.mapped").map(|a| a.row_count), Some(1));
/// assert_eq!(report.artifact("people.person.raw").map(|a| a.row_count), Some(1));
/// # Ok(())
/// # }
/// ```
pub fn generate<E, S>(source: &mut E, sink: &mut S, options: &GeneratorOptions) -> ProjectionResult<GenerationReport>
where
    E: ExtractionSource + ?Sized,
    S: ColumnarSink + ?Sized,
{
    let mut ctx = GenerationContext::new(source.source_path());
    let result = run_tables(source, sink, options, &mut ctx);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(report) => obs.on_success(
                &ctx,
                GenerationStats {
                    tables: report.tables,
                    records: report.records,
                    artifacts: report.artifacts.len(),
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// Generate Parquet files for every table of `source` under `output_dir`.
///
/// Shorthand for [`generate`] with a [`crate::output::ParquetSink`] using default writer
/// properties.
#[cfg(feature = "parquet")]
pub fn generate_parquet<E>(
    source: &mut E,
    output_dir: impl AsRef<std::path::Path>,
    options: &GeneratorOptions,
) -> ProjectionResult<GenerationReport>
where
    E: ExtractionSource + ?Sized,
{
    let mut sink = crate::output::ParquetSink::new(output_dir);
    generate(source, &mut sink, options)
}

fn run_tables<E, S>(
    source: &mut E,
    sink: &mut S,
    options: &GeneratorOptions,
    ctx: &mut GenerationContext,
) -> ProjectionResult<GenerationReport>
where
    E: ExtractionSource + ?Sized,
    S: ColumnarSink + ?Sized,
{
    let deriver = SchemaDeriver::new(&options.registry);
    let mut assembler = OutputAssembler::new(source.source_path());
    let mut records = 0;
    let mut tables = 0;

    while let Some(table) = source.next_table() {
        let table = table?;
        ctx.table = table.mapping.name.clone();
        ctx.table_index = tables;
        if let Some(obs) = options.observer.as_ref() {
            obs.on_table_started(ctx);
        }

        // Derived in full before the first record is cast.
        let schemas = deriver.derive(&table.mapping)?;
        let mut partitioner = RowPartitioner::new(&schemas, ValueCaster::new(&options.registry));
        records += partitioner.extend(table.records)?;

        let written = assembler.assemble(partitioner.finish(), sink)?;
        if let Some(obs) = options.observer.as_ref() {
            for artifact in &written {
                obs.on_artifact(ctx, artifact);
            }
        }
        tables += 1;
    }

    Ok(GenerationReport {
        artifacts: assembler.into_reports(),
        records,
        tables,
    })
}

/// Severity of a failed run, used for observer callbacks and the alert threshold.
///
/// I/O, sink and upstream extraction failures are `Critical`; configuration and data errors
/// are `Error`.
pub fn severity_for_error(e: &ProjectionError) -> GenerationSeverity {
    match e {
        ProjectionError::Io(_) | ProjectionError::Sink { .. } | ProjectionError::Extraction { .. } => {
            GenerationSeverity::Critical
        }
        ProjectionError::Json(_)
        | ProjectionError::UnsupportedType { .. }
        | ProjectionError::InvalidOptions { .. }
        | ProjectionError::ConflictingSchema { .. }
        | ProjectionError::InvalidValue { .. }
        | ProjectionError::UnknownClass { .. }
        | ProjectionError::DuplicateArtifact { .. } => GenerationSeverity::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::types::ClassName;

    #[test]
    fn io_sink_and_extraction_failures_are_critical() {
        let io = ProjectionError::Io(std::io::Error::other("disk full"));
        let sink = ProjectionError::Sink {
            artifact: "a.b.mapped".to_string(),
            source: SinkError::Rejected {
                message: "nope".to_string(),
            },
        };
        let extraction = ProjectionError::Extraction {
            message: "worksheet unreadable".to_string(),
        };
        for e in [io, sink, extraction] {
            assert_eq!(severity_for_error(&e), GenerationSeverity::Critical, "{e}");
        }
    }

    #[test]
    fn configuration_and_data_errors_are_errors() {
        let unknown = ProjectionError::UnknownClass {
            class: ClassName::new("Ghost"),
            row: 3,
        };
        let dup = ProjectionError::DuplicateArtifact {
            artifact: "a.b.raw".to_string(),
        };
        assert_eq!(severity_for_error(&unknown), GenerationSeverity::Error);
        assert_eq!(severity_for_error(&dup), GenerationSeverity::Error);
    }

    #[test]
    fn default_options_alert_on_critical_only() {
        let opts = GeneratorOptions::default();
        assert_eq!(opts.alert_at_or_above, GenerationSeverity::Critical);
        assert!(opts.observer.is_none());
        assert!(format!("{opts:?}").contains("observer_set: false"));
    }
}
