use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ProjectionError;
use crate::output::ArtifactReport;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GenerationSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (configuration or data error; the run failed).
    Error,
    /// Critical error (I/O, sink or upstream extraction failure).
    Critical,
}

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    /// The input file being projected.
    pub source: PathBuf,
    /// Label of the current extraction table, if the mapping names it.
    pub table: Option<String>,
    /// Zero-based index of the current table.
    pub table_index: usize,
}

impl GenerationContext {
    /// Context at the start of a run over `source`.
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            table: None,
            table_index: 0,
        }
    }

    fn table_label(&self) -> String {
        match &self.table {
            Some(name) => format!("{}:{name}", self.table_index),
            None => self.table_index.to_string(),
        }
    }
}

/// Totals reported on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    /// Extraction tables processed.
    pub tables: usize,
    /// Records projected.
    pub records: usize,
    /// Artifacts written.
    pub artifacts: usize,
}

/// Observer interface for run progress and outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait GenerationObserver: Send + Sync {
    /// Called before a table's schemas are derived.
    fn on_table_started(&self, _ctx: &GenerationContext) {}

    /// Called after the sink persisted an artifact.
    fn on_artifact(&self, _ctx: &GenerationContext, _artifact: &ArtifactReport) {}

    /// Called when the run succeeds.
    fn on_success(&self, _ctx: &GenerationContext, _stats: GenerationStats) {}

    /// Called when the run fails.
    fn on_failure(&self, _ctx: &GenerationContext, _severity: GenerationSeverity, _error: &ProjectionError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &GenerationContext, severity: GenerationSeverity, error: &ProjectionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn GenerationObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn GenerationObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl GenerationObserver for CompositeObserver {
    fn on_table_started(&self, ctx: &GenerationContext) {
        for o in &self.observers {
            o.on_table_started(ctx);
        }
    }

    fn on_artifact(&self, ctx: &GenerationContext, artifact: &ArtifactReport) {
        for o in &self.observers {
            o.on_artifact(ctx, artifact);
        }
    }

    fn on_success(&self, ctx: &GenerationContext, stats: GenerationStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &GenerationContext, severity: GenerationSeverity, error: &ProjectionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &GenerationContext, severity: GenerationSeverity, error: &ProjectionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs run events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl GenerationObserver for StdErrObserver {
    fn on_table_started(&self, ctx: &GenerationContext) {
        eprintln!(
            "[generate][table] source={} table={}",
            ctx.source.display(),
            ctx.table_label()
        );
    }

    fn on_artifact(&self, ctx: &GenerationContext, artifact: &ArtifactReport) {
        eprintln!(
            "[generate][write] source={} artifact={} path={} rows={}",
            ctx.source.display(),
            artifact.artifact,
            artifact.path.display(),
            artifact.row_count
        );
    }

    fn on_success(&self, ctx: &GenerationContext, stats: GenerationStats) {
        eprintln!(
            "[generate][ok] source={} tables={} records={} artifacts={}",
            ctx.source.display(),
            stats.tables,
            stats.records,
            stats.artifacts
        );
    }

    fn on_failure(&self, ctx: &GenerationContext, severity: GenerationSeverity, error: &ProjectionError) {
        eprintln!(
            "[generate][{:?}] source={} table={} err={}",
            severity,
            ctx.source.display(),
            ctx.table_label(),
            error
        );
    }

    fn on_alert(&self, ctx: &GenerationContext, severity: GenerationSeverity, error: &ProjectionError) {
        eprintln!(
            "[ALERT][generate][{:?}] source={} table={} err={}",
            severity,
            ctx.source.display(),
            ctx.table_label(),
            error
        );
    }
}

/// Appends run events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl GenerationObserver for FileObserver {
    fn on_artifact(&self, ctx: &GenerationContext, artifact: &ArtifactReport) {
        self.append_line(&format!(
            "{} write source={} table={} artifact={} path={} rows={}",
            unix_ts(),
            ctx.source.display(),
            ctx.table_label(),
            artifact.artifact,
            artifact.path.display(),
            artifact.row_count
        ));
    }

    fn on_success(&self, ctx: &GenerationContext, stats: GenerationStats) {
        self.append_line(&format!(
            "{} ok source={} tables={} records={} artifacts={}",
            unix_ts(),
            ctx.source.display(),
            stats.tables,
            stats.records,
            stats.artifacts
        ));
    }

    fn on_failure(&self, ctx: &GenerationContext, severity: GenerationSeverity, error: &ProjectionError) {
        self.append_line(&format!(
            "{} fail severity={:?} source={} table={} err={}",
            unix_ts(),
            severity,
            ctx.source.display(),
            ctx.table_label(),
            error
        ));
    }

    fn on_alert(&self, ctx: &GenerationContext, severity: GenerationSeverity, error: &ProjectionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} source={} table={} err={}",
            unix_ts(),
            severity,
            ctx.source.display(),
            ctx.table_label(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
