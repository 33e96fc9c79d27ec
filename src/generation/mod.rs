//! Run orchestration: the table-by-table pipeline and its observability hooks.
//!
//! - [`unified`]: [`generate`] (and [`generate_parquet`] with the `parquet` feature)
//! - [`observability`]: observer trait plus stderr/file/composite observers

pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, GenerationContext, GenerationObserver, GenerationSeverity, GenerationStats,
    StdErrObserver,
};
#[cfg(feature = "parquet")]
pub use unified::generate_parquet;
pub use unified::{generate, severity_for_error, GenerationReport, GeneratorOptions};
