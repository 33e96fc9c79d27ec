//! Output assembly and columnar sinks.
//!
//! - [`sink`]: the [`ColumnarSink`] trait, [`ColumnBatch`], artifact naming and [`MemorySink`]
//! - [`assembler`]: the [`OutputAssembler`] writing mapped/raw artifacts per class
//! - [`parquet`](self::parquet): the [`ParquetSink`] (Cargo feature `parquet`, on by default)

pub mod assembler;
#[cfg(feature = "parquet")]
pub mod parquet;
pub mod sink;

pub use assembler::{class_batches, ArtifactReport, OutputAssembler};
#[cfg(feature = "parquet")]
pub use self::parquet::ParquetSink;
pub use sink::{source_stem, ArtifactMode, ArtifactName, ColumnBatch, ColumnarSink, MemorySink, WrittenArtifact};
