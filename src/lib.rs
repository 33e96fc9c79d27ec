//! `columnar-projection` turns loosely-typed transformed records into strongly-typed columnar
//! datasets, while keeping a parallel all-string "raw text" audit trail of the same data.
//!
//! An external extraction layer reads the input file and applies field-level transforms; this
//! crate takes its output from there:
//!
//! 1. [`mapping`]: per-entity-class schemas are derived from declarative column mappings, and
//!    conflicting redefinitions of a field are rejected.
//! 2. [`casting`]: every field value is cast to its declared kind (`string`, `boolean`,
//!    `int8`..`uint64`, `date32`, `decimal`, `list`).
//! 3. [`projection`]: records are grouped by entity class into aligned typed/raw row buffers,
//!    in arrival order.
//! 4. [`output`]: each class becomes two artifacts, `<source>.<class>.mapped` and
//!    `<source>.<class>.raw`, handed to a [`output::ColumnarSink`] (Parquet by default).
//!
//! The primary entrypoint is [`generation::generate`].
//!
//! ## Quick example
//!
//! ```rust
//! use columnar_projection::generation::{generate, GeneratorOptions};
//! use columnar_projection::mapping::{ColumnMapping, FieldMapping, MappingInstance, TableMapping};
//! use columnar_projection::output::MemorySink;
//! use columnar_projection::projection::{FieldValues, MemorySource, TransformedRecord};
//! use columnar_projection::types::Value;
//!
//! # fn main() -> Result<(), columnar_projection::ProjectionError> {
//! let mapping = TableMapping::new(vec![MappingInstance::new(
//!     "Hash#1",
//!     vec![
//!         ColumnMapping::new("AGE").map_to(FieldMapping::new("AGE").kind("int32")),
//!         ColumnMapping::new("CODES").map_to(FieldMapping::new("CODES").kind("list").option("split", ",")),
//!     ],
//! )]);
//! let record = TransformedRecord::new(
//!     "Hash#1",
//!     FieldValues::new()
//!         .with_value("AGE", "34")
//!         .with_value("CODES", "14a,14b,14c")
//!         .with_raw("age", "34 years")
//!         .with_raw("codes", "14a,14b,14c"),
//!     0,
//! );
//!
//! let mut source = MemorySource::new("survey.xlsx").with_table(mapping, vec![record]);
//! let mut sink = MemorySink::new();
//! generate(&mut source, &mut sink, &GeneratorOptions::default())?;
//!
//! let mapped = sink.get("survey.hash.mapped").unwrap();
//! assert_eq!(mapped.column("AGE").unwrap(), &[Value::Int32(34)]);
//! let raw = sink.get("survey.hash.raw").unwrap();
//! assert_eq!(raw.column("age").unwrap(), &[Value::Utf8("34 years".to_string())]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: type descriptors, typed values, schemas and class names
//! - [`casting`]: type registry and value caster
//! - [`mapping`]: mapping definitions (JSON) and schema derivation
//! - [`projection`]: record streams and the row partitioner
//! - [`output`]: columnar sinks and the output assembler
//! - [`generation`]: the run entrypoint and observers
//! - [`error`]: error types used across the crate
//!
//! ## Cargo features
//!
//! - `parquet` (default): [`output::ParquetSink`], writing artifacts through `arrow`/`parquet`.

pub mod casting;
pub mod error;
pub mod generation;
pub mod mapping;
pub mod output;
pub mod projection;
pub mod types;

pub use error::{CastError, ProjectionError, ProjectionResult, SinkError};
