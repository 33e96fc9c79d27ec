//! Record streams and their projection into per-class typed/raw row buffers.
//!
//! - [`record`]: transformed records, extraction tables and the [`ExtractionSource`] trait
//! - [`partition`]: the [`RowPartitioner`] that casts and groups records by entity class

pub mod partition;
pub mod record;

pub use partition::{ClassBuffer, ClassOutput, RowPartitioner};
pub use record::{
    ExtractedTable, ExtractionSource, FieldValues, MemorySource, TransformedRecord, RAWTEXT_KEY,
};
