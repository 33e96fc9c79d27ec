//! Parquet sink implementation.
//!
//! Column batches are converted to Arrow arrays and written with the Parquet `ArrowWriter`,
//! one file per artifact: `<output dir>/<artifact name>.parquet`.
//!
//! Type mapping:
//!
//! | descriptor | Arrow type |
//! |---|---|
//! | `string` | `Utf8` |
//! | `boolean` | `Boolean` |
//! | `int8` .. `uint64` | `Int8` .. `UInt64` |
//! | `date32` | `Date32` |
//! | `decimal(p,s)` | `Decimal128(p, s)` |
//! | `list` | `List<Utf8>` |

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Date32Builder, Decimal128Builder, Int16Builder, Int32Builder, Int64Builder,
    Int8Builder, ListBuilder, StringBuilder, UInt16Builder, UInt32Builder, UInt64Builder, UInt8Builder,
};
use arrow::datatypes::{Field as ArrowField, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::SinkError;
use crate::types::{DataType, Field, Value};

use super::sink::{ArtifactName, ColumnBatch, ColumnarSink, WrittenArtifact};

/// Writes each artifact as a Parquet file under an output directory.
#[derive(Debug, Clone)]
pub struct ParquetSink {
    output_dir: PathBuf,
    compression: Compression,
}

impl ParquetSink {
    /// Write artifacts into `output_dir` (created on first write if missing).
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            compression: Compression::SNAPPY,
        }
    }

    /// Override the column compression codec (default SNAPPY).
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File path an artifact is written to.
    pub fn path_for(&self, artifact: &ArtifactName) -> PathBuf {
        self.output_dir.join(format!("{artifact}.parquet"))
    }
}

impl ColumnarSink for ParquetSink {
    fn write(&mut self, artifact: &ArtifactName, batch: &ColumnBatch) -> Result<WrittenArtifact, SinkError> {
        if batch.schema.is_empty() {
            return Err(SinkError::Rejected {
                message: "parquet files need at least one column".to_string(),
            });
        }

        let arrays = batch
            .schema
            .fields
            .iter()
            .zip(&batch.columns)
            .map(|(field, values)| build_array(field, values))
            .collect::<Result<Vec<ArrayRef>, SinkError>>()?;

        let arrow_fields: Vec<ArrowField> = batch
            .schema
            .fields
            .iter()
            .zip(&arrays)
            .map(|(field, array)| ArrowField::new(field.name.as_str(), array.data_type().clone(), true))
            .collect();
        let schema = Arc::new(ArrowSchema::new(arrow_fields));
        let record_batch = RecordBatch::try_new(Arc::clone(&schema), arrays)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(artifact);
        let file = File::create(&path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&record_batch)?;
        writer.close()?;

        Ok(WrittenArtifact {
            location: path,
            row_count: batch.row_count(),
        })
    }
}

fn mismatch(field: &Field, value: &Value) -> SinkError {
    SinkError::Rejected {
        message: format!(
            "column '{}' is {} but got {value:?}",
            field.name, field.data_type
        ),
    }
}

macro_rules! primitive_array {
    ($builder:ty, $variant:ident, $field:expr, $values:expr) => {{
        let mut builder = <$builder>::with_capacity($values.len());
        for value in $values {
            match value {
                Value::$variant(v) => builder.append_value(*v),
                Value::Null => builder.append_null(),
                other => return Err(mismatch($field, other)),
            }
        }
        Arc::new(builder.finish()) as ArrayRef
    }};
}

fn build_array(field: &Field, values: &[Value]) -> Result<ArrayRef, SinkError> {
    let array = match &field.data_type {
        DataType::String => {
            let mut builder = StringBuilder::new();
            for value in values {
                match value {
                    Value::Utf8(s) => builder.append_value(s),
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch(field, other)),
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }
        DataType::Boolean => primitive_array!(BooleanBuilder, Bool, field, values),
        DataType::Int8 => primitive_array!(Int8Builder, Int8, field, values),
        DataType::Int16 => primitive_array!(Int16Builder, Int16, field, values),
        DataType::Int32 => primitive_array!(Int32Builder, Int32, field, values),
        DataType::Int64 => primitive_array!(Int64Builder, Int64, field, values),
        DataType::UInt8 => primitive_array!(UInt8Builder, UInt8, field, values),
        DataType::UInt16 => primitive_array!(UInt16Builder, UInt16, field, values),
        DataType::UInt32 => primitive_array!(UInt32Builder, UInt32, field, values),
        DataType::UInt64 => primitive_array!(UInt64Builder, UInt64, field, values),
        DataType::Date32 => {
            let mut builder = Date32Builder::with_capacity(values.len());
            for value in values {
                match value {
                    Value::Date32(date) => builder.append_value(days_since_epoch(field, date)?),
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch(field, other)),
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }
        DataType::Decimal { precision, scale } => {
            // Scale is capped well below i8::MAX by the registry.
            let arrow_scale = *scale as i8;
            let mut builder = Decimal128Builder::with_capacity(values.len())
                .with_precision_and_scale(*precision, arrow_scale)?;
            for value in values {
                match value {
                    Value::Decimal(d) => {
                        let mut fixed = *d;
                        fixed.rescale(u32::from(*scale));
                        if fixed.scale() != u32::from(*scale) {
                            return Err(SinkError::Rejected {
                                message: format!(
                                    "value {d} in column '{}' does not fit {}",
                                    field.name, field.data_type
                                ),
                            });
                        }
                        builder.append_value(fixed.mantissa());
                    }
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch(field, other)),
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }
        DataType::List { .. } => {
            let mut builder = ListBuilder::new(StringBuilder::new());
            for value in values {
                match value {
                    Value::List(items) => {
                        for item in items {
                            builder.values().append_value(item);
                        }
                        builder.append(true);
                    }
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch(field, other)),
                }
            }
            Arc::new(builder.finish()) as ArrayRef
        }
    };
    Ok(array)
}

fn days_since_epoch(field: &Field, date: &NaiveDate) -> Result<i32, SinkError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(|| SinkError::Rejected {
        message: "invalid epoch".to_string(),
    })?;
    let days = date.signed_duration_since(epoch).num_days();
    i32::try_from(days).map_err(|_| SinkError::Rejected {
        message: format!("date {date} in column '{}' is outside the date32 range", field.name),
    })
}
