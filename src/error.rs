use thiserror::Error;

use crate::types::{ClassName, DataType, TypeKind};

/// Convenience result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Error returned by the value caster and the type registry.
///
/// Carries no class/field context; the schema deriver and row partitioner attach it when
/// converting into [`ProjectionError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    /// The kind is not registered in the [`crate::casting::TypeRegistry`].
    #[error("unsupported type '{kind}'")]
    UnsupportedType { kind: String },

    /// The options given for a kind are missing, unknown or malformed.
    #[error("invalid options for '{kind}': {message}")]
    InvalidOptions { kind: String, message: String },

    /// A present value could not be cast to its declared kind.
    #[error("cannot cast '{raw}' to {kind}: {message}")]
    InvalidValue {
        kind: TypeKind,
        raw: String,
        message: String,
    },
}

/// Error returned by a [`crate::output::ColumnarSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// Underlying I/O error (e.g. output directory missing, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "parquet")]
    /// Parquet encoding/writing error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[cfg(feature = "parquet")]
    /// Arrow array/schema construction error.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// The sink refused the batch (e.g. a value does not match its column type).
    #[error("rejected: {message}")]
    Rejected { message: String },
}

/// Error type returned by schema derivation, projection and generation.
///
/// Every variant is fatal for the current run; there is no skip-and-continue mode.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Underlying I/O error (e.g. mapping file not found).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Mapping definitions are not valid JSON or do not match the expected shape.
    #[error("mapping definition error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mapping references a kind absent from the type registry.
    #[error("unsupported type '{kind}' for field '{field}' of class '{class}'")]
    UnsupportedType {
        class: ClassName,
        field: String,
        kind: String,
    },

    /// A mapping carries options its kind does not accept (or lacks required ones).
    #[error("invalid type options for field '{field}' of class '{class}': {message}")]
    InvalidOptions {
        class: ClassName,
        field: String,
        message: String,
    },

    /// Two mapping instances define the same (class, field) with different descriptors.
    #[error(
        "conflicting type definition for field '{field}' of class '{class}': {existing} vs {incoming}"
    )]
    ConflictingSchema {
        class: ClassName,
        field: String,
        existing: DataType,
        incoming: DataType,
    },

    /// A present value could not be cast to its declared kind.
    #[error(
        "failed to cast value at row {row} field '{field}' of class '{class}': {message} (raw='{raw}')"
    )]
    InvalidValue {
        class: ClassName,
        field: String,
        row: usize,
        raw: String,
        message: String,
    },

    /// A record was attributed to a class no mapping instance declares.
    #[error("record at row {row} belongs to unknown class '{class}'")]
    UnknownClass { class: ClassName, row: usize },

    /// Two tables in one run would write the same artifact.
    #[error("artifact '{artifact}' was already written in this run")]
    DuplicateArtifact { artifact: String },

    /// The upstream extraction/transform stream failed.
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// The columnar sink could not persist an artifact.
    #[error("sink failed to write '{artifact}': {source}")]
    Sink {
        artifact: String,
        #[source]
        source: SinkError,
    },
}

impl ProjectionError {
    /// Attach class/field context to a registry error raised while resolving a mapping.
    pub(crate) fn from_resolve(class: &ClassName, field: &str, err: CastError) -> Self {
        match err {
            CastError::UnsupportedType { kind } => ProjectionError::UnsupportedType {
                class: class.clone(),
                field: field.to_string(),
                kind,
            },
            CastError::InvalidOptions { kind, message } => ProjectionError::InvalidOptions {
                class: class.clone(),
                field: field.to_string(),
                message: format!("{kind}: {message}"),
            },
            CastError::InvalidValue { raw, message, .. } => ProjectionError::InvalidOptions {
                class: class.clone(),
                field: field.to_string(),
                message: format!("{message} (raw='{raw}')"),
            },
        }
    }

    /// Attach class/field/row context to a cast failure.
    pub(crate) fn from_cast(class: &ClassName, field: &str, row: usize, err: CastError) -> Self {
        match err {
            CastError::InvalidValue { raw, message, kind } => ProjectionError::InvalidValue {
                class: class.clone(),
                field: field.to_string(),
                row,
                raw,
                message: format!("expected {kind}: {message}"),
            },
            CastError::UnsupportedType { kind } => ProjectionError::UnsupportedType {
                class: class.clone(),
                field: field.to_string(),
                kind,
            },
            CastError::InvalidOptions { kind, message } => ProjectionError::InvalidOptions {
                class: class.clone(),
                field: field.to_string(),
                message: format!("{kind}: {message}"),
            },
        }
    }
}
