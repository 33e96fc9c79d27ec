//! Core data model types for projection.
//!
//! Mapping metadata is derived into one typed [`Schema`] (a list of [`Field`]s, each carrying a
//! [`DataType`] descriptor) plus one [`RawColumnSet`] per [`ClassName`]. Transformed records are
//! then cast into rows of typed [`Value`]s that line up positionally with those schemas.

use std::fmt;

use chrono::NaiveDate;
use convert_case::{Case, Casing};
use rust_decimal::Decimal;

/// Separator between the entity class and the instance suffix of a mapping instance id
/// (e.g. `Hash#1`).
pub const INSTANCE_SEPARATOR: char = '#';

/// Logical kind of a type descriptor, without its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// Calendar date (days since the Unix epoch when stored).
    Date32,
    /// Exact fixed-point decimal.
    Decimal,
    /// List of strings split from a delimited input.
    List,
}

impl TypeKind {
    /// Every kind, in declaration order.
    pub const ALL: [TypeKind; 13] = [
        TypeKind::String,
        TypeKind::Boolean,
        TypeKind::Int8,
        TypeKind::Int16,
        TypeKind::Int32,
        TypeKind::Int64,
        TypeKind::UInt8,
        TypeKind::UInt16,
        TypeKind::UInt32,
        TypeKind::UInt64,
        TypeKind::Date32,
        TypeKind::Decimal,
        TypeKind::List,
    ];

    /// Canonical name used in mapping definitions.
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::String => "string",
            TypeKind::Boolean => "boolean",
            TypeKind::Int8 => "int8",
            TypeKind::Int16 => "int16",
            TypeKind::Int32 => "int32",
            TypeKind::Int64 => "int64",
            TypeKind::UInt8 => "uint8",
            TypeKind::UInt16 => "uint16",
            TypeKind::UInt32 => "uint32",
            TypeKind::UInt64 => "uint64",
            TypeKind::Date32 => "date32",
            TypeKind::Decimal => "decimal",
            TypeKind::List => "list",
        }
    }

    /// Returns `true` for the signed and unsigned integer kinds.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TypeKind::Int8
                | TypeKind::Int16
                | TypeKind::Int32
                | TypeKind::Int64
                | TypeKind::UInt8
                | TypeKind::UInt16
                | TypeKind::UInt32
                | TypeKind::UInt64
        )
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type descriptor for a schema field: a [`TypeKind`] plus its structured options.
///
/// Two descriptors are equal iff kind and options are equal, so `Decimal { 3, 1 }` and
/// `Decimal { 4, 1 }` conflict when both are declared for the same field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// Calendar date.
    Date32,
    /// Exact fixed-point decimal with `precision` total digits, `scale` of them fractional.
    Decimal { precision: u8, scale: u8 },
    /// List of strings, split from the stringified input on `delimiter`.
    List { delimiter: String },
}

impl DataType {
    /// The logical kind of this descriptor.
    pub fn kind(&self) -> TypeKind {
        match self {
            DataType::String => TypeKind::String,
            DataType::Boolean => TypeKind::Boolean,
            DataType::Int8 => TypeKind::Int8,
            DataType::Int16 => TypeKind::Int16,
            DataType::Int32 => TypeKind::Int32,
            DataType::Int64 => TypeKind::Int64,
            DataType::UInt8 => TypeKind::UInt8,
            DataType::UInt16 => TypeKind::UInt16,
            DataType::UInt32 => TypeKind::UInt32,
            DataType::UInt64 => TypeKind::UInt64,
            DataType::Date32 => TypeKind::Date32,
            DataType::Decimal { .. } => TypeKind::Decimal,
            DataType::List { .. } => TypeKind::List,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            DataType::List { delimiter } => write!(f, "list(split={delimiter:?})"),
            other => f.write_str(other.kind().name()),
        }
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name, case preserved from the mapping definition.
    pub name: String,
    /// Field type descriptor.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of typed fields for one entity class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields (first-definition order).
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Name of a target entity class (the part of an instance id before [`INSTANCE_SEPARATOR`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName(String);

impl ClassName {
    /// Wrap a class name as-is.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive the class from a mapping instance id such as `Hash#1`.
    ///
    /// Ids without a separator name the class directly.
    pub fn from_instance_id(instance_id: &str) -> Self {
        let class = instance_id
            .split(INSTANCE_SEPARATOR)
            .next()
            .unwrap_or(instance_id);
        Self(class.to_string())
    }

    /// The class name as written in the mapping.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// snake_case form used in artifact names (`CrossSheet` -> `cross_sheet`).
    pub fn artifact_stem(&self) -> String {
        self.0.to_case(Case::Snake)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-fold a raw-text column name.
///
/// Applied once when building a [`RawColumnSet`] and once when indexing a record's raw-text map,
/// so both sides always compare in the same form.
pub fn normalize_raw_column_name(name: &str) -> String {
    name.to_lowercase()
}

/// Ordered, de-duplicated set of case-folded raw-text column names for one entity class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawColumnSet {
    names: Vec<String>,
}

impl RawColumnSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column name (normalized first). Returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let normalized = normalize_raw_column_name(name);
        if self.names.contains(&normalized) {
            return false;
        }
        self.names.push(normalized);
        true
    }

    /// Iterate normalized names in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns `true` if the (normalized) name is in the set.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize_raw_column_name(name))
    }

    /// Number of raw columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` when the set has no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The all-string schema for the raw artifact, in set order.
    pub fn to_schema(&self) -> Schema {
        Schema::new(
            self.names
                .iter()
                .map(|name| Field::new(name.clone(), DataType::String))
                .collect(),
        )
    }
}

/// A single typed value in a projected row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/absent value.
    Null,
    /// UTF-8 string.
    Utf8(String),
    /// Boolean.
    Bool(bool),
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 8-bit unsigned integer.
    UInt8(u8),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// Calendar date.
    Date32(NaiveDate),
    /// Fixed-point decimal, already rescaled to the field's scale.
    Decimal(Decimal),
    /// List of strings. Empty is distinct from [`Value::Null`].
    List(Vec<String>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A typed row, positionally aligned with its class [`Schema`].
pub type TypedRow = Vec<Value>;

/// A raw-text row, positionally aligned with its class [`RawColumnSet`].
pub type RawRow = Vec<Option<String>>;
