//! Mapping metadata: definitions loaded from configuration and the schemas derived from them.
//!
//! - [`config`]: table/instance/column/field mapping types and JSON loading
//! - [`derive`]: per-class typed schema + raw column set derivation

pub mod config;
pub mod derive;

pub use config::{
    load_table_mappings, table_mappings_from_str, ColumnMapping, FieldMapping, MappingInstance, TableMapping,
};
pub use derive::{derive_schemas, ClassSchema, SchemaDeriver, SchemaSet};
