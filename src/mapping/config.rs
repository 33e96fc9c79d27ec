//! Column-mapping definitions and JSON loading.
//!
//! A mapping file holds an array of table mappings (a single table object is accepted too):
//!
//! ```json
//! [
//!   {
//!     "name": "national_collection",
//!     "instances": [
//!       {
//!         "id": "Hash#1",
//!         "columns": [
//!           { "column": "filename" },
//!           { "column": "K1N:N", "mappings": [ { "field": "K1N", "kind": "boolean" } ] },
//!           { "column": "CODES:N", "mappings": [
//!               { "field": "CODES", "kind": "list", "options": { "split": "," } } ] }
//!         ]
//!       }
//!     ]
//!   }
//! ]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::casting::TypeOptions;
use crate::error::ProjectionResult;
use crate::types::ClassName;

/// One mapping entry of a column: the target field plus its declared kind and options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Target field name. Entries without a (non-empty) field are not projected.
    #[serde(default)]
    pub field: Option<String>,
    /// Declared kind; `None` means `string`.
    #[serde(default)]
    pub kind: Option<String>,
    /// Kind options (`precision`, `scale`, `split`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: TypeOptions,
}

impl FieldMapping {
    /// A string-typed mapping to `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Default::default()
        }
    }

    /// Set the declared kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Add a kind option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// The target field, if present and non-empty.
    pub fn target_field(&self) -> Option<&str> {
        self.field.as_deref().filter(|f| !f.is_empty())
    }
}

/// A source column of a mapping instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column display name in the source.
    #[serde(default)]
    pub column: Option<String>,
    /// Explicit raw-text column name; takes precedence over `column`.
    #[serde(default)]
    pub rawtext_name: Option<String>,
    /// Field mappings; empty for raw-only (annotation) columns.
    #[serde(default, deserialize_with = "null_as_default")]
    pub mappings: Vec<FieldMapping>,
}

impl ColumnMapping {
    /// A raw-only column named `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            ..Default::default()
        }
    }

    /// Set an explicit raw-text column name.
    pub fn rawtext_name(mut self, name: impl Into<String>) -> Self {
        self.rawtext_name = Some(name.into());
        self
    }

    /// Add a field mapping.
    pub fn map_to(mut self, mapping: FieldMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Name of the raw-text column this column feeds (case preserved).
    pub fn rawtext_column_name(&self) -> Option<&str> {
        self.rawtext_name.as_deref().or(self.column.as_deref())
    }
}

/// One mapping instance (e.g. one worksheet), targeting a single entity class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingInstance {
    /// Instance id, `<Class>#<suffix>`.
    pub id: String,
    /// Columns in declaration order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<ColumnMapping>,
}

impl MappingInstance {
    /// Create an instance.
    pub fn new(id: impl Into<String>, columns: Vec<ColumnMapping>) -> Self {
        Self {
            id: id.into(),
            columns,
        }
    }

    /// The entity class this instance targets.
    pub fn class_name(&self) -> ClassName {
        ClassName::from_instance_id(&self.id)
    }
}

/// The mapping metadata of one extraction table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    /// Optional table label, used in logs.
    #[serde(default)]
    pub name: Option<String>,
    /// Mapping instances feeding this table.
    #[serde(default, deserialize_with = "null_as_default")]
    pub instances: Vec<MappingInstance>,
}

impl TableMapping {
    /// Create an unnamed table mapping.
    pub fn new(instances: Vec<MappingInstance>) -> Self {
        Self {
            name: None,
            instances,
        }
    }

    /// Set the table label.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse a single table mapping from JSON.
    pub fn from_json_str(input: &str) -> ProjectionResult<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MappingFile {
    Many(Vec<TableMapping>),
    One(TableMapping),
}

/// Parse table mappings from JSON text (an array of tables, or a single table object).
pub fn table_mappings_from_str(input: &str) -> ProjectionResult<Vec<TableMapping>> {
    match serde_json::from_str::<MappingFile>(input) {
        Ok(MappingFile::Many(tables)) => Ok(tables),
        Ok(MappingFile::One(table)) => Ok(vec![table]),
        // Re-parse strictly so the caller gets a positioned error rather than the untagged one.
        Err(_) => Ok(serde_json::from_str::<Vec<TableMapping>>(input)?),
    }
}

/// Load table mappings from a JSON file.
pub fn load_table_mappings(path: impl AsRef<Path>) -> ProjectionResult<Vec<TableMapping>> {
    let text = fs::read_to_string(path)?;
    table_mappings_from_str(&text)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_of_tables() {
        let json = r#"[
          {"name": "t1", "instances": [
            {"id": "Hash#1", "columns": [
              {"column": "filename"},
              {"column": "K1N:N", "mappings": [{"field": "K1N", "kind": "boolean"}]},
              {"column": "X", "rawtext_name": "x_raw", "mappings": null}
            ]}
          ]}
        ]"#;
        let tables = table_mappings_from_str(json).unwrap();
        assert_eq!(tables.len(), 1);
        let instance = &tables[0].instances[0];
        assert_eq!(instance.class_name(), ClassName::new("Hash"));
        assert_eq!(instance.columns[0].rawtext_column_name(), Some("filename"));
        assert_eq!(instance.columns[1].mappings[0].kind.as_deref(), Some("boolean"));
        assert_eq!(instance.columns[2].rawtext_column_name(), Some("x_raw"));
        assert!(instance.columns[2].mappings.is_empty());
    }

    #[test]
    fn accepts_a_single_table_object() {
        let tables =
            table_mappings_from_str(r#"{"instances": [{"id": "Hash#1", "columns": []}]}"#).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, None);
    }

    #[test]
    fn malformed_json_is_a_mapping_error() {
        let err = table_mappings_from_str(r#"[{"instances": "nope"}]"#).unwrap_err();
        assert!(err.to_string().starts_with("mapping definition error"));
    }

    #[test]
    fn empty_field_is_not_a_target() {
        assert_eq!(FieldMapping::default().target_field(), None);
        assert_eq!(FieldMapping::new("").target_field(), None);
        assert_eq!(FieldMapping::new("AGE").target_field(), Some("AGE"));
    }
}
