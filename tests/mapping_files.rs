use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use columnar_projection::casting::TypeRegistry;
use columnar_projection::mapping::{derive_schemas, load_table_mappings};
use columnar_projection::types::{ClassName, DataType};
use columnar_projection::ProjectionError;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("columnar-projection-{name}-{nanos}.json"))
}

const NATIONAL_COLLECTION: &str = r#"[
  {
    "name": "national_collection",
    "instances": [
      {
        "id": "Hash#1",
        "columns": [
          { "column": "filename" },
          { "column": "K1N:N", "mappings": [ { "field": "K1N", "kind": "boolean" } ] },
          { "column": "Age:N", "rawtext_name": "AGE_RAW", "mappings": [ { "field": "AGE", "kind": "int32" } ] },
          { "column": "CODES:N", "mappings": [
              { "field": "CODES", "kind": "list", "options": { "split-delimiter": "," } } ] },
          { "column": "COST", "mappings": [
              { "field": "COST", "kind": "decimal", "options": { "precision": 10, "scale": 2 } } ] },
          { "column": "Notes", "mappings": [ { "field": "NOTES" } ] }
        ]
      }
    ]
  }
]"#;

#[test]
fn loads_mapping_file_and_derives_schemas() {
    let path = tmp_file("mapping");
    fs::write(&path, NATIONAL_COLLECTION).unwrap();

    let tables = load_table_mappings(&path).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name.as_deref(), Some("national_collection"));

    let schemas = derive_schemas(&TypeRegistry::standard(), &tables[0]).unwrap();
    let hash = schemas.get(&ClassName::new("Hash")).unwrap();
    let fields: Vec<_> = hash
        .schema
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.data_type.clone()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("K1N", DataType::Boolean),
            ("AGE", DataType::Int32),
            (
                "CODES",
                DataType::List {
                    delimiter: ",".to_string()
                }
            ),
            (
                "COST",
                DataType::Decimal {
                    precision: 10,
                    scale: 2
                }
            ),
            ("NOTES", DataType::String),
        ]
    );
    assert_eq!(
        hash.raw_columns.iter().collect::<Vec<_>>(),
        vec!["filename", "k1n:n", "age_raw", "codes:n", "cost", "notes"]
    );

    fs::remove_file(&path).ok();
}

#[test]
fn missing_mapping_file_is_an_io_error() {
    let err = load_table_mappings(tmp_file("does-not-exist")).unwrap_err();
    assert!(matches!(err, ProjectionError::Io(_)));
}

#[test]
fn unknown_option_keys_are_rejected_at_derivation() {
    let json = r#"[{"instances": [{"id": "Hash#1", "columns": [
        {"column": "CODES", "mappings": [{"field": "CODES", "kind": "list", "options": {"sep": ","}}]}
    ]}]}]"#;
    let path = tmp_file("bad-options");
    fs::write(&path, json).unwrap();

    let tables = load_table_mappings(&path).unwrap();
    let err = derive_schemas(&TypeRegistry::standard(), &tables[0]).unwrap_err();
    match err {
        ProjectionError::InvalidOptions { class, field, .. } => {
            assert_eq!(class.as_str(), "Hash");
            assert_eq!(field, "CODES");
        }
        other => panic!("expected InvalidOptions, got {other:?}"),
    }

    fs::remove_file(&path).ok();
}

#[test]
fn restricted_registry_rejects_unlisted_kinds() {
    let tables = columnar_projection::mapping::table_mappings_from_str(NATIONAL_COLLECTION).unwrap();
    let registry = TypeRegistry::empty()
        .with_kind(columnar_projection::types::TypeKind::String)
        .with_kind(columnar_projection::types::TypeKind::Boolean);

    let err = derive_schemas(&registry, &tables[0]).unwrap_err();
    assert!(
        matches!(err, ProjectionError::UnsupportedType { ref field, ref kind, .. } if field == "AGE" && kind == "int32"),
        "{err}"
    );
}
