//! Schema derivation from mapping metadata.
//!
//! Walks every mapping instance of a table in declaration order and builds, per entity class:
//!
//! - a typed [`Schema`] (field name, case preserved -> [`crate::types::DataType`]), and
//! - a [`RawColumnSet`] of case-folded raw-text column names.
//!
//! Several instances may feed one class (e.g. one worksheet each). They must agree on every
//! field they share; a differing descriptor is a [`ProjectionError::ConflictingSchema`].

use crate::casting::TypeRegistry;
use crate::error::{ProjectionError, ProjectionResult};
use crate::types::{ClassName, Field, RawColumnSet, Schema};

use super::config::{MappingInstance, TableMapping};

/// Typed schema and raw column set of one entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSchema {
    /// The entity class.
    pub class: ClassName,
    /// Typed fields in first-definition order.
    pub schema: Schema,
    /// Raw-text columns in first-seen order.
    pub raw_columns: RawColumnSet,
}

impl ClassSchema {
    fn new(class: ClassName) -> Self {
        Self {
            class,
            schema: Schema::default(),
            raw_columns: RawColumnSet::new(),
        }
    }
}

/// Every class schema derived for one extraction table, in first-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    classes: Vec<ClassSchema>,
}

impl SchemaSet {
    /// Returns the schema of `class`, if declared.
    pub fn get(&self, class: &ClassName) -> Option<&ClassSchema> {
        self.classes.iter().find(|c| &c.class == class)
    }

    /// Index of `class` in declaration order.
    pub fn position(&self, class: &ClassName) -> Option<usize> {
        self.classes.iter().position(|c| &c.class == class)
    }

    /// Index and schema of `class`, if declared.
    pub fn lookup(&self, class: &ClassName) -> Option<(usize, &ClassSchema)> {
        self.classes.iter().enumerate().find(|(_, c)| &c.class == class)
    }

    /// Iterate class schemas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassSchema> {
        self.classes.iter()
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` when no class is declared.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn entry(&mut self, class: ClassName) -> &mut ClassSchema {
        let idx = match self.position(&class) {
            Some(idx) => idx,
            None => {
                self.classes.push(ClassSchema::new(class));
                self.classes.len() - 1
            }
        };
        &mut self.classes[idx]
    }
}

/// Derives [`SchemaSet`]s, resolving declared kinds through a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct SchemaDeriver<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> SchemaDeriver<'r> {
    /// Create a deriver bound to `registry`.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Derive the class schemas of `table`.
    ///
    /// Fails on the first unsupported kind, invalid options or conflicting redefinition.
    pub fn derive(&self, table: &TableMapping) -> ProjectionResult<SchemaSet> {
        let mut set = SchemaSet::default();
        for instance in &table.instances {
            self.derive_instance(instance, set.entry(instance.class_name()))?;
        }
        Ok(set)
    }

    fn derive_instance(&self, instance: &MappingInstance, target: &mut ClassSchema) -> ProjectionResult<()> {
        for column in &instance.columns {
            if let Some(raw_name) = column.rawtext_column_name() {
                target.raw_columns.insert(raw_name);
            }

            for mapping in &column.mappings {
                let Some(field) = mapping.target_field() else {
                    continue;
                };
                let data_type = self
                    .registry
                    .resolve(mapping.kind.as_deref(), &mapping.options)
                    .map_err(|e| ProjectionError::from_resolve(&target.class, field, e))?;

                match target.schema.field(field) {
                    Some(existing) if existing.data_type == data_type => {}
                    Some(existing) => {
                        return Err(ProjectionError::ConflictingSchema {
                            class: target.class.clone(),
                            field: field.to_string(),
                            existing: existing.data_type.clone(),
                            incoming: data_type,
                        });
                    }
                    None => target.schema.fields.push(Field::new(field, data_type)),
                }
            }
        }
        Ok(())
    }
}

/// Derive the class schemas of `table` with `registry`.
pub fn derive_schemas(registry: &TypeRegistry, table: &TableMapping) -> ProjectionResult<SchemaSet> {
    SchemaDeriver::new(registry).derive(table)
}
