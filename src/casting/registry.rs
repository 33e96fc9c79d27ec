//! Type descriptor registry.
//!
//! Maps the kind names used in mapping definitions to [`TypeKind`]s and validates their options
//! into a structured [`DataType`]. A registry is built once and passed by reference to the
//! [`super::ValueCaster`] and the schema deriver; there is no process-wide lookup table.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::error::CastError;
use crate::types::{DataType, TypeKind};

/// Option map attached to a field mapping (`precision`, `scale`, `split`, ...).
pub type TypeOptions = serde_json::Map<String, JsonValue>;

/// Kind assumed when a mapping does not name one.
pub const DEFAULT_KIND: &str = "string";

const SPLIT_OPTION_KEYS: [&str; 2] = ["split", "split-delimiter"];

/// Largest decimal precision that can be cast exactly.
pub const MAX_DECIMAL_PRECISION: u8 = 28;

/// Registry of supported kind names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    kinds: BTreeMap<String, TypeKind>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeRegistry {
    /// A registry with no kinds; every lookup fails with [`CastError::UnsupportedType`].
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Every [`TypeKind`] under its canonical name, plus `decimal128` for `decimal`.
    pub fn standard() -> Self {
        TypeKind::ALL
            .iter()
            .fold(Self::empty(), |registry, &kind| registry.with_kind(kind))
            .with_alias("decimal128", TypeKind::Decimal)
    }

    /// Register a kind under its canonical name.
    pub fn with_kind(self, kind: TypeKind) -> Self {
        self.with_alias(kind.name(), kind)
    }

    /// Register an additional name for a kind.
    pub fn with_alias(mut self, name: impl Into<String>, kind: TypeKind) -> Self {
        self.kinds.insert(name.into(), kind);
        self
    }

    /// Look up a kind by name.
    pub fn lookup(&self, name: &str) -> Option<TypeKind> {
        self.kinds.get(name).copied()
    }

    /// Returns `true` if any registered name maps to `kind`.
    pub fn supports(&self, kind: TypeKind) -> bool {
        self.kinds.values().any(|&k| k == kind)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Resolve a kind name (default [`DEFAULT_KIND`]) and its options into a descriptor.
    pub fn resolve(&self, kind: Option<&str>, options: &TypeOptions) -> Result<DataType, CastError> {
        let name = kind.unwrap_or(DEFAULT_KIND);
        let kind = self.lookup(name).ok_or_else(|| CastError::UnsupportedType {
            kind: name.to_string(),
        })?;

        match kind {
            TypeKind::Decimal => decimal_from_options(name, options),
            TypeKind::List => list_from_options(name, options),
            TypeKind::String => plain(name, options, DataType::String),
            TypeKind::Boolean => plain(name, options, DataType::Boolean),
            TypeKind::Int8 => plain(name, options, DataType::Int8),
            TypeKind::Int16 => plain(name, options, DataType::Int16),
            TypeKind::Int32 => plain(name, options, DataType::Int32),
            TypeKind::Int64 => plain(name, options, DataType::Int64),
            TypeKind::UInt8 => plain(name, options, DataType::UInt8),
            TypeKind::UInt16 => plain(name, options, DataType::UInt16),
            TypeKind::UInt32 => plain(name, options, DataType::UInt32),
            TypeKind::UInt64 => plain(name, options, DataType::UInt64),
            TypeKind::Date32 => plain(name, options, DataType::Date32),
        }
    }
}

fn plain(name: &str, options: &TypeOptions, data_type: DataType) -> Result<DataType, CastError> {
    match options.keys().next() {
        Some(key) => Err(invalid_options(name, format!("takes no options (got '{key}')"))),
        None => Ok(data_type),
    }
}

fn invalid_options(kind: &str, message: impl Into<String>) -> CastError {
    CastError::InvalidOptions {
        kind: kind.to_string(),
        message: message.into(),
    }
}

fn decimal_from_options(name: &str, options: &TypeOptions) -> Result<DataType, CastError> {
    if let Some(key) = options.keys().find(|k| !matches!(k.as_str(), "precision" | "scale")) {
        return Err(invalid_options(name, format!("unknown option '{key}'")));
    }

    let precision = small_uint_option(name, options, "precision")?;
    let scale = small_uint_option(name, options, "scale")?;
    if precision == 0 || precision > MAX_DECIMAL_PRECISION {
        return Err(invalid_options(
            name,
            format!("precision must be between 1 and {MAX_DECIMAL_PRECISION} (got {precision})"),
        ));
    }
    if scale > precision {
        return Err(invalid_options(
            name,
            format!("scale ({scale}) cannot exceed precision ({precision})"),
        ));
    }

    Ok(DataType::Decimal { precision, scale })
}

fn small_uint_option(name: &str, options: &TypeOptions, key: &str) -> Result<u8, CastError> {
    let value = options
        .get(key)
        .ok_or_else(|| invalid_options(name, format!("missing required option '{key}'")))?;
    value
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| invalid_options(name, format!("option '{key}' must be a small unsigned integer (got {value})")))
}

fn list_from_options(name: &str, options: &TypeOptions) -> Result<DataType, CastError> {
    if let Some(key) = options.keys().find(|k| !SPLIT_OPTION_KEYS.contains(&k.as_str())) {
        return Err(invalid_options(name, format!("unknown option '{key}'")));
    }
    if options.len() > 1 {
        return Err(invalid_options(name, "give either 'split' or 'split-delimiter', not both"));
    }

    let delimiter = SPLIT_OPTION_KEYS
        .iter()
        .find_map(|key| options.get(*key))
        .ok_or_else(|| invalid_options(name, "missing required option 'split'"))?;
    match delimiter.as_str() {
        Some(d) if !d.is_empty() => Ok(DataType::List {
            delimiter: d.to_string(),
        }),
        _ => Err(invalid_options(
            name,
            format!("split delimiter must be a non-empty string (got {delimiter})"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn opts(v: JsonValue) -> TypeOptions {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn missing_kind_defaults_to_string() {
        let registry = TypeRegistry::standard();
        assert_eq!(registry.resolve(None, &TypeOptions::new()), Ok(DataType::String));
    }

    #[test]
    fn resolves_every_canonical_name() {
        let registry = TypeRegistry::standard();
        for kind in TypeKind::ALL {
            assert_eq!(registry.lookup(kind.name()), Some(kind));
        }
        assert_eq!(registry.lookup("decimal128"), Some(TypeKind::Decimal));
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = TypeRegistry::standard()
            .resolve(Some("float128"), &TypeOptions::new())
            .unwrap_err();
        assert_eq!(
            err,
            CastError::UnsupportedType {
                kind: "float128".to_string()
            }
        );
    }

    #[test]
    fn restricted_registry_rejects_unregistered_kinds() {
        let registry = TypeRegistry::empty().with_kind(TypeKind::String);
        assert!(registry.supports(TypeKind::String));
        assert!(!registry.supports(TypeKind::Int32));
        assert!(matches!(
            registry.resolve(Some("int32"), &TypeOptions::new()),
            Err(CastError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn decimal_requires_precision_and_scale() {
        let registry = TypeRegistry::standard();
        assert_eq!(
            registry.resolve(Some("decimal"), &opts(json!({"precision": 5, "scale": 2}))),
            Ok(DataType::Decimal { precision: 5, scale: 2 })
        );
        assert!(matches!(
            registry.resolve(Some("decimal"), &opts(json!({"precision": 5}))),
            Err(CastError::InvalidOptions { .. })
        ));
        assert!(matches!(
            registry.resolve(Some("decimal"), &opts(json!({"precision": 2, "scale": 3}))),
            Err(CastError::InvalidOptions { .. })
        ));
        assert!(matches!(
            registry.resolve(Some("decimal"), &opts(json!({"precision": 40, "scale": 3}))),
            Err(CastError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn list_accepts_either_split_key() {
        let registry = TypeRegistry::standard();
        let expected = DataType::List {
            delimiter: ",".to_string(),
        };
        assert_eq!(
            registry.resolve(Some("list"), &opts(json!({"split": ","}))),
            Ok(expected.clone())
        );
        assert_eq!(
            registry.resolve(Some("list"), &opts(json!({"split-delimiter": ","}))),
            Ok(expected)
        );
        assert!(registry.resolve(Some("list"), &opts(json!({"split": ""}))).is_err());
        assert!(registry.resolve(Some("list"), &TypeOptions::new()).is_err());
    }

    #[test]
    fn options_on_plain_kinds_are_rejected() {
        let err = TypeRegistry::standard()
            .resolve(Some("int32"), &opts(json!({"bit-width": 32})))
            .unwrap_err();
        assert!(err.to_string().contains("takes no options"));
    }
}
