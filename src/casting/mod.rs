//! Type descriptors and value casting.
//!
//! - [`TypeRegistry`]: supported kind names and option validation
//! - [`ValueCaster`]: casts transformed values into typed [`crate::types::Value`]s
//!
//! ```rust
//! use columnar_projection::casting::{TypeRegistry, TypeOptions, ValueCaster};
//! use columnar_projection::types::Value;
//! use serde_json::json;
//!
//! let registry = TypeRegistry::standard();
//! let options: TypeOptions = json!({"split": ","}).as_object().cloned().unwrap();
//! let codes = registry.resolve(Some("list"), &options).unwrap();
//!
//! let caster = ValueCaster::new(&registry);
//! assert_eq!(
//!     caster.cast(Some(&json!("14a,14b,14c")), &codes).unwrap(),
//!     Value::List(vec!["14a".into(), "14b".into(), "14c".into()])
//! );
//! assert_eq!(caster.cast(Some(&json!("")), &codes).unwrap(), Value::List(vec![]));
//! assert_eq!(caster.cast(None, &codes).unwrap(), Value::Null);
//! ```

pub mod caster;
pub mod registry;

pub use caster::{split_list, stringify, ValueCaster};
pub use registry::{TypeOptions, TypeRegistry, DEFAULT_KIND, MAX_DECIMAL_PRECISION};
