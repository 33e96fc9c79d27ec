//! Value casting: `(raw value, type descriptor) -> typed value`.
//!
//! Rules:
//!
//! - An absent value or JSON `null` always casts to [`Value::Null`], whatever the kind.
//! - `list` casts the empty string to an empty list (not `Null`); `decimal` casts it to `Null`.
//! - Anything present but malformed fails with [`CastError::InvalidValue`].

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;

use crate::error::CastError;
use crate::types::{DataType, TypeKind, Value};

use super::registry::TypeRegistry;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Casts transformed field values according to descriptors supported by a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct ValueCaster<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> ValueCaster<'r> {
    /// Create a caster bound to `registry`.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// The registry this caster checks descriptors against.
    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Cast `value` to `data_type`.
    ///
    /// Pure and deterministic. Fails with [`CastError::UnsupportedType`] only for a present value
    /// whose kind is not registered.
    pub fn cast(&self, value: Option<&JsonValue>, data_type: &DataType) -> Result<Value, CastError> {
        let value = match value {
            None | Some(JsonValue::Null) => return Ok(Value::Null),
            Some(v) => v,
        };

        let kind = data_type.kind();
        if !self.registry.supports(kind) {
            return Err(CastError::UnsupportedType {
                kind: kind.name().to_string(),
            });
        }

        match data_type {
            DataType::String => Ok(Value::Utf8(stringify(value))),
            DataType::Boolean => cast_bool(value),
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => cast_integer(value, kind),
            DataType::Date32 => cast_date(value),
            DataType::Decimal { precision, scale } => cast_decimal(value, *precision, *scale),
            DataType::List { delimiter } => Ok(Value::List(split_list(&stringify(value), delimiter))),
        }
    }
}

/// Verbatim textual form of a present JSON value.
///
/// Strings are returned unquoted; numbers and booleans use their literal form; arrays and
/// objects are rendered as JSON text.
pub fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Null => String::new(),
        compound => compound.to_string(),
    }
}

fn invalid(kind: TypeKind, value: &JsonValue, message: impl Into<String>) -> CastError {
    CastError::InvalidValue {
        kind,
        raw: stringify(value),
        message: message.into(),
    }
}

fn cast_bool(value: &JsonValue) -> Result<Value, CastError> {
    let parsed = match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(Value::Bool)
        .ok_or_else(|| invalid(TypeKind::Boolean, value, "expected bool (true/false/1/0)"))
}

fn cast_integer(value: &JsonValue, kind: TypeKind) -> Result<Value, CastError> {
    let wide: i128 = match value {
        JsonValue::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|e| invalid(kind, value, e.to_string()))?,
        JsonValue::Number(n) => {
            if let Some(v) = n.as_i64() {
                i128::from(v)
            } else if let Some(v) = n.as_u64() {
                i128::from(v)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e19 => f as i128,
                    _ => return Err(invalid(kind, value, "expected an integral number")),
                }
            }
        }
        _ => return Err(invalid(kind, value, "expected integer")),
    };

    narrow_integer(kind, wide).ok_or_else(|| invalid(kind, value, format!("out of range for {kind}")))
}

fn narrow_integer(kind: TypeKind, n: i128) -> Option<Value> {
    match kind {
        TypeKind::Int8 => i8::try_from(n).ok().map(Value::Int8),
        TypeKind::Int16 => i16::try_from(n).ok().map(Value::Int16),
        TypeKind::Int32 => i32::try_from(n).ok().map(Value::Int32),
        TypeKind::Int64 => i64::try_from(n).ok().map(Value::Int64),
        TypeKind::UInt8 => u8::try_from(n).ok().map(Value::UInt8),
        TypeKind::UInt16 => u16::try_from(n).ok().map(Value::UInt16),
        TypeKind::UInt32 => u32::try_from(n).ok().map(Value::UInt32),
        TypeKind::UInt64 => u64::try_from(n).ok().map(Value::UInt64),
        _ => None,
    }
}

fn cast_date(value: &JsonValue) -> Result<Value, CastError> {
    let JsonValue::String(s) = value else {
        return Err(invalid(TypeKind::Date32, value, "expected a date string"));
    };
    let text = s.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .map(Value::Date32)
        .ok_or_else(|| {
            invalid(
                TypeKind::Date32,
                value,
                "unrecognized date format (expected YYYY-MM-DD, MM/DD/YYYY or YYYYMMDD)",
            )
        })
}

fn cast_decimal(value: &JsonValue, precision: u8, scale: u8) -> Result<Value, CastError> {
    let text = match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        _ => return Err(invalid(TypeKind::Decimal, value, "expected a decimal number")),
    };
    if text.is_empty() {
        return Ok(Value::Null);
    }

    let parsed = Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_str(&text))
        .map_err(|e| invalid(TypeKind::Decimal, value, e.to_string()))?;

    let mut fixed =
        parsed.round_dp_with_strategy(u32::from(scale), RoundingStrategy::MidpointAwayFromZero);
    fixed.rescale(u32::from(scale));
    // rescale falls back to a smaller scale when the value does not fit at the requested one.
    if fixed.scale() != u32::from(scale) {
        return Err(invalid(
            TypeKind::Decimal,
            value,
            format!("cannot be represented at scale {scale} with precision {precision}"),
        ));
    }

    let digits = fixed
        .mantissa()
        .unsigned_abs()
        .checked_ilog10()
        .map_or(1, |d| d + 1);
    if digits > u32::from(precision) {
        return Err(invalid(
            TypeKind::Decimal,
            value,
            format!("needs {digits} digits at scale {scale}, precision is {precision}"),
        ));
    }

    Ok(Value::Decimal(fixed))
}

/// Split `text` on `delimiter`, dropping trailing empty segments.
///
/// The empty string yields an empty list; inner empty segments are kept (`"a;;b"` gives three
/// items).
pub fn split_list(text: &str, delimiter: &str) -> Vec<String> {
    let mut parts: Vec<String> = text.split(delimiter).map(str::to_string).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cast(value: JsonValue, data_type: &DataType) -> Result<Value, CastError> {
        let registry = TypeRegistry::standard();
        ValueCaster::new(&registry).cast(Some(&value), data_type)
    }

    fn list(delimiter: &str) -> DataType {
        DataType::List {
            delimiter: delimiter.to_string(),
        }
    }

    #[test]
    fn casting_to_int32() {
        assert_eq!(cast(json!("12"), &DataType::Int32), Ok(Value::Int32(12)));
        assert_eq!(cast(json!(13), &DataType::Int32), Ok(Value::Int32(13)));
        assert_eq!(cast(json!(" 7 "), &DataType::Int32), Ok(Value::Int32(7)));
        assert_eq!(cast(json!(14.0), &DataType::Int32), Ok(Value::Int32(14)));
        assert!(cast(json!("12a"), &DataType::Int32).is_err());
        assert!(cast(json!(1.5), &DataType::Int32).is_err());
        assert!(cast(json!(""), &DataType::Int32).is_err());
        assert!(cast(json!("13.0"), &DataType::Int32).is_err());
    }

    #[test]
    fn integer_range_follows_bit_width() {
        assert_eq!(cast(json!("127"), &DataType::Int8), Ok(Value::Int8(127)));
        assert!(cast(json!("128"), &DataType::Int8).is_err());
        assert!(cast(json!("-1"), &DataType::UInt16).is_err());
        assert_eq!(
            cast(json!("18446744073709551615"), &DataType::UInt64),
            Ok(Value::UInt64(u64::MAX))
        );
        assert!(cast(json!("2147483648"), &DataType::Int32).is_err());

        let err = cast(json!("300"), &DataType::UInt8).unwrap_err();
        assert!(err.to_string().contains("out of range for uint8"));
    }

    #[test]
    fn casting_to_boolean() {
        for v in [json!("1"), json!("true"), json!(1), json!(true), json!("TRUE")] {
            assert_eq!(cast(v, &DataType::Boolean), Ok(Value::Bool(true)));
        }
        for v in [json!("0"), json!("false"), json!(0), json!(false)] {
            assert_eq!(cast(v, &DataType::Boolean), Ok(Value::Bool(false)));
        }
        assert!(matches!(
            cast(json!("maybe"), &DataType::Boolean),
            Err(CastError::InvalidValue { kind: TypeKind::Boolean, .. })
        ));
        assert!(cast(json!(2), &DataType::Boolean).is_err());
    }

    #[test]
    fn casting_to_date32() {
        let ymd = |y, m, d| Value::Date32(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(cast(json!("2021-04-28"), &DataType::Date32), Ok(ymd(2021, 4, 28)));
        assert_eq!(cast(json!("01/01/1970"), &DataType::Date32), Ok(ymd(1970, 1, 1)));
        assert_eq!(cast(json!("1959-12-31"), &DataType::Date32), Ok(ymd(1959, 12, 31)));
        assert_eq!(cast(json!("20200229"), &DataType::Date32), Ok(ymd(2020, 2, 29)));
        assert_eq!(
            cast(json!("2021-04-28T10:11:12"), &DataType::Date32),
            Ok(ymd(2021, 4, 28))
        );
        assert!(cast(json!("28th April"), &DataType::Date32).is_err());
        assert!(cast(json!("2021-02-30"), &DataType::Date32).is_err());
    }

    #[test]
    fn casting_to_string() {
        assert_eq!(cast(json!("34"), &DataType::String), Ok(Value::Utf8("34".to_string())));
        assert_eq!(cast(json!(35), &DataType::String), Ok(Value::Utf8("35".to_string())));
        assert_eq!(cast(json!(true), &DataType::String), Ok(Value::Utf8("true".to_string())));
    }

    #[test]
    fn casting_to_list() {
        assert_eq!(
            cast(json!("1;2;3"), &list(";")),
            Ok(Value::List(vec!["1".into(), "2".into(), "3".into()]))
        );
        assert_eq!(cast(json!(""), &list(";")), Ok(Value::List(vec![])));
        assert_eq!(
            cast(json!("a;;b;"), &list(";")),
            Ok(Value::List(vec!["a".into(), "".into(), "b".into()]))
        );
        assert_eq!(
            cast(json!("14a, 14b"), &list(", ")),
            Ok(Value::List(vec!["14a".into(), "14b".into()]))
        );
    }

    #[test]
    fn casting_to_decimal() {
        let dt = DataType::Decimal { precision: 6, scale: 4 };
        assert_eq!(
            cast(json!("13.2134"), &dt),
            Ok(Value::Decimal(Decimal::from_str("13.2134").unwrap()))
        );
        assert_eq!(cast(json!(""), &dt), Ok(Value::Null));
        assert!(cast(json!("abc"), &dt).is_err());

        let dt = DataType::Decimal { precision: 4, scale: 1 };
        assert_eq!(
            cast(json!("110.25"), &dt),
            Ok(Value::Decimal(Decimal::from_str("110.3").unwrap()))
        );
        assert_eq!(
            cast(json!(7), &dt),
            Ok(Value::Decimal(Decimal::from_str("7.0").unwrap()))
        );
        let err = cast(json!("12345"), &dt).unwrap_err();
        assert!(err.to_string().contains("precision is 4"));
    }

    #[test]
    fn decimal_values_that_do_not_fit_the_scale_are_rejected() {
        let dt = DataType::Decimal { precision: 28, scale: 28 };
        assert!(matches!(
            cast(json!("9"), &dt),
            Err(CastError::InvalidValue { kind: TypeKind::Decimal, .. })
        ));
        assert!(cast(json!("5"), &dt).is_err());
        assert!(cast(json!("99"), &DataType::Decimal { precision: 28, scale: 27 }).is_err());

        let fits = cast(json!("0.5"), &dt).unwrap();
        match fits {
            Value::Decimal(d) => assert_eq!(d.scale(), 28),
            other => panic!("expected decimal, got {other:?}"),
        }
    }

    #[test]
    fn absent_values_are_null_for_every_kind() {
        let registry = TypeRegistry::standard();
        let caster = ValueCaster::new(&registry);
        let kinds = [
            DataType::String,
            DataType::Boolean,
            DataType::Int8,
            DataType::UInt64,
            DataType::Date32,
            DataType::Decimal { precision: 3, scale: 1 },
            list(";"),
        ];
        for dt in &kinds {
            assert_eq!(caster.cast(None, dt), Ok(Value::Null));
            assert_eq!(caster.cast(Some(&JsonValue::Null), dt), Ok(Value::Null));
        }
    }

    #[test]
    fn unregistered_kind_fails_only_for_present_values() {
        let registry = TypeRegistry::empty().with_kind(TypeKind::String);
        let caster = ValueCaster::new(&registry);
        assert_eq!(caster.cast(None, &DataType::Int32), Ok(Value::Null));
        assert_eq!(
            caster.cast(Some(&json!("12")), &DataType::Int32),
            Err(CastError::UnsupportedType {
                kind: "int32".to_string()
            })
        );
    }

    #[test]
    fn stringified_literals_round_trip() {
        let registry = TypeRegistry::standard();
        let caster = ValueCaster::new(&registry);
        let cases = [
            (Value::Int64(-42), DataType::Int64),
            (Value::Bool(true), DataType::Boolean),
            (
                Value::Date32(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
                DataType::Date32,
            ),
            (
                Value::Decimal(Decimal::from_str("-3.25").unwrap()),
                DataType::Decimal { precision: 5, scale: 2 },
            ),
        ];
        for (value, dt) in cases {
            let text = match &value {
                Value::Int64(v) => v.to_string(),
                Value::Bool(v) => v.to_string(),
                Value::Date32(v) => v.to_string(),
                Value::Decimal(v) => v.to_string(),
                _ => unreachable!(),
            };
            assert_eq!(caster.cast(Some(&JsonValue::String(text)), &dt), Ok(value));
        }
    }
}
