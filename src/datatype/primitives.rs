//! Primitive data types: string, number, integer, boolean, datetime

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::{encoding_name, expect_string, DataType, Parsed};
use crate::errors::{LedgerError, LedgerResult};
use crate::value::{format_timestamp, Value};

pub(super) fn builtins() -> Vec<DataType> {
    vec![
        DataType {
            tag: "string",
            label: "String",
            description: "Any UTF-8 text",
            accepted_formats: &["string"],
            drop_down_values: &[],
            parse: parse_string,
        },
        DataType {
            tag: "number",
            label: "Number",
            description: "A finite decimal number",
            accepted_formats: &["number", "string"],
            drop_down_values: &[],
            parse: parse_number,
        },
        DataType {
            tag: "integer",
            label: "Integer",
            description: "A signed 64-bit integer",
            accepted_formats: &["number", "string"],
            drop_down_values: &[],
            parse: parse_integer,
        },
        DataType {
            tag: "boolean",
            label: "Boolean",
            description: "true or false",
            accepted_formats: &["boolean", "string"],
            drop_down_values: &[],
            parse: parse_boolean,
        },
        DataType {
            tag: "datetime",
            label: "Date/time",
            description: "An RFC-3339 timestamp, stored in UTC",
            accepted_formats: &["string"],
            drop_down_values: &[],
            parse: parse_datetime,
        },
    ]
}

fn parse_string(raw: &JsonValue) -> LedgerResult<Parsed> {
    let s = expect_string(raw, "string")?;
    Ok(Parsed::new(s, Value::String(s.to_string())))
}

fn parse_number(raw: &JsonValue) -> LedgerResult<Parsed> {
    let n = match raw {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| LedgerError::out_of_range("number is not representable"))?,
        JsonValue::String(s) => s.trim().parse::<f64>().map_err(|_| {
            LedgerError::invalid_format(format!("'{}' is not a number", s))
        })?,
        other => {
            return Err(LedgerError::invalid_format(format!(
                "number expects a number or numeric string, got {}",
                encoding_name(other)
            )))
        }
    };

    if !n.is_finite() {
        return Err(LedgerError::out_of_range("number must be finite"));
    }

    Ok(Parsed::new(n.to_string(), Value::Number(n)))
}

fn parse_integer(raw: &JsonValue) -> LedgerResult<Parsed> {
    let i = parse_integer_raw(raw)?;
    Ok(Parsed::new(i.to_string(), Value::Integer(i)))
}

/// Decode an integral number from a JSON number or numeric string
///
/// Fractional values fail `InvalidValue`; values outside `i64` fail
/// `OutOfRange`; anything that is not a number fails `InvalidFormat`.
pub fn parse_integer_raw(raw: &JsonValue) -> LedgerResult<i64> {
    match raw {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.is_u64() {
                return Err(LedgerError::out_of_range(format!("{} exceeds i64", n)));
            }
            integral_from_f64(n.as_f64().unwrap_or(f64::NAN))
        }
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(i);
            }
            match trimmed.parse::<f64>() {
                Ok(f) => integral_from_f64(f),
                Err(_) => Err(LedgerError::invalid_format(format!(
                    "'{}' is not an integer",
                    s
                ))),
            }
        }
        other => Err(LedgerError::invalid_format(format!(
            "integer expects a number or numeric string, got {}",
            encoding_name(other)
        ))),
    }
}

fn integral_from_f64(f: f64) -> LedgerResult<i64> {
    if !f.is_finite() {
        return Err(LedgerError::out_of_range("integer must be finite"));
    }
    if f.fract() != 0.0 {
        return Err(LedgerError::invalid_value(format!("{} is not a whole number", f)));
    }
    // i64::MAX as f64 rounds up to 2^63
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(LedgerError::out_of_range(format!("{} exceeds i64", f)));
    }
    Ok(f as i64)
}

fn parse_boolean(raw: &JsonValue) -> LedgerResult<Parsed> {
    let b = match raw {
        JsonValue::Bool(b) => *b,
        JsonValue::String(s) => match s.as_str() {
            "true" => true,
            "false" => false,
            _ => {
                return Err(LedgerError::invalid_value(format!(
                    "'{}' is neither true nor false",
                    s
                )))
            }
        },
        other => {
            return Err(LedgerError::invalid_format(format!(
                "boolean expects a boolean, got {}",
                encoding_name(other)
            )))
        }
    };
    Ok(Parsed::new(b.to_string(), Value::Boolean(b)))
}

fn parse_datetime(raw: &JsonValue) -> LedgerResult<Parsed> {
    let s = expect_string(raw, "datetime")?;
    let t = parse_timestamp(s)
        .ok_or_else(|| LedgerError::invalid_format(format!("'{}' is not RFC-3339", s)))?;
    Ok(Parsed::new(format_timestamp(&t), Value::Timestamp(t)))
}

/// Parse an RFC-3339 timestamp into UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_number_canonical_is_shortest() {
        let parsed = parse_number(&json!("174.0")).unwrap();
        assert_eq!(parsed.canonical, "174");
        assert_eq!(parsed.value, Value::Number(174.0));
    }

    #[test]
    fn test_number_rejects_non_finite() {
        let err = parse_number(&json!("inf")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_integer_rules() {
        assert_eq!(parse_integer_raw(&json!(42)).unwrap(), 42);
        assert_eq!(parse_integer_raw(&json!(" -7 ")).unwrap(), -7);
        assert_eq!(parse_integer_raw(&json!("5.0")).unwrap(), 5);
        assert_eq!(
            parse_integer_raw(&json!(2.5)).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
        assert_eq!(
            parse_integer_raw(&json!(u64::MAX)).unwrap_err().kind(),
            ErrorKind::OutOfRange
        );
        assert_eq!(
            parse_integer_raw(&json!("1e30")).unwrap_err().kind(),
            ErrorKind::OutOfRange
        );
        assert_eq!(
            parse_integer_raw(&json!("ten")).unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
        assert_eq!(
            parse_integer_raw(&json!(true)).unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
    }

    #[test]
    fn test_boolean() {
        assert_eq!(parse_boolean(&json!("false")).unwrap().value, Value::Boolean(false));
        assert_eq!(
            parse_boolean(&json!("yes")).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
        assert_eq!(
            parse_boolean(&json!(1)).unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
    }

    #[test]
    fn test_datetime_normalizes_to_utc() {
        let parsed = parse_datetime(&json!("2024-03-01T10:00:00+06:00")).unwrap();
        assert_eq!(parsed.canonical, "2024-03-01T04:00:00Z");
        assert_eq!(
            parse_datetime(&json!("01/03/2024")).unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
    }

    #[test]
    fn test_string_rejects_other_encodings() {
        let err = parse_string(&json!(12)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }
}
