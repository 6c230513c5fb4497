//! Typed property values
//!
//! Raw input arrives as `serde_json::Value`; data type parsers turn it into a
//! [`Value`] plus a canonical string. Records on the ledger hold the canonical
//! strings, never the typed values.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

/// Typed result of a successful parse
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    /// Integers and enumeration ordinals
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    /// Decoded structured record (address, schedule, ...)
    Record(JsonValue),
    /// Key of another asset
    Reference(String),
    References(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&JsonValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Value::Reference(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_references(&self) -> Option<&[String]> {
        match self {
            Value::References(keys) => Some(keys),
            _ => None,
        }
    }

    /// Keys this value points at, empty for non-reference values
    pub fn referenced_keys(&self) -> Vec<&str> {
        match self {
            Value::Reference(k) => vec![k.as_str()],
            Value::References(keys) => keys.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// JSON rendering used in transaction responses
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Timestamp(t) => JsonValue::String(format_timestamp(t)),
            Value::Record(r) => r.clone(),
            Value::Reference(k) => JsonValue::String(k.clone()),
            Value::References(keys) => {
                JsonValue::Array(keys.iter().cloned().map(JsonValue::String).collect())
            }
        }
    }
}

/// Canonical timestamp rendering: UTC, RFC-3339, `Z` suffix
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_renders_with_z_suffix() {
        let t = Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap();
        assert_eq!(format_timestamp(&t), "2024-04-01T09:30:00Z");
    }

    #[test]
    fn test_referenced_keys() {
        let single = Value::Reference("distributor:D1".into());
        assert_eq!(single.referenced_keys(), vec!["distributor:D1"]);

        let many = Value::References(vec!["ration:R1".into(), "ration:R2".into()]);
        assert_eq!(many.referenced_keys().len(), 2);

        assert!(Value::Integer(3).referenced_keys().is_empty());
    }

    #[test]
    fn test_integer_widens_to_f64() {
        assert_eq!(Value::Integer(7).as_f64(), Some(7.0));
        assert_eq!(Value::String("7".into()).as_f64(), None);
    }
}
