//! Enumerated data types
//!
//! Numeric enumerations store the decimal ordinal as their canonical form.
//! Drop-down labels are presentation only; inputs must be the ordinal.

use serde_json::Value as JsonValue;

use super::{expect_string, parse_integer_raw, DataType, Parsed};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::value::Value;

pub const RATION_CATEGORIES: &[(&str, i64)] = &[
    ("Grains", 0),
    ("Oil", 1),
    ("Pulses", 2),
    ("Sugar", 3),
    ("Spices", 4),
    ("Ramadan Essentials", 5),
    ("Pandemic Essentials", 6),
    ("Others", 7),
];

pub const RATION_CARD_CATEGORIES: &[(&str, i64)] =
    &[("Single", 0), ("Small", 1), ("Medium", 2), ("Large", 3)];

pub const INSPECTION_STATUSES: &[(&str, i64)] = &[
    ("Pending", 0),
    ("In Progress", 1),
    ("Completed", 2),
    ("Failed", 3),
    ("Cancelled", 4),
];

pub const PACKAGE_TYPES: &[(&str, i64)] = &[
    ("Packet", 0),
    ("Bottle", 1),
    ("Can", 2),
    ("Box", 3),
    ("Sachet", 4),
    ("Bag", 5),
    ("Ramadan", 6),
];

/// Seasonal package ordinal, only valid during Ramadan distribution
pub const PACKAGE_RAMADAN: i64 = 6;

pub const RATION_CARD_STATUSES: &[&str] = &["active", "inactive", "suspended", "expired", "pending"];

pub(super) fn builtins() -> Vec<DataType> {
    vec![
        DataType {
            tag: "rationCategory",
            label: "Ration Category",
            description: "Kind of goods a ration contains",
            accepted_formats: &["number", "string"],
            drop_down_values: RATION_CATEGORIES,
            parse: parse_ration_category,
        },
        DataType {
            tag: "rationCardCategory",
            label: "Ration Card Category",
            description: "Household size band of a ration card",
            accepted_formats: &["number", "string"],
            drop_down_values: RATION_CARD_CATEGORIES,
            parse: parse_ration_card_category,
        },
        DataType {
            tag: "inspectionStatus",
            label: "Inspection Status",
            description: "State of the last distribution point inspection",
            accepted_formats: &["number", "string"],
            drop_down_values: INSPECTION_STATUSES,
            parse: parse_inspection_status,
        },
        DataType {
            tag: "packageType",
            label: "Package Type",
            description: "Packaging a ration ships in",
            accepted_formats: &["number", "string"],
            drop_down_values: PACKAGE_TYPES,
            parse: parse_package_type,
        },
        DataType {
            tag: "rationCardStatus",
            label: "Ration Card Status",
            description: "One of active, inactive, suspended, expired, pending",
            accepted_formats: &["string"],
            drop_down_values: &[],
            parse: parse_ration_card_status,
        },
    ]
}

fn parse_ration_category(raw: &JsonValue) -> LedgerResult<Parsed> {
    parse_ordinal(raw, "rationCategory", RATION_CATEGORIES)
}

fn parse_ration_card_category(raw: &JsonValue) -> LedgerResult<Parsed> {
    parse_ordinal(raw, "rationCardCategory", RATION_CARD_CATEGORIES)
}

fn parse_inspection_status(raw: &JsonValue) -> LedgerResult<Parsed> {
    parse_ordinal(raw, "inspectionStatus", INSPECTION_STATUSES)
}

fn parse_package_type(raw: &JsonValue) -> LedgerResult<Parsed> {
    parse_ordinal(raw, "packageType", PACKAGE_TYPES)
}

fn parse_ordinal(raw: &JsonValue, tag: &str, options: &[(&str, i64)]) -> LedgerResult<Parsed> {
    let ordinal = match parse_integer_raw(raw) {
        Ok(i) => i,
        Err(e) if e.kind() == ErrorKind::InvalidFormat => return Err(e),
        Err(_) => {
            return Err(LedgerError::invalid_value(format!(
                "{} must be one of {}",
                tag,
                ordinals(options)
            )))
        }
    };

    if !options.iter().any(|(_, v)| *v == ordinal) {
        return Err(LedgerError::invalid_value(format!(
            "{} is not a valid {}; expected one of {}",
            ordinal,
            tag,
            ordinals(options)
        )));
    }

    Ok(Parsed::new(ordinal.to_string(), Value::Integer(ordinal)))
}

fn ordinals(options: &[(&str, i64)]) -> String {
    options
        .iter()
        .map(|(_, v)| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_ration_card_status(raw: &JsonValue) -> LedgerResult<Parsed> {
    let s = expect_string(raw, "rationCardStatus")?;
    if !RATION_CARD_STATUSES.contains(&s) {
        return Err(LedgerError::invalid_value(format!(
            "invalid ration card status '{}'; expected one of {}",
            s,
            RATION_CARD_STATUSES.join(", ")
        )));
    }
    Ok(Parsed::new(s, Value::String(s.to_string())))
}
