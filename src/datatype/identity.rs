//! National ID and coordinate data types

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value as JsonValue};

use super::{expect_string, DataType, Parsed};
use crate::errors::{LedgerError, LedgerResult};
use crate::value::Value;

pub(super) fn builtins() -> Vec<DataType> {
    vec![
        DataType {
            tag: "nid",
            label: "National ID",
            description: "A 10 or 17 digit national ID number; hyphens and spaces are ignored",
            accepted_formats: &["string"],
            drop_down_values: &[],
            parse: parse_nid,
        },
        DataType {
            tag: "coordinates",
            label: "Coordinates",
            description: "GPS position written as 'latitude,longitude'",
            accepted_formats: &["string"],
            drop_down_values: &[],
            parse: parse_coordinates,
        },
    ]
}

fn nid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]{10}|[0-9]{13}|[0-9]{17})$").expect("invalid NID pattern"))
}

/// Strip the separators people type into ID numbers
pub fn normalize_nid(raw: &str) -> String {
    raw.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

fn parse_nid(raw: &JsonValue) -> LedgerResult<Parsed> {
    let nid = normalize_nid(expect_string(raw, "nid")?);

    // ASCII digits only; other scripts' digits are not ID numbers
    if !nid_pattern().is_match(&nid) {
        return Err(LedgerError::invalid_value(
            "invalid NID number: expected 10 or 17 digits",
        ));
    }
    // Old 13-digit cards need the holder's birth year prepended.
    // TODO: confirm with the registry office whether 13-digit IDs should be accepted as-is.
    let digits = nid.chars().count();
    if digits == 13 {
        return Err(LedgerError::invalid_value(
            "invalid NID number, please add birth year at the front",
        ));
    }
    if nid.starts_with('0') {
        return Err(LedgerError::invalid_value(
            "invalid NID number: must not start with 0",
        ));
    }
    if digits == 17 && !(nid.starts_with("19") || nid.starts_with("20")) {
        return Err(LedgerError::invalid_value(
            "invalid NID number: 17-digit numbers start with the birth year (19xx or 20xx)",
        ));
    }

    Ok(Parsed::new(nid.clone(), Value::String(nid)))
}

fn parse_coordinates(raw: &JsonValue) -> LedgerResult<Parsed> {
    let s = expect_string(raw, "coordinates")?;

    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(LedgerError::invalid_format(
            "coordinates must be in the format 'latitude,longitude'",
        ));
    }
    let latitude = parse_axis(parts[0], "latitude")?;
    let longitude = parse_axis(parts[1], "longitude")?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(LedgerError::invalid_value(format!(
            "latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(LedgerError::invalid_value(format!(
            "longitude {} is outside [-180, 180]",
            longitude
        )));
    }

    Ok(Parsed::new(
        format!("{},{}", latitude, longitude),
        Value::Record(json!({ "latitude": latitude, "longitude": longitude })),
    ))
}

fn parse_axis(part: &str, axis: &str) -> LedgerResult<f64> {
    let value = part
        .parse::<f64>()
        .map_err(|_| LedgerError::invalid_format(format!("{} '{}' is not a number", axis, part)))?;
    if !value.is_finite() {
        return Err(LedgerError::invalid_value(format!("{} must be finite", axis)));
    }
    Ok(value)
}
