//! Structured data types
//!
//! Each accepts either a JSON-encoded string or the JSON value itself, decodes
//! it into a typed record, then applies field checks. The canonical form is the
//! decoded record re-serialized with sorted keys, so whitespace and field order
//! in the input do not matter.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{encoding_name, parse_timestamp, DataType, Parsed};
use crate::errors::{LedgerError, LedgerResult};
use crate::schema::KEY_SEPARATOR;
use crate::value::Value;

const WEEKDAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const TRANSACTION_TYPES: &[&str] = &["distributorReceive", "memberReceive"];

pub(super) fn builtins() -> Vec<DataType> {
    vec![
        DataType {
            tag: "@object",
            label: "Object",
            description: "Any JSON object, as-is",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_object,
        },
        DataType {
            tag: "@key",
            label: "Asset Key",
            description: "A ledger key string, or an object with @assetType and key properties or @key",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_key,
        },
        DataType {
            tag: "address",
            label: "Address",
            description: "Postal address with street, city, state, postalCode and country",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_address,
        },
        DataType {
            tag: "contactInfo",
            label: "Contact Information",
            description: "Contact person with name, email and phone",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_contact_info,
        },
        DataType {
            tag: "operatingHours",
            label: "Operating Hours",
            description: "Opening days with RFC-3339 openingTime and closingTime",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_operating_hours,
        },
        DataType {
            tag: "rationPickupSchedule",
            label: "Ration Pickup Schedule",
            description: "When, where and how much ration a member can collect",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_pickup_schedule,
        },
        DataType {
            tag: "rationDistributionHistory",
            label: "Ration Distribution History",
            description: "Record of one completed distribution",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_distribution_history,
        },
        DataType {
            tag: "rationTransaction",
            label: "Ration Transactions",
            description: "List of distributor and member receipts",
            accepted_formats: &["@object", "string"],
            drop_down_values: &[],
            parse: parse_ration_transactions,
        },
    ]
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Address {
    street: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ContactInfo {
    name: String,
    email: String,
    phone: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OperatingHours {
    days: Vec<String>,
    opening_time: String,
    closing_time: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PickupSchedule {
    pickup_date: String,
    location: String,
    ration_type: String,
    quantity: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DistributionHistory {
    #[serde(rename = "distributionID")]
    distribution_id: String,
    distribution_date: String,
    ration_type: String,
    quantity: i64,
    distributed_to: String,
    location: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RationTransaction {
    #[serde(rename = "transactionID")]
    transaction_id: String,
    transaction_type: String,
    item_name: String,
    quantity: i64,
    unit: String,
    transaction_date: String,
    #[serde(rename = "distributorID")]
    distributor_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    source: String,
    #[serde(rename = "memberID", skip_serializing_if = "String::is_empty")]
    member_id: String,
}

fn postal_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("invalid postal code pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("invalid email pattern")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[1-9][0-9]{1,14}$").expect("invalid phone pattern"))
}

fn decode<T: DeserializeOwned>(raw: &JsonValue, tag: &str) -> LedgerResult<T> {
    let decoded = match raw {
        JsonValue::String(s) => serde_json::from_str(s),
        JsonValue::Object(_) | JsonValue::Array(_) => serde_json::from_value(raw.clone()),
        other => {
            return Err(LedgerError::invalid_format(format!(
                "{} expects a JSON object or JSON-encoded string, got {}",
                tag,
                encoding_name(other)
            )))
        }
    };
    decoded.map_err(|e| LedgerError::invalid_format(format!("invalid {} JSON: {}", tag, e)))
}

fn canonicalize<T: Serialize>(decoded: &T) -> LedgerResult<Parsed> {
    let value = serde_json::to_value(decoded)
        .map_err(|e| LedgerError::invalid_format(e.to_string()))?;
    Ok(Parsed::new(value.to_string(), Value::Record(value)))
}

fn require(field: &str, value: &str) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::invalid_value(format!("{} is required", field)));
    }
    Ok(())
}

fn require_timestamp(field: &str, value: &str) -> LedgerResult<chrono::DateTime<chrono::Utc>> {
    parse_timestamp(value)
        .ok_or_else(|| LedgerError::invalid_value(format!("invalid {} format", field)))
}

fn require_positive(field: &str, value: i64) -> LedgerResult<()> {
    if value <= 0 {
        return Err(LedgerError::invalid_value(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}

fn parse_object(raw: &JsonValue) -> LedgerResult<Parsed> {
    let object: Map<String, JsonValue> = decode(raw, "@object")?;
    canonicalize(&object)
}

fn parse_key(raw: &JsonValue) -> LedgerResult<Parsed> {
    if let JsonValue::String(s) = raw {
        if !s.trim_start().starts_with('{') {
            let well_formed = s
                .split_once(KEY_SEPARATOR)
                .map_or(false, |(tag, rest)| !tag.is_empty() && !rest.is_empty());
            if !well_formed {
                return Err(LedgerError::invalid_value(format!("'{}' is not a ledger key", s)));
            }
            return Ok(Parsed::new(s.clone(), Value::String(s.clone())));
        }
    }

    let object: Map<String, JsonValue> = decode(raw, "@key")?;
    let addressed = object.get("@key").map_or(false, JsonValue::is_string)
        || object.get("@assetType").map_or(false, JsonValue::is_string);
    if !addressed {
        return Err(LedgerError::invalid_value(
            "key object needs an @assetType or @key string",
        ));
    }
    canonicalize(&object)
}

fn parse_address(raw: &JsonValue) -> LedgerResult<Parsed> {
    let address: Address = decode(raw, "address")?;

    require("street", &address.street)?;
    require("city", &address.city)?;
    require("state", &address.state)?;
    if !postal_code_pattern().is_match(&address.postal_code) {
        return Err(LedgerError::invalid_value("invalid postal code"));
    }
    require("country", &address.country)?;

    canonicalize(&address)
}

fn parse_contact_info(raw: &JsonValue) -> LedgerResult<Parsed> {
    let contact: ContactInfo = decode(raw, "contactInfo")?;

    require("name", &contact.name)?;
    if !email_pattern().is_match(&contact.email) {
        return Err(LedgerError::invalid_value("invalid email address"));
    }
    if !phone_pattern().is_match(&contact.phone) {
        return Err(LedgerError::invalid_value("invalid phone number"));
    }

    canonicalize(&contact)
}

fn parse_operating_hours(raw: &JsonValue) -> LedgerResult<Parsed> {
    let hours: OperatingHours = decode(raw, "operatingHours")?;

    if hours.days.is_empty() {
        return Err(LedgerError::invalid_value("days are required"));
    }
    if let Some(day) = hours.days.iter().find(|d| !WEEKDAYS.contains(&d.as_str())) {
        return Err(LedgerError::invalid_value(format!("invalid day '{}'", day)));
    }

    let opening = require_timestamp("openingTime", &hours.opening_time)?;
    let closing = require_timestamp("closingTime", &hours.closing_time)?;
    if closing <= opening {
        return Err(LedgerError::invalid_value(
            "closingTime must be after openingTime",
        ));
    }

    canonicalize(&hours)
}

fn parse_pickup_schedule(raw: &JsonValue) -> LedgerResult<Parsed> {
    let schedule: PickupSchedule = decode(raw, "rationPickupSchedule")?;

    require_timestamp("pickupDate", &schedule.pickup_date)?;
    require("location", &schedule.location)?;
    require("rationType", &schedule.ration_type)?;
    require_positive("quantity", schedule.quantity)?;

    canonicalize(&schedule)
}

fn parse_distribution_history(raw: &JsonValue) -> LedgerResult<Parsed> {
    let history: DistributionHistory = decode(raw, "rationDistributionHistory")?;

    require("distributionID", &history.distribution_id)?;
    require_timestamp("distributionDate", &history.distribution_date)?;
    require("rationType", &history.ration_type)?;
    require_positive("quantity", history.quantity)?;
    require("distributedTo", &history.distributed_to)?;
    require("location", &history.location)?;

    canonicalize(&history)
}

fn parse_ration_transactions(raw: &JsonValue) -> LedgerResult<Parsed> {
    let transactions: Vec<RationTransaction> = decode(raw, "rationTransaction")?;

    for tx in &transactions {
        require("transactionID", &tx.transaction_id)?;
        if !TRANSACTION_TYPES.contains(&tx.transaction_type.as_str()) {
            return Err(LedgerError::invalid_value(format!(
                "invalid transactionType '{}'",
                tx.transaction_type
            )));
        }
        require("itemName", &tx.item_name)?;
        require_positive("quantity", tx.quantity)?;
        require("unit", &tx.unit)?;
        require_timestamp("transactionDate", &tx.transaction_date)?;
        require("distributorID", &tx.distributor_id)?;
        match tx.transaction_type.as_str() {
            "distributorReceive" if tx.source.is_empty() => {
                return Err(LedgerError::invalid_value(
                    "source is required for distributorReceive transactions",
                ))
            }
            "memberReceive" if tx.member_id.is_empty() => {
                return Err(LedgerError::invalid_value(
                    "memberID is required for memberReceive transactions",
                ))
            }
            _ => {}
        }
    }

    canonicalize(&transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn address(postal_code: &str) -> JsonValue {
        json!({
            "street": "12 Lake Road",
            "city": "Dhaka",
            "state": "Dhaka",
            "postalCode": postal_code,
            "country": "Bangladesh"
        })
    }

    #[test]
    fn test_address_from_string_and_object_agree() {
        let from_object = parse_address(&address("12345")).unwrap();
        let from_string = parse_address(&json!(address("12345").to_string())).unwrap();
        assert_eq!(from_object, from_string);
    }

    #[test]
    fn test_address_postal_code() {
        assert!(parse_address(&address("12345-6789")).is_ok());
        let err = parse_address(&address("1234")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        let err = parse_address(&address("১২৩৪৫")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_address_structure_checked_before_values() {
        let err = parse_address(&json!("{not json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err = parse_address(&json!({"street": 12})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err = parse_address(&json!(42)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_object_passes_through() {
        let parsed = parse_object(&json!(r#"{"b": 1, "a": [true]}"#)).unwrap();
        assert_eq!(parsed.canonical, r#"{"a":[true],"b":1}"#);
        assert_eq!(
            parse_object(&json!([1, 2])).unwrap_err().kind(),
            ErrorKind::InvalidFormat
        );
    }

    #[test]
    fn test_key_encodings() {
        assert_eq!(parse_key(&json!("ration:R1")).unwrap().canonical, "ration:R1");
        assert!(parse_key(&json!({"@assetType": "ration", "id": "R1"})).is_ok());
        assert!(parse_key(&json!(r#"{"@key": "ration:R1"}"#)).is_ok());
        assert_eq!(
            parse_key(&json!("R1")).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
        assert_eq!(
            parse_key(&json!({"id": "R1"})).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_contact_info() {
        let ok = json!({"name": "Karim", "email": "karim@example.com", "phone": "+8801700000000"});
        assert!(parse_contact_info(&ok).is_ok());

        let bad_email = json!({"name": "Karim", "email": "karim@", "phone": "+8801700000000"});
        assert_eq!(
            parse_contact_info(&bad_email).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );

        let bad_phone = json!({"name": "Karim", "email": "karim@example.com", "phone": "0170"});
        assert_eq!(
            parse_contact_info(&bad_phone).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );

        let bengali_phone = json!({"name": "Karim", "email": "karim@example.com", "phone": "+8৮০১৭০০০০০০০০"});
        assert_eq!(
            parse_contact_info(&bengali_phone).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_operating_hours() {
        let bad_day = json!({
            "days": ["Funday"],
            "openingTime": "2024-01-01T09:00:00Z",
            "closingTime": "2024-01-01T17:00:00Z"
        });
        assert_eq!(
            parse_operating_hours(&bad_day).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );

        let same_time = json!({
            "days": ["Monday"],
            "openingTime": "2024-01-01T09:00:00Z",
            "closingTime": "2024-01-01T09:00:00Z"
        });
        let err = parse_operating_hours(&same_time).unwrap_err();
        assert!(err.message().contains("closingTime"));

        let no_days = json!({"openingTime": "2024-01-01T09:00:00Z", "closingTime": "2024-01-01T17:00:00Z"});
        assert_eq!(
            parse_operating_hours(&no_days).unwrap_err().message(),
            "days are required"
        );
    }

    #[test]
    fn test_pickup_schedule_quantity() {
        let schedule = json!({
            "pickupDate": "2024-01-05T10:00:00Z",
            "location": "Mirpur",
            "rationType": "Rice",
            "quantity": 0
        });
        assert_eq!(
            parse_pickup_schedule(&schedule).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_distribution_history() {
        let history = json!({
            "distributionID": "DH-1",
            "distributionDate": "2024-02-01T08:00:00Z",
            "rationType": "Oil",
            "quantity": 2,
            "distributedTo": "1234567890",
            "location": "Mirpur"
        });
        let parsed = parse_distribution_history(&history).unwrap();
        assert!(parsed.canonical.contains("\"distributionID\":\"DH-1\""));
    }

    #[test]
    fn test_ration_transactions_type_specific_fields() {
        let member_receive = json!([{
            "transactionID": "T2",
            "transactionType": "memberReceive",
            "itemName": "Rice",
            "quantity": 10,
            "unit": "kg",
            "transactionDate": "2023-10-06T10:00:00Z",
            "distributorID": "D1"
        }]);
        let err = parse_ration_transactions(&member_receive).unwrap_err();
        assert!(err.message().contains("memberID"));

        let distributor_receive = json!([{
            "transactionID": "T1",
            "transactionType": "distributorReceive",
            "itemName": "Rice",
            "quantity": 50,
            "unit": "kg",
            "transactionDate": "2023-10-05T14:30:00Z",
            "distributorID": "D1",
            "source": "Government Agency"
        }]);
        let parsed = parse_ration_transactions(&distributor_receive).unwrap();
        assert!(!parsed.canonical.contains("memberID"));
    }
}
