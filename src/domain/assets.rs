//! Asset types of the distribution network and their custom validators

use chrono::{Datelike, Duration};
use serde_json::json;

use super::{ORG_INVENTORY, ORG_MEMBERS, ORG_PLATFORM, ORG_RATIONS};
use crate::datatype::PACKAGE_RAMADAN;
use crate::schema::{AssetTypeSchema, PropertySchema, PropertyType};
use crate::validation::{evaluate_all, Check, ValidationContext};
use crate::value::Value;

const MIN_RATION_QUANTITY: i64 = 1;
const MAX_RATION_QUANTITY: i64 = 100_000;
const MAX_EXPIRY_DAYS: i64 = 60;
const RAMADAN_MONTH: u32 = 4;

const LICENSE_LENGTH: usize = 14;
const LICENSE_CODE: &str = "DCLN";
const LICENSE_SERIAL_LENGTH: usize = 9;

pub fn asset_types() -> Vec<AssetTypeSchema> {
    vec![member(), distributor(), distribution_point(), inventory(), ration()]
}

fn dt(tag: &str) -> PropertyType {
    PropertyType::data_type(tag)
}

fn member() -> AssetTypeSchema {
    let w = &[ORG_MEMBERS, ORG_PLATFORM];
    // card fields are also written by the issuing office
    let card = &[ORG_MEMBERS, ORG_INVENTORY, ORG_PLATFORM];

    AssetTypeSchema::new(
        "member",
        "Member",
        vec![
            PropertySchema::new("nid", "National ID", dt("nid")).key().writers(w),
            PropertySchema::new("name", "Name", dt("string"))
                .required()
                .writers(w)
                .validator(non_blank),
            PropertySchema::new("dateOfBirth", "Date of Birth", dt("datetime")).writers(w),
            PropertySchema::new("height", "Height", dt("number"))
                .writers(w)
                .default_value(json!(174)),
            PropertySchema::new("address", "Address", dt("address")).writers(w),
            PropertySchema::new("contactInformation", "Contact Information", dt("contactInfo")).writers(w),
            PropertySchema::new("familySize", "Family Size", dt("integer")).writers(w),
            PropertySchema::new("income", "Income", dt("integer")).writers(w),
            PropertySchema::new("disabilityStatus", "Disability Status", dt("boolean")).writers(w),
            PropertySchema::new("rationCardNumber", "Ration Card Number", dt("string")).writers(card),
            PropertySchema::new("rationCardStatus", "Ration Card Status", dt("rationCardStatus")).writers(card),
            PropertySchema::new("rationCardIssuedDate", "Ration Card Issued Date", dt("datetime")).writers(card),
            PropertySchema::new("rationCardExpiryDate", "Ration Card Expiry Date", dt("datetime")).writers(card),
            PropertySchema::new("rationCardCategory", "Ration Card Category", dt("rationCardCategory")).writers(card),
            PropertySchema::new("rationDistributionHistory", "Ration Distribution History", dt("rationDistributionHistory"))
                .writers(w),
        ],
    )
    .with_description("Registered household member")
}

fn distributor() -> AssetTypeSchema {
    let w = &[ORG_MEMBERS, ORG_PLATFORM];

    AssetTypeSchema::new(
        "distributor",
        "Distributor",
        vec![
            PropertySchema::new("distributorId", "Distributor ID", dt("string")).key().writers(w),
            PropertySchema::new("name", "Name", dt("string"))
                .required()
                .validator(non_blank),
            PropertySchema::new("address", "Address", dt("address")),
            PropertySchema::new("contactInformation", "Contact Information", dt("contactInfo")),
            PropertySchema::new("licenseNumber", "License Number", dt("string"))
                .description("DCLN- followed by a nine digit serial")
                .validator(license_number),
            PropertySchema::new("licenseIssueDate", "License Issue Date", dt("datetime")),
            PropertySchema::new("licenseExpiryDate", "License Expiry Date", dt("datetime")),
            PropertySchema::new("distributionArea", "Distribution Area", dt("string")).writers(w),
            PropertySchema::new("lastInspectionDate", "Last Inspection Date", dt("datetime")),
        ],
    )
    .with_description("Licensed ration distributor")
}

fn distribution_point() -> AssetTypeSchema {
    let w = &[ORG_MEMBERS, ORG_PLATFORM];

    AssetTypeSchema::new(
        "distributionPoint",
        "Distribution Point",
        vec![
            PropertySchema::new("distributionPointId", "Distribution Point ID", dt("string"))
                .key()
                .writers(w),
            PropertySchema::new("name", "Name", dt("string")).required().writers(w),
            PropertySchema::new("address", "Address", dt("address")).writers(w),
            PropertySchema::new("coordinates", "Coordinates", dt("coordinates")).writers(w),
            PropertySchema::new("contactInformation", "Contact Information", dt("contactInfo")).writers(w),
            PropertySchema::new("distributor", "Distributor", PropertyType::reference("distributor")).writers(w),
            PropertySchema::new("operatingHours", "Operating Hours", dt("operatingHours")).writers(w),
            PropertySchema::new("capacity", "Capacity", dt("integer")).writers(w),
            PropertySchema::new("distributionStatus", "Distribution Status", dt("string")).writers(w),
            PropertySchema::new("lastInspectionDate", "Last Inspection Date", dt("datetime")).writers(w),
            PropertySchema::new("inspectionStatus", "Inspection Status", dt("inspectionStatus")),
            PropertySchema::new("numberOfCounters", "Number of Counters", dt("integer")).writers(w),
            PropertySchema::new("inventory", "Inventory", PropertyType::reference("inventory")).writers(w),
            PropertySchema::new("pickupSchedule", "Pickup Schedule", dt("rationPickupSchedule")).writers(w),
        ],
    )
    .with_description("Place where members collect rations")
}

fn inventory() -> AssetTypeSchema {
    AssetTypeSchema::new(
        "inventory",
        "Inventory",
        vec![
            PropertySchema::new("name", "Name", dt("string"))
                .key()
                .writers(&[ORG_INVENTORY, ORG_PLATFORM]),
            PropertySchema::new("rations", "Rations", PropertyType::reference_list("ration")),
            PropertySchema::new("entranceCode", "Entrance Code", dt("string")),
        ],
    )
    .with_description("Stock of rations held for distribution")
}

fn ration() -> AssetTypeSchema {
    let w = &[ORG_RATIONS, ORG_PLATFORM];

    AssetTypeSchema::new(
        "ration",
        "Ration",
        vec![
            PropertySchema::new("id", "Ration ID", dt("string")).key().writers(w),
            PropertySchema::new("category", "Category", dt("rationCategory")).required().writers(w),
            PropertySchema::new("description", "Description", dt("string")).writers(w),
            PropertySchema::new("package", "Package", dt("packageType"))
                .writers(w)
                .default_value(json!(0))
                .validator(package_in_season),
            PropertySchema::new("distributedBy", "Distributed By", PropertyType::reference("distributor"))
                .required()
                .writers(w),
            PropertySchema::new(
                "distributionPoint",
                "Distribution Point",
                PropertyType::reference("distributionPoint"),
            )
            .writers(w),
            PropertySchema::new("quantity", "Ration Quantity", dt("integer"))
                .required()
                .writers(w)
                .validator(quantity_in_range),
            PropertySchema::new("expiryDate", "Expiry Date", dt("datetime"))
                .required()
                .writers(w)
                .validator(expiry_window),
            PropertySchema::new("mfgDate", "Manufacturing Date", dt("datetime"))
                .required()
                .writers(w)
                .validator(manufactured_in_past),
            PropertySchema::new("batchNumber", "Batch Number", dt("integer"))
                .required()
                .writers(w)
                .validator(positive_batch),
        ],
    )
    .with_description("A batch of rations")
}

fn non_blank(value: &Value, _: &ValidationContext) -> Result<(), String> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err("name must be non-empty".into()),
    }
}

fn license_number(value: &Value, _: &ValidationContext) -> Result<(), String> {
    let license = value
        .as_str()
        .ok_or_else(|| "license number must be a string".to_string())?;
    evaluate_all(license, LICENSE_CHECKS)
}

/// Prefix and serial, when the number has exactly one hyphen
fn license_parts(license: &str) -> Option<(&str, &str)> {
    let mut parts = license.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(serial), None) => Some((prefix, serial)),
        _ => None,
    }
}

fn failure(failed: bool, reason: &str) -> Option<String> {
    failed.then(|| reason.to_string())
}

const LICENSE_CHECKS: &[Check] = &[
    |s| failure(s.is_empty(), "license number must be non-empty"),
    |s| failure(s.len() != LICENSE_LENGTH, "license number must be 14 characters long"),
    |s| failure(license_parts(s).is_none(), "license number must contain a hyphen"),
    |s| {
        let (prefix, _) = license_parts(s)?;
        failure(prefix.len() != 4, "license number first part must be 4 characters long")
    },
    |s| {
        let (prefix, _) = license_parts(s)?;
        failure(prefix != LICENSE_CODE, "license number first part must be DCLN")
    },
    |s| {
        let (_, serial) = license_parts(s)?;
        failure(serial.is_empty(), "license number second part must be non-empty")
    },
    |s| {
        let (_, serial) = license_parts(s)?;
        failure(
            !serial.is_empty() && !serial.bytes().all(|b| b.is_ascii_digit()),
            "license number second part must be a number",
        )
    },
    |s| {
        let (_, serial) = license_parts(s)?;
        failure(
            serial.len() != LICENSE_SERIAL_LENGTH,
            "license number second part must be 9 characters long",
        )
    },
];

/// The independent checks behind the distributor license validator
pub fn license_number_checks() -> &'static [Check] {
    LICENSE_CHECKS
}

fn quantity_in_range(value: &Value, _: &ValidationContext) -> Result<(), String> {
    match value.as_i64() {
        Some(q) if (MIN_RATION_QUANTITY..=MAX_RATION_QUANTITY).contains(&q) => Ok(()),
        _ => Err(format!(
            "Quantity must be between {} and {}",
            MIN_RATION_QUANTITY, MAX_RATION_QUANTITY
        )),
    }
}

fn expiry_window(value: &Value, ctx: &ValidationContext) -> Result<(), String> {
    let expiry = value.as_timestamp().ok_or("Expiry date must be a timestamp")?;
    if expiry < ctx.now {
        return Err("Expiry date must be in the future".into());
    }
    if expiry > ctx.now + Duration::days(MAX_EXPIRY_DAYS) {
        return Err(format!("Expiry date must be within {} days", MAX_EXPIRY_DAYS));
    }
    Ok(())
}

fn manufactured_in_past(value: &Value, ctx: &ValidationContext) -> Result<(), String> {
    let mfg = value.as_timestamp().ok_or("Manufacturing date must be a timestamp")?;
    if mfg > ctx.now {
        return Err("Manufacturing date must be in the past".into());
    }
    Ok(())
}

fn positive_batch(value: &Value, _: &ValidationContext) -> Result<(), String> {
    match value.as_i64() {
        Some(n) if n >= 1 => Ok(()),
        _ => Err("Batch number must be greater than 0".into()),
    }
}

fn package_in_season(value: &Value, ctx: &ValidationContext) -> Result<(), String> {
    if value.as_i64() == Some(PACKAGE_RAMADAN) && ctx.now.month() != RAMADAN_MONTH {
        return Err("Ramadan package type can only be used in the month of Ramadan".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ctx(month: u32) -> ValidationContext {
        ValidationContext::new(Utc.with_ymd_and_hms(2024, month, 10, 12, 0, 0).unwrap())
    }

    fn license(s: &str) -> Result<(), String> {
        license_number(&Value::String(s.into()), &ctx(1))
    }

    #[test]
    fn test_license_number_accepts_well_formed() {
        assert!(license("DCLN-123456789").is_ok());
    }

    #[test]
    fn test_license_number_reports_prefix() {
        let err = license("ABCD-123456789").unwrap_err();
        assert_eq!(err, "validation failed: license number first part must be DCLN");
    }

    #[test]
    fn test_license_number_reports_every_failure() {
        let err = license("DCLN-12").unwrap_err();
        assert!(err.contains("must be 14 characters long"));
        assert!(err.contains("second part must be 9 characters long"));
        assert!(!err.contains("contain a hyphen"));

        let err = license("").unwrap_err();
        assert!(err.contains("must be non-empty"));
        assert!(err.contains("must contain a hyphen"));
    }

    #[test]
    fn test_license_serial_must_be_digits() {
        let err = license("DCLN-12345678X").unwrap_err();
        assert_eq!(err, "validation failed: license number second part must be a number");
    }

    #[test]
    fn test_expiry_window_follows_context_time() {
        let now = ctx(5);
        let at = |days: i64| Value::Timestamp(now.now + Duration::days(days));
        assert!(expiry_window(&at(30), &now).is_ok());
        assert_eq!(expiry_window(&at(-1), &now).unwrap_err(), "Expiry date must be in the future");
        assert_eq!(expiry_window(&at(61), &now).unwrap_err(), "Expiry date must be within 60 days");
    }

    #[test]
    fn test_ramadan_package_only_in_april() {
        let ramadan = Value::Integer(PACKAGE_RAMADAN);
        assert!(package_in_season(&ramadan, &ctx(4)).is_ok());
        assert!(package_in_season(&ramadan, &ctx(5)).is_err());
        assert!(package_in_season(&Value::Integer(0), &ctx(5)).is_ok());
    }

    #[test]
    fn test_ration_limits() {
        let c = ctx(1);
        assert!(quantity_in_range(&Value::Integer(1), &c).is_ok());
        assert!(quantity_in_range(&Value::Integer(100_001), &c).is_err());
        assert!(positive_batch(&Value::Integer(0), &c).is_err());
    }

    #[test]
    fn test_schemas_are_well_formed() {
        for schema in asset_types() {
            schema.validate_structure().unwrap();
        }
    }
}
