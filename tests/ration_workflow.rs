//! End-to-end distribution workflow
//!
//! Members, cards, distribution points, inventories and purchases, driven
//! through the domain transactions only.

mod common;

use serde_json::json;

use common::{Harness, INVENTORY, MEMBERS, RATIONS};
use ration_ledger::ErrorKind;

const NID: &str = "1234567890";

fn network() -> Harness {
    let h = Harness::new();
    h.seed_distributor("D-100");
    h.admin("createInventory", INVENTORY, json!({"name": "Central Store"}))
        .unwrap();
    h.admin(
        "createDistributionPoint",
        MEMBERS,
        json!({
            "distributionPointId": "DP-1",
            "name": "Mirpur Point",
            "distributor": "D-100",
            "inventory": "Central Store"
        }),
    )
    .unwrap();
    h
}

// =============================================================================
// Ration Cards
// =============================================================================

#[test]
fn test_issue_ration_card() {
    let h = network();
    h.seed_member(NID);
    h.issue_card(NID, "RC-1", "active");

    let member = h
        .invoke("readAsset", MEMBERS, "clerk", json!({"key": "member:1234567890"}))
        .unwrap();
    assert_eq!(member.result["rationCardNumber"], "RC-1");
    assert_eq!(member.result["rationCardCategory"], 2);
    assert_eq!(member.result["height"], 174.0);
    assert_eq!(h.sink.tags().last().unwrap(), "rationCardIssuedLog");
}

#[test]
fn test_card_is_issued_once() {
    let h = network();
    h.seed_member(NID);
    h.issue_card(NID, "RC-1", "active");

    let err = h
        .admin(
            "issueRationCard",
            INVENTORY,
            json!({
                "nid": NID,
                "rationCardNumber": "RC-2",
                "rationCardStatus": "active",
                "rationCardIssuedDate": "2024-01-01T00:00:00Z",
                "rationCardExpiryDate": "2025-01-01T00:00:00Z",
                "rationCardCategory": 1
            }),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(err.tag(), Some("rationCardNumber"));
}

#[test]
fn test_card_numbers_are_unique() {
    let h = network();
    h.seed_member(NID);
    h.seed_member("2234567890");
    h.issue_card(NID, "RC-1", "active");

    let err = h
        .admin(
            "issueRationCard",
            INVENTORY,
            json!({
                "nid": "2234567890",
                "rationCardNumber": "RC-1",
                "rationCardStatus": "active",
                "rationCardIssuedDate": "2024-01-01T00:00:00Z",
                "rationCardExpiryDate": "2025-01-01T00:00:00Z",
                "rationCardCategory": 1
            }),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn test_member_info_update_is_partial() {
    let h = network();
    h.seed_member(NID);

    let receipt = h
        .admin("updateMemberInfo", MEMBERS, json!({"nid": NID, "familySize": 5}))
        .unwrap();
    assert_eq!(receipt.result["familySize"], 5);
    assert_eq!(receipt.result["name"], "Rahima Begum");
}

// =============================================================================
// Purchases
// =============================================================================

#[test]
fn test_buy_ration_decrements_stock_and_records_history() {
    let h = network();
    h.seed_member(NID);
    h.issue_card(NID, "RC-1", "active");
    h.seed_ration("R1", "D-100", 10);

    let receipt = h
        .admin(
            "buyRation",
            MEMBERS,
            json!({"rationCardNumber": "RC-1", "rationId": "R1", "quantity": 4}),
        )
        .unwrap();
    assert_eq!(receipt.result["remaining"], 6);

    let ration = h.admin("readRation", RATIONS, json!({"id": "R1"})).unwrap();
    assert_eq!(ration.result["quantity"], 6);

    let member = h
        .invoke("readAsset", MEMBERS, "clerk", json!({"key": "member:1234567890"}))
        .unwrap();
    let history = &member.result["rationDistributionHistory"];
    assert_eq!(history["rationType"], "Grains");
    assert_eq!(history["quantity"], 4);
    assert_eq!(history["distributedTo"], NID);
    assert_eq!(history["location"], "distributor:D-100");
    assert_eq!(history["distributionID"], receipt.tx_id.to_string());
}

#[test]
fn test_buying_the_last_unit_removes_the_ration() {
    let h = network();
    h.seed_member(NID);
    h.issue_card(NID, "RC-1", "active");
    h.seed_ration("R1", "D-100", 3);

    h.admin(
        "buyRation",
        MEMBERS,
        json!({"rationCardNumber": "RC-1", "rationId": "R1", "quantity": 3}),
    )
    .unwrap();

    let err = h.admin("readRation", RATIONS, json!({"id": "R1"})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_cannot_buy_more_than_stock() {
    let h = network();
    h.seed_member(NID);
    h.issue_card(NID, "RC-1", "active");
    h.seed_ration("R1", "D-100", 3);

    let err = h
        .admin(
            "buyRation",
            MEMBERS,
            json!({"rationCardNumber": "RC-1", "rationId": "R1", "quantity": 4}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);

    let ration = h.admin("readRation", RATIONS, json!({"id": "R1"})).unwrap();
    assert_eq!(ration.result["quantity"], 3);
}

#[test]
fn test_inactive_card_cannot_buy() {
    let h = network();
    h.seed_member(NID);
    h.issue_card(NID, "RC-1", "suspended");
    h.seed_ration("R1", "D-100", 3);

    let err = h
        .admin(
            "buyRation",
            MEMBERS,
            json!({"rationCardNumber": "RC-1", "rationId": "R1", "quantity": 1}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.tag(), Some("rationCardStatus"));
}

#[test]
fn test_unknown_card_is_not_found() {
    let h = network();
    h.seed_ration("R1", "D-100", 3);

    let err = h
        .admin(
            "buyRation",
            MEMBERS,
            json!({"rationCardNumber": "RC-9", "rationId": "R1", "quantity": 1}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Distributors
// =============================================================================

#[test]
fn test_bad_license_rejects_distributor() {
    let h = Harness::new();

    let err = h
        .admin(
            "createDistributor",
            MEMBERS,
            json!({"distributorId": "D-100", "name": "North Depot", "licenseNumber": "DCLN-12"}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(err.tag(), Some("licenseNumber"));
    assert!(err.message().contains("must be 14 characters long"));
    assert!(err.message().contains("second part must be 9 characters long"));

    let err = h
        .admin(
            "createDistributor",
            MEMBERS,
            json!({"distributorId": "D-100", "name": "North Depot", "licenseNumber": "ABCD-123456789"}),
        )
        .unwrap_err();
    assert_eq!(err.tag(), Some("licenseNumber"));
    assert!(err.message().contains("first part must be DCLN"));

    assert!(h.ledger.is_empty());
    assert_eq!(h.sink.len(), 0);
}

#[test]
fn test_distributor_name_must_not_be_blank() {
    let h = Harness::new();

    let err = h
        .admin(
            "createDistributor",
            MEMBERS,
            json!({"distributorId": "D-100", "name": "   "}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(err.tag(), Some("name"));
    assert!(h.ledger.is_empty());
}

// =============================================================================
// Distribution Points and Inventory
// =============================================================================

#[test]
fn test_totals_by_distribution_point() {
    let h = network();
    let mut args = common::ration_args("R1", "D-100", 10);
    args["distributionPoint"] = json!("DP-1");
    h.admin("createRation", RATIONS, args).unwrap();
    let mut args = common::ration_args("R2", "D-100", 15);
    args["distributionPoint"] = json!("DP-1");
    h.admin("createRation", RATIONS, args).unwrap();
    h.seed_ration("R3", "D-100", 99);

    let receipt = h
        .admin(
            "readTotalRationsByDistributionPoint",
            MEMBERS,
            json!({"distributionPointId": "DP-1"}),
        )
        .unwrap();
    assert_eq!(receipt.result["total"], 2);
    assert_eq!(receipt.result["totalQuantity"], 25);
}

#[test]
fn test_replenish_inventory_deduplicates() {
    let h = network();
    h.seed_ration("R1", "D-100", 10);
    h.seed_ration("R2", "D-100", 10);

    h.admin(
        "replenishInventory",
        MEMBERS,
        json!({"distributionPointId": "DP-1", "rations": ["R1", "ration:R2"]}),
    )
    .unwrap();
    h.admin(
        "replenishInventory",
        MEMBERS,
        json!({"distributionPointId": "DP-1", "rations": ["R2"]}),
    )
    .unwrap();

    let count = h
        .invoke(
            "getNumberOfRationFromInventory",
            RATIONS,
            "clerk",
            json!({"inventory": "Central Store"}),
        )
        .unwrap();
    assert_eq!(count.result["numberOfRation"], 2);
}

#[test]
fn test_replenish_with_unknown_ration_is_dangling() {
    let h = network();
    let err = h
        .admin(
            "replenishInventory",
            MEMBERS,
            json!({"distributionPointId": "DP-1", "rations": ["R404"]}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DanglingReference);
}

#[test]
fn test_pickup_schedule_roundtrip_and_collision() {
    let h = network();
    let schedule = json!({
        "pickupDate": "2024-05-20T09:00:00Z",
        "location": "Counter 2",
        "rationType": "Grains",
        "quantity": 5
    });

    let err = h
        .admin("getPickupSchedule", MEMBERS, json!({"distributionPointId": "DP-1"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    h.admin(
        "setPickupSchedule",
        MEMBERS,
        json!({"distributionPointId": "DP-1", "pickupSchedule": schedule}),
    )
    .unwrap();

    let read = h
        .admin("getPickupSchedule", MEMBERS, json!({"distributionPointId": "DP-1"}))
        .unwrap();
    assert_eq!(read.result["location"], "Counter 2");

    let err = h
        .admin(
            "setPickupSchedule",
            MEMBERS,
            json!({"distributionPointId": "DP-1", "pickupSchedule": schedule}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}
