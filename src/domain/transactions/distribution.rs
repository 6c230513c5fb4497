//! Distributors, distribution points and their inventories

use serde_json::{json, Map, Value as JsonValue};

use super::{admins_of, arg, key_arg};
use crate::domain::{ORG_INVENTORY, ORG_MEMBERS, ORG_PLATFORM, ORG_RATIONS};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::ledger::Selector;
use crate::schema::PropertyType;
use crate::transaction::{
    ArgumentSchema, Args, CallerPattern, TransactionDefinition, TxContext,
};

const DISTRIBUTOR_FIELDS: &[&str] = &[
    "distributorId",
    "name",
    "address",
    "contactInformation",
    "licenseNumber",
    "licenseIssueDate",
    "licenseExpiryDate",
    "distributionArea",
    "lastInspectionDate",
];

const DISTRIBUTION_POINT_FIELDS: &[&str] = &[
    "distributionPointId",
    "name",
    "address",
    "coordinates",
    "contactInformation",
    "distributor",
    "operatingHours",
    "capacity",
    "lastInspectionDate",
    "inspectionStatus",
    "numberOfCounters",
    "inventory",
];

const INVENTORY_FIELDS: &[&str] = &["name", "rations", "entranceCode"];

pub(super) fn transactions() -> Vec<TransactionDefinition> {
    vec![
        admins_of(
            TransactionDefinition::new("createDistributor", "Create Distributor", "POST", create_distributor)
                .description("Register a new distributor")
                .arg(arg("distributorId", "Distributor ID", "string").required())
                .arg(arg("name", "Name", "string").required())
                .arg(arg("address", "Address", "address"))
                .arg(arg("contactInformation", "Contact Information", "contactInfo"))
                .arg(arg("licenseNumber", "License Number", "string"))
                .arg(arg("licenseIssueDate", "License Issue Date", "datetime"))
                .arg(arg("licenseExpiryDate", "License Expiry Date", "datetime"))
                .arg(arg("distributionArea", "Distribution Area", "string"))
                .arg(arg("lastInspectionDate", "Last Inspection Date", "datetime")),
            ORG_MEMBERS,
        ),
        admins_of(
            TransactionDefinition::new(
                "createDistributionPoint",
                "Create Distribution Point",
                "POST",
                create_distribution_point,
            )
            .description("Register a new distribution point")
            .arg(arg("distributionPointId", "Distribution Point ID", "string").required())
            .arg(arg("name", "Name", "string").required())
            .arg(arg("address", "Address", "address"))
            .arg(arg("coordinates", "Coordinates", "coordinates"))
            .arg(arg("contactInformation", "Contact Information", "contactInfo"))
            .arg(ArgumentSchema::new("distributor", "Distributor", PropertyType::reference("distributor")))
            .arg(arg("operatingHours", "Operating Hours", "operatingHours"))
            .arg(arg("capacity", "Capacity", "integer"))
            .arg(arg("lastInspectionDate", "Last Inspection Date", "datetime"))
            .arg(arg("inspectionStatus", "Inspection Status", "inspectionStatus"))
            .arg(arg("numberOfCounters", "Number of Counters", "integer"))
            .arg(ArgumentSchema::new("inventory", "Inventory", PropertyType::reference("inventory"))),
            ORG_MEMBERS,
        ),
        admins_of(
            TransactionDefinition::new("createInventory", "Create Inventory", "POST", create_inventory)
                .description("Create a new inventory")
                .arg(arg("name", "Name", "string").required())
                .arg(ArgumentSchema::new("rations", "Rations", PropertyType::reference_list("ration")))
                .arg(arg("entranceCode", "Entrance Code", "string")),
            ORG_INVENTORY,
        ),
        admins_of(
            TransactionDefinition::new("replenishInventory", "Replenish Inventory", "POST", replenish_inventory)
                .description("Add rations to the inventory of a distribution point")
                .arg(arg("distributionPointId", "Distribution Point ID", "string").required())
                .arg(
                    ArgumentSchema::new("rations", "Rations", PropertyType::reference_list("ration"))
                        .required(),
                ),
            ORG_MEMBERS,
        ),
        TransactionDefinition::new(
            "getNumberOfRationFromInventory",
            "Get Number Of Rations From Inventory",
            "GET",
            number_of_rations_in_inventory,
        )
        .description("Count the rations an inventory lists")
        .caller(CallerPattern::any_role(ORG_RATIONS))
        .caller(CallerPattern::any_role(ORG_PLATFORM))
        .arg(ArgumentSchema::new("inventory", "Inventory", PropertyType::reference("inventory")).required()),
        admins_of(
            TransactionDefinition::new("setPickupSchedule", "Set Pickup Schedule", "PUT", set_pickup_schedule)
                .description("Set the pickup schedule of a distribution point")
                .arg(arg("distributionPointId", "Distribution Point ID", "string").required())
                .arg(arg("pickupSchedule", "Pickup Schedule", "rationPickupSchedule").required()),
            ORG_MEMBERS,
        ),
        admins_of(
            TransactionDefinition::new("getPickupSchedule", "Get Pickup Schedule", "GET", get_pickup_schedule)
                .description("Read the pickup schedule of a distribution point")
                .arg(arg("distributionPointId", "Distribution Point ID", "string").required()),
            ORG_MEMBERS,
        ),
    ]
}

fn create_and_log(
    ctx: &mut TxContext<'_>,
    asset_type: &str,
    props: &Map<String, JsonValue>,
    event: &str,
    message: String,
) -> LedgerResult<JsonValue> {
    let created = ctx.create(asset_type, props)?;
    ctx.emit(event, json!({ "key": created.key(), "message": message }))?;
    Ok(created.to_json())
}

fn create_distributor(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let message = format!("New distributor created: {}", args.str("distributorId")?);
    create_and_log(
        ctx,
        "distributor",
        &args.to_props(DISTRIBUTOR_FIELDS),
        "distributorCreatedLog",
        message,
    )
}

fn create_distribution_point(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let message = format!(
        "New distribution point created: {}",
        args.str("distributionPointId")?
    );
    create_and_log(
        ctx,
        "distributionPoint",
        &args.to_props(DISTRIBUTION_POINT_FIELDS),
        "distributionPointCreatedLog",
        message,
    )
}

fn create_inventory(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let message = format!("New inventory created: {}", args.str("name")?);
    create_and_log(
        ctx,
        "inventory",
        &args.to_props(INVENTORY_FIELDS),
        "inventoryCreatedLog",
        message,
    )
}

fn replenish_inventory(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let point_key = key_arg(ctx, args, "distributionPoint", "distributionPointId")?;
    let point = ctx.get(&point_key)?;
    let inventory_key = point
        .get("inventory")
        .and_then(|v| v.as_reference())
        .map(str::to_string)
        .ok_or_else(|| {
            LedgerError::new(ErrorKind::NotFound, "distribution point has no inventory")
                .with_tag("inventory")
        })?;

    let inventory = ctx.get(&inventory_key)?;
    let mut rations: Vec<String> = inventory
        .get("rations")
        .and_then(|v| v.as_references())
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    let before = rations.len();
    for key in args.references("rations")? {
        if !rations.contains(key) {
            rations.push(key.clone());
        }
    }

    let mut patch = Map::new();
    patch.insert("rations".into(), json!(rations));
    let updated = ctx.update(&inventory_key, &patch)?;

    ctx.emit(
        "inventoryReplenishedLog",
        json!({
            "key": updated.key(),
            "distributionPoint": point_key,
            "added": rations.len() - before,
        }),
    )?;
    Ok(updated.to_json())
}

fn number_of_rations_in_inventory(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let inventory = ctx.get(args.reference("inventory")?)?;
    let count = inventory
        .get("rations")
        .and_then(|v| v.as_references())
        .map_or(0, <[String]>::len);
    Ok(json!({ "numberOfRation": count }))
}

fn set_pickup_schedule(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let point_key = key_arg(ctx, args, "distributionPoint", "distributionPointId")?;
    let point = ctx.get(&point_key)?;
    let schedule = args.value("pickupSchedule")?.to_json();
    let canonical = args.canonical("pickupSchedule").unwrap_or_default().to_string();

    // Exact-match collision check against stored schedules
    let selector = Selector::asset_type("distributionPoint")
        .with("pickupSchedule", JsonValue::String(canonical))
        .with(
            "distributionPointId",
            JsonValue::String(point.canonical("distributionPointId").unwrap_or_default().to_string()),
        );
    if !ctx.search(&selector)?.is_empty() {
        return Err(LedgerError::new(
            ErrorKind::AlreadyExists,
            "pickup schedule is colliding with another schedule",
        )
        .with_tag("pickupSchedule"));
    }

    let mut patch = Map::new();
    patch.insert("pickupSchedule".into(), schedule);
    let updated = ctx.update(&point_key, &patch)?;

    ctx.emit(
        "pickupScheduleSetLog",
        json!({
            "key": updated.key(),
            "message": format!("Pickup schedule set for distribution point: {}", updated.key()),
        }),
    )?;
    Ok(updated.to_json())
}

fn get_pickup_schedule(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let point_key = key_arg(ctx, args, "distributionPoint", "distributionPointId")?;
    let point = ctx.get(&point_key)?;
    let schedule = point
        .get("pickupSchedule")
        .map(|v| v.to_json())
        .ok_or_else(|| {
            LedgerError::new(ErrorKind::NotFound, "pickup schedule is not set")
                .with_tag("pickupSchedule")
        })?;

    ctx.emit("pickupScheduleGetLog", json!({ "key": point_key }))?;
    Ok(schedule)
}
