//! Ration lifecycle and purchases

use serde_json::{json, Map, Value as JsonValue};

use super::{admins_of, arg, key_arg};
use crate::datatype::RATION_CATEGORIES;
use crate::domain::{ORG_MEMBERS, ORG_PLATFORM, ORG_RATIONS};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::ledger::Selector;
use crate::schema::PropertyType;
use crate::transaction::{ArgumentSchema, Args, TransactionDefinition, TxContext};
use crate::value::format_timestamp;

const RATION_FIELDS: &[&str] = &[
    "id",
    "category",
    "description",
    "package",
    "distributedBy",
    "distributionPoint",
    "quantity",
    "expiryDate",
    "mfgDate",
    "batchNumber",
];

/// Ration arguments; only `id` is required unless `create` is set
fn ration_args(tx: TransactionDefinition, create: bool) -> TransactionDefinition {
    let req = |a: ArgumentSchema| if create { a.required() } else { a };
    tx.arg(arg("id", "Ration ID", "string").required())
        .arg(req(arg("category", "Category", "rationCategory")))
        .arg(arg("description", "Description", "string"))
        .arg(arg("package", "Package", "packageType"))
        .arg(req(ArgumentSchema::new(
            "distributedBy",
            "Distributed By",
            PropertyType::reference("distributor"),
        )))
        .arg(ArgumentSchema::new(
            "distributionPoint",
            "Distribution Point",
            PropertyType::reference("distributionPoint"),
        ))
        .arg(req(arg("quantity", "Quantity", "integer")))
        .arg(req(arg("expiryDate", "Expiry Date", "datetime")))
        .arg(req(arg("mfgDate", "Manufacturing Date", "datetime")))
        .arg(req(arg("batchNumber", "Batch Number", "integer")))
}

pub(super) fn transactions() -> Vec<TransactionDefinition> {
    vec![
        admins_of(
            ration_args(
                TransactionDefinition::new("createRation", "Create Ration", "POST", create_ration)
                    .description("Create a new ration"),
                true,
            ),
            ORG_RATIONS,
        ),
        admins_of(
            ration_args(
                TransactionDefinition::new("updateRation", "Update Ration", "PUT", update_ration)
                    .description("Update the given fields of a ration"),
                false,
            ),
            ORG_RATIONS,
        ),
        admins_of(
            TransactionDefinition::new("readRation", "Read Ration", "GET", read_ration)
                .arg(arg("id", "Ration ID", "string").required()),
            ORG_RATIONS,
        ),
        admins_of(
            TransactionDefinition::new("deleteRation", "Delete Ration", "DELETE", delete_ration)
                .arg(arg("id", "Ration ID", "string").required()),
            ORG_RATIONS,
        ),
        admins_of(
            TransactionDefinition::new("buyRation", "Buy Ration", "POST", buy_ration)
                .description("A card holder collects part of a ration's stock")
                .arg(arg("rationCardNumber", "Ration Card Number", "string").required())
                .arg(arg("rationId", "Ration ID", "string").required())
                .arg(arg("quantity", "Quantity", "integer").required()),
            ORG_MEMBERS,
        ),
        admins_of(
            TransactionDefinition::new(
                "readTotalRationsByDistributionPoint",
                "Read Total Rations By Distribution Point",
                "GET",
                rations_by_distribution_point,
            )
            .arg(arg("distributionPointId", "Distribution Point ID", "string").required()),
            ORG_MEMBERS,
        ),
    ]
}

fn create_ration(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let created = ctx.create("ration", &args.to_props(RATION_FIELDS))?;
    ctx.emit(
        "rationCreatedLog",
        json!({
            "key": created.key(),
            "message": format!("New ration created: {}", args.str("id")?),
        }),
    )?;
    Ok(created.to_json())
}

fn update_ration(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let key = key_arg(ctx, args, "ration", "id")?;
    let updated = ctx.update(&key, &args.to_props(RATION_FIELDS))?;
    ctx.emit(
        "rationUpdatedLog",
        json!({
            "key": updated.key(),
            "message": format!("Ration updated: {}", args.str("id")?),
        }),
    )?;
    Ok(updated.to_json())
}

fn read_ration(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let key = key_arg(ctx, args, "ration", "id")?;
    Ok(ctx.get(&key)?.to_json())
}

fn delete_ration(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let key = key_arg(ctx, args, "ration", "id")?;
    let deleted = ctx.delete(&key)?;
    ctx.emit(
        "rationDeletedLog",
        json!({
            "key": deleted.key(),
            "message": format!("Ration deleted: {}", args.str("id")?),
        }),
    )?;
    Ok(deleted.to_json())
}

fn buy_ration(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let card_number = args.str("rationCardNumber")?;
    let quantity = args.i64("quantity")?;
    if quantity <= 0 {
        return Err(LedgerError::invalid_argument(
            "quantity",
            LedgerError::invalid_value("quantity must be greater than 0"),
        ));
    }

    let holders = ctx.search(
        &Selector::asset_type("member")
            .with("rationCardNumber", JsonValue::String(card_number.to_string())),
    )?;
    let member = holders.into_iter().next().ok_or_else(|| {
        LedgerError::new(
            ErrorKind::NotFound,
            format!("no member holds ration card '{}'", card_number),
        )
    })?;

    if member.get("rationCardStatus").and_then(|v| v.as_str()) != Some("active") {
        return Err(
            LedgerError::new(ErrorKind::Forbidden, "ration card is not active")
                .with_tag("rationCardStatus"),
        );
    }
    if let Some(expiry) = member.get("rationCardExpiryDate").and_then(|v| v.as_timestamp()) {
        if expiry < ctx.timestamp() {
            return Err(
                LedgerError::new(ErrorKind::Forbidden, "ration card has expired")
                    .with_tag("rationCardExpiryDate"),
            );
        }
    }

    let ration_key = key_arg(ctx, args, "ration", "rationId")?;
    let ration = ctx.get(&ration_key)?;
    let stock = ration.get("quantity").and_then(|v| v.as_i64()).unwrap_or(0);
    if quantity > stock {
        return Err(LedgerError::out_of_range(format!(
            "requested {} but only {} in stock",
            quantity, stock
        ))
        .with_tag("quantity"));
    }

    let remaining = stock - quantity;
    if remaining == 0 {
        ctx.delete(&ration_key)?;
    } else {
        let mut stock_patch = Map::new();
        stock_patch.insert("quantity".into(), json!(remaining));
        // Stock belongs to the producers; the contract adjusts it on their behalf.
        ctx.update_as(ORG_PLATFORM, &ration_key, &stock_patch)?;
    }

    let category = ration.get("category").and_then(|v| v.as_i64());
    let ration_type = RATION_CATEGORIES
        .iter()
        .find(|(_, ordinal)| Some(*ordinal) == category)
        .map_or("Others", |(label, _)| *label);
    let location = ration
        .get("distributionPoint")
        .or_else(|| ration.get("distributedBy"))
        .and_then(|v| v.as_reference())
        .unwrap_or(ration.key())
        .to_string();

    let mut history = Map::new();
    history.insert(
        "rationDistributionHistory".into(),
        json!({
            "distributionID": ctx.tx_id().to_string(),
            "distributionDate": format_timestamp(&ctx.timestamp()),
            "rationType": ration_type,
            "quantity": quantity,
            "distributedTo": member.canonical("nid").unwrap_or_default(),
            "location": location,
        }),
    );
    ctx.update(member.key(), &history)?;

    ctx.emit(
        "rationPurchasedLog",
        json!({
            "member": member.key(),
            "ration": ration_key,
            "quantity": quantity,
            "remaining": remaining,
        }),
    )?;
    Ok(json!({
        "member": member.key(),
        "ration": ration_key,
        "quantity": quantity,
        "remaining": remaining,
    }))
}

fn rations_by_distribution_point(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let point_key = key_arg(ctx, args, "distributionPoint", "distributionPointId")?;
    ctx.get(&point_key)?;

    let rations = ctx.search(
        &Selector::asset_type("ration").with("distributionPoint", JsonValue::String(point_key.clone())),
    )?;
    let total_quantity: i64 = rations
        .iter()
        .filter_map(|r| r.get("quantity").and_then(|v| v.as_i64()))
        .sum();

    Ok(json!({
        "distributionPoint": point_key,
        "total": rations.len(),
        "totalQuantity": total_quantity,
        "rations": rations.iter().map(|r| r.to_json()).collect::<Vec<_>>(),
    }))
}
