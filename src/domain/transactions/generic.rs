//! Schema-driven CRUD over any registered asset type

use serde_json::{json, Value as JsonValue};

use super::arg;
use crate::asset::ASSET_TYPE_FIELD;
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::Selector;
use crate::transaction::{Args, TransactionDefinition, TxContext};
use crate::value::Value;

pub(super) fn transactions() -> Vec<TransactionDefinition> {
    vec![
        TransactionDefinition::new("createAsset", "Create Asset", "POST", create_asset)
            .description("Create an asset of the type named by its @assetType")
            .arg(arg("asset", "Asset", "@object").required()),
        TransactionDefinition::new("readAsset", "Read Asset", "GET", read_asset)
            .arg(arg("key", "Key", "@key").required()),
        TransactionDefinition::new("updateAsset", "Update Asset", "PUT", update_asset)
            .description("Patch the properties present in the update; the rest stay as they are")
            .arg(arg("update", "Update", "@object").required()),
        TransactionDefinition::new("deleteAsset", "Delete Asset", "DELETE", delete_asset)
            .arg(arg("key", "Key", "@key").required()),
        TransactionDefinition::new("search", "Search", "GET", search)
            .description("Every asset whose stored fields equal the selector's")
            .arg(arg("selector", "Selector", "@object").required()),
    ]
}

fn create_asset(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let asset = args.record("asset")?;
    let props = asset
        .as_object()
        .ok_or_else(|| LedgerError::invalid_format("asset must be an object").with_tag("asset"))?;
    let asset_type = props
        .get(ASSET_TYPE_FIELD)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            LedgerError::invalid_argument("asset", LedgerError::missing_required(ASSET_TYPE_FIELD))
        })?;

    Ok(ctx.create(asset_type, props)?.to_json())
}

fn read_asset(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let key = ctx.key_of(args.value("key")?)?;
    Ok(ctx.get(&key)?.to_json())
}

fn update_asset(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let update = args.record("update")?;
    let patch = update
        .as_object()
        .ok_or_else(|| LedgerError::invalid_format("update must be an object").with_tag("update"))?;
    let key = ctx.key_of(&Value::Record(update.clone()))?;
    Ok(ctx.update(&key, patch)?.to_json())
}

fn delete_asset(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let key = ctx.key_of(args.value("key")?)?;
    Ok(ctx.delete(&key)?.to_json())
}

fn search(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let selector = Selector::from_json(args.record("selector")?)
        .map_err(|e| LedgerError::invalid_argument("selector", e))?;
    let found: Vec<JsonValue> = ctx.search(&selector)?.iter().map(|a| a.to_json()).collect();
    Ok(json!({ "count": found.len(), "result": found }))
}
