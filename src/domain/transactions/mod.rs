//! Transaction catalog
//!
//! Generic asset transactions are open to any authenticated caller; property
//! writer ACLs still apply to what they write. Domain transactions admit a
//! specific organization's admins plus the platform admin.

mod distribution;
mod generic;
mod members;
mod rations;

use serde_json::Value as JsonValue;

use super::{ORG_PLATFORM, ROLE_ADMIN};
use crate::errors::{LedgerError, LedgerResult};
use crate::schema::PropertyType;
use crate::transaction::{Args, ArgumentSchema, CallerPattern, TransactionDefinition, TxContext};

pub fn transactions() -> Vec<TransactionDefinition> {
    let mut all = generic::transactions();
    all.extend(members::transactions());
    all.extend(distribution::transactions());
    all.extend(rations::transactions());
    all
}

/// `org` admins and the platform admin
fn admins_of(tx: TransactionDefinition, org: &str) -> TransactionDefinition {
    tx.caller(CallerPattern::new(org, ROLE_ADMIN))
        .caller(CallerPattern::new(ORG_PLATFORM, ROLE_ADMIN))
}

fn arg(tag: &str, label: &str, data_type: &str) -> ArgumentSchema {
    ArgumentSchema::new(tag, label, PropertyType::data_type(data_type))
}

/// Key of `asset_type` named by a string argument: a full key or the bare
/// key value.
fn key_arg(ctx: &TxContext<'_>, args: &Args, asset_type: &str, tag: &str) -> LedgerResult<String> {
    let raw = JsonValue::String(args.str(tag)?.to_string());
    ctx.resolve(asset_type, &raw)
        .map_err(|e| LedgerError::invalid_argument(tag, e))
}
