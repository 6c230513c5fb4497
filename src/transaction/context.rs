//! What a routine sees while it runs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;

use super::definition::Caller;
use crate::asset::{AssetInstance, AssetManager, ASSET_TYPE_FIELD, KEY_FIELD};
use crate::datatype::Parsed;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::EventRegistry;
use crate::ledger::{Selector, TxStub, WriteSet};
use crate::value::{format_timestamp, Value};

/// Validated transaction arguments, by tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<String, Parsed>,
}

impl Args {
    pub fn new(values: BTreeMap<String, Parsed>) -> Self {
        Self { values }
    }

    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.values.get(tag).map(|p| &p.value)
    }

    pub fn canonical(&self, tag: &str) -> Option<&str> {
        self.values.get(tag).map(|p| p.canonical.as_str())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.values.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Like [`Args::get`], but a missing argument is `MissingRequired`
    pub fn value(&self, tag: &str) -> LedgerResult<&Value> {
        self.get(tag).ok_or_else(|| LedgerError::missing_required(tag))
    }

    pub fn str(&self, tag: &str) -> LedgerResult<&str> {
        self.value(tag)?
            .as_str()
            .ok_or_else(|| LedgerError::invalid_format("expected a string").with_tag(tag))
    }

    pub fn i64(&self, tag: &str) -> LedgerResult<i64> {
        self.value(tag)?
            .as_i64()
            .ok_or_else(|| LedgerError::invalid_format("expected an integer").with_tag(tag))
    }

    pub fn reference(&self, tag: &str) -> LedgerResult<&str> {
        self.value(tag)?
            .as_reference()
            .ok_or_else(|| LedgerError::invalid_format("expected a reference").with_tag(tag))
    }

    pub fn references(&self, tag: &str) -> LedgerResult<&[String]> {
        self.value(tag)?
            .as_references()
            .ok_or_else(|| LedgerError::invalid_format("expected a reference list").with_tag(tag))
    }

    pub fn record(&self, tag: &str) -> LedgerResult<&JsonValue> {
        self.value(tag)?
            .as_record()
            .ok_or_else(|| LedgerError::invalid_format("expected an object").with_tag(tag))
    }

    /// The named arguments that were supplied, as a property map.
    ///
    /// Values are re-encoded from their typed form, which every parser
    /// accepts back.
    pub fn to_props(&self, tags: &[&str]) -> Map<String, JsonValue> {
        tags.iter()
            .filter_map(|tag| self.get(tag).map(|v| (tag.to_string(), v.to_json())))
            .collect()
    }
}

/// An event requested by a routine, delivered after commit
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub tag: String,
    pub payload: JsonValue,
}

/// Per-invocation handle given to routines.
///
/// Every ledger access goes through the invocation's [`TxStub`], so nothing
/// reaches the ledger until the engine commits the resulting write set.
pub struct TxContext<'a> {
    tx_id: Uuid,
    caller: &'a Caller,
    timestamp: DateTime<Utc>,
    assets: AssetManager<'a>,
    stub: TxStub<'a>,
    events: &'a EventRegistry,
    pending: Vec<PendingEvent>,
}

impl<'a> TxContext<'a> {
    pub fn new(
        tx_id: Uuid,
        caller: &'a Caller,
        timestamp: DateTime<Utc>,
        assets: AssetManager<'a>,
        stub: TxStub<'a>,
        events: &'a EventRegistry,
    ) -> Self {
        Self {
            tx_id,
            caller,
            timestamp,
            assets,
            stub,
            events,
            pending: Vec::new(),
        }
    }

    pub fn tx_id(&self) -> Uuid {
        self.tx_id
    }

    pub fn caller(&self) -> &Caller {
        self.caller
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn create(&mut self, asset_type: &str, props: &Map<String, JsonValue>) -> LedgerResult<AssetInstance> {
        self.assets.create(&mut self.stub, asset_type, props, &self.caller.org)
    }

    pub fn get(&mut self, key: &str) -> LedgerResult<AssetInstance> {
        self.assets.get(&mut self.stub, key)
    }

    pub fn exists(&mut self, key: &str) -> LedgerResult<bool> {
        self.stub.exists(key)
    }

    pub fn update(&mut self, key: &str, patch: &Map<String, JsonValue>) -> LedgerResult<AssetInstance> {
        self.assets.update(&mut self.stub, key, patch, &self.caller.org)
    }

    /// Patch under another organization's write rights.
    ///
    /// For side effects the contract itself performs, such as the stock
    /// decrement of a purchase.
    pub fn update_as(&mut self, org: &str, key: &str, patch: &Map<String, JsonValue>) -> LedgerResult<AssetInstance> {
        self.assets.update(&mut self.stub, key, patch, org)
    }

    pub fn delete(&mut self, key: &str) -> LedgerResult<AssetInstance> {
        self.assets.delete(&mut self.stub, key)
    }

    pub fn search(&mut self, selector: &Selector) -> LedgerResult<Vec<AssetInstance>> {
        self.assets.search(&mut self.stub, selector)
    }

    /// Resolves any reference encoding to a key of `target`
    pub fn resolve(&self, target: &str, raw: &JsonValue) -> LedgerResult<String> {
        self.assets.validator().resolve_reference(target, raw)
    }

    /// Key addressed by an `@key` argument: a key string, `{"@key": ...}`, or
    /// `{"@assetType": ..., <key properties>}`.
    pub fn key_of(&self, value: &Value) -> LedgerResult<String> {
        match value {
            Value::String(key) => Ok(key.clone()),
            Value::Record(JsonValue::Object(fields)) => {
                if let Some(key) = fields.get(KEY_FIELD).and_then(JsonValue::as_str) {
                    return Ok(key.to_string());
                }
                let asset_type = fields
                    .get(ASSET_TYPE_FIELD)
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| LedgerError::invalid_value("object does not address an asset"))?;
                self.resolve(asset_type, &JsonValue::Object(fields.clone()))
            }
            _ => Err(LedgerError::invalid_format("expected an asset key")),
        }
    }

    /// Queues a registered event for delivery after commit.
    ///
    /// Unregistered tags fail the routine.
    pub fn emit(&mut self, tag: &str, data: JsonValue) -> LedgerResult<()> {
        let event = self.events.lookup(tag)?;
        let payload = json!({
            "txId": self.tx_id.to_string(),
            "event": event.tag,
            "label": event.label,
            "log": event.base_log,
            "receivers": event.receivers,
            "timestamp": format_timestamp(&self.timestamp),
            "data": data,
        });
        self.pending.push(PendingEvent {
            tag: event.tag.clone(),
            payload,
        });
        Ok(())
    }

    pub(crate) fn finish(self) -> (WriteSet, Vec<PendingEvent>) {
        (self.stub.into_write_set(), self.pending)
    }
}
