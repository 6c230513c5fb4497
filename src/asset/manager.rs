//! Asset instance manager
//!
//! Creates, patches, deletes and reads assets through a [`TxStub`]. All
//! validation goes through the same [`Validator`] on every path, so a value
//! accepted by `create` is accepted by `update` and vice versa.

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::AssetInstance;
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::{Selector, TxStub};
use crate::schema::{AssetTypeRegistry, AssetTypeSchema};
use crate::validation::{check_declared, Validator};

pub struct AssetManager<'a> {
    asset_types: &'a AssetTypeRegistry,
    validator: Validator<'a>,
}

impl<'a> AssetManager<'a> {
    pub fn new(asset_types: &'a AssetTypeRegistry, validator: Validator<'a>) -> Self {
        Self {
            asset_types,
            validator,
        }
    }

    pub fn validator(&self) -> &Validator<'a> {
        &self.validator
    }

    pub fn schema(&self, asset_type: &str) -> LedgerResult<&'a AssetTypeSchema> {
        self.asset_types.lookup(asset_type)
    }

    /// Validates and inserts a new asset. Fails if its key is taken.
    pub fn create(
        &self,
        stub: &mut TxStub<'_>,
        asset_type: &str,
        raw_props: &Map<String, JsonValue>,
        caller_org: &str,
    ) -> LedgerResult<AssetInstance> {
        let schema = self.schema(asset_type)?;
        let instance = self.validator.validate_asset(schema, raw_props, caller_org)?;

        for (tag, parsed) in instance.props() {
            ensure_references_exist(stub, tag, parsed.value.referenced_keys())?;
        }

        if stub.exists(instance.key())? {
            return Err(LedgerError::already_exists(instance.key()));
        }

        stub.put(instance.key(), instance.to_record());
        debug!(key = %instance.key(), "asset staged for create");
        Ok(instance)
    }

    /// Reads and decodes one asset
    pub fn get(&self, stub: &mut TxStub<'_>, key: &str) -> LedgerResult<AssetInstance> {
        let record = stub.get(key)?.ok_or_else(|| LedgerError::not_found(key))?;
        self.validator.decode_record(&record)
    }

    /// Applies a partial patch.
    ///
    /// Only properties present in the patch are validated and changed. A JSON
    /// `null` clears an optional property. Key properties may be repeated with
    /// their current value but never changed.
    pub fn update(
        &self,
        stub: &mut TxStub<'_>,
        key: &str,
        patch: &Map<String, JsonValue>,
        caller_org: &str,
    ) -> LedgerResult<AssetInstance> {
        let mut instance = self.get(stub, key)?;
        let schema = self.schema(instance.asset_type())?;
        check_declared(schema, patch)?;

        for property in &schema.properties {
            let Some(raw) = patch.get(&property.tag) else {
                continue;
            };

            if property.is_key {
                let unchanged = !raw.is_null()
                    && self
                        .validator
                        .parse_typed(&property.data_type, raw)
                        .map(|p| Some(p.canonical.as_str()) == instance.canonical(&property.tag))
                        .unwrap_or(false);
                if !unchanged {
                    return Err(LedgerError::immutable_key(&property.tag));
                }
                continue;
            }

            if raw.is_null() {
                if property.required {
                    return Err(LedgerError::missing_required(&property.tag));
                }
                if !property.can_write(caller_org) {
                    return Err(LedgerError::forbidden(&property.tag, caller_org));
                }
                instance.remove(&property.tag);
                continue;
            }

            if let Some(parsed) = self
                .validator
                .validate_property(property, Some(raw), caller_org)?
            {
                ensure_references_exist(stub, &property.tag, parsed.value.referenced_keys())?;
                instance.set(property.tag.clone(), parsed);
            }
        }

        stub.put(instance.key(), instance.to_record());
        debug!(key = %instance.key(), fields = patch.len(), "asset staged for update");
        Ok(instance)
    }

    /// Removes an asset. Referencing assets are left as they are.
    pub fn delete(&self, stub: &mut TxStub<'_>, key: &str) -> LedgerResult<AssetInstance> {
        let instance = self.get(stub, key)?;
        stub.delete(key);
        debug!(key = %key, "asset staged for delete");
        Ok(instance)
    }

    /// Every asset whose stored record matches the selector
    pub fn search(&self, stub: &mut TxStub<'_>, selector: &Selector) -> LedgerResult<Vec<AssetInstance>> {
        stub.range_query(selector)?
            .iter()
            .map(|(_, record)| self.validator.decode_record(record))
            .collect()
    }
}

fn ensure_references_exist(stub: &mut TxStub<'_>, tag: &str, keys: Vec<&str>) -> LedgerResult<()> {
    for key in keys {
        if !stub.exists(key)? {
            return Err(LedgerError::dangling_reference(key).with_tag(tag));
        }
    }
    Ok(())
}
