//! Property and asset validation
//!
//! Each property goes through the same steps, in order:
//! 1. absence: required fails, otherwise the default is substituted or the
//!    property is skipped
//! 2. writer ACL
//! 3. data type parse (or reference resolution to a key)
//! 4. custom validator
//!
//! Properties are checked sequentially in declaration order and the first
//! failure wins.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use super::ValidationContext;
use crate::asset::{AssetInstance, ASSET_TYPE_FIELD, KEY_FIELD};
use crate::datatype::{encoding_name, DataTypeRegistry, Parsed};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::schema::{asset_type_of_key, AssetTypeRegistry, AssetTypeSchema, PropertySchema, PropertyType, KEY_SEPARATOR};
use crate::value::Value;

/// Validates raw input against asset type schemas.
///
/// Holds only shared references; cheap to build per invocation.
pub struct Validator<'a> {
    datatypes: &'a DataTypeRegistry,
    asset_types: &'a AssetTypeRegistry,
    ctx: &'a ValidationContext,
}

impl<'a> Validator<'a> {
    pub fn new(
        datatypes: &'a DataTypeRegistry,
        asset_types: &'a AssetTypeRegistry,
        ctx: &'a ValidationContext,
    ) -> Self {
        Self {
            datatypes,
            asset_types,
            ctx,
        }
    }

    pub fn context(&self) -> &ValidationContext {
        self.ctx
    }

    /// Validates one property value on behalf of `caller_org`.
    ///
    /// Returns `Ok(None)` when the value is absent, optional and has no default.
    /// JSON `null` counts as absent.
    pub fn validate_property(
        &self,
        property: &PropertySchema,
        raw: Option<&JsonValue>,
        caller_org: &str,
    ) -> LedgerResult<Option<Parsed>> {
        let raw = match raw.filter(|v| !v.is_null()) {
            Some(v) => v,
            None if property.required => return Err(LedgerError::missing_required(&property.tag)),
            None => match &property.default_value {
                Some(default) => default,
                None => return Ok(None),
            },
        };

        if !property.can_write(caller_org) {
            return Err(LedgerError::forbidden(&property.tag, caller_org));
        }

        let parsed = self
            .parse_typed(&property.data_type, raw)
            .map_err(|e| tag_if_untagged(e, &property.tag))?;

        if let Some(validator) = property.validator {
            validator(&parsed.value, self.ctx)
                .map_err(|reason| LedgerError::invalid_value(reason).with_tag(&property.tag))?;
        }

        Ok(Some(parsed))
    }

    /// Validates a full property map into an asset instance with its key.
    pub fn validate_asset(
        &self,
        schema: &AssetTypeSchema,
        raw_props: &Map<String, JsonValue>,
        caller_org: &str,
    ) -> LedgerResult<AssetInstance> {
        check_declared(schema, raw_props)?;

        let mut props = BTreeMap::new();
        for property in &schema.properties {
            if let Some(parsed) = self.validate_property(property, raw_props.get(&property.tag), caller_org)? {
                props.insert(property.tag.clone(), parsed);
            }
        }

        let key = schema.derive_key(|tag| props.get(tag).map(|p: &Parsed| p.canonical.as_str()))?;
        Ok(AssetInstance::new(schema.tag.clone(), key, props))
    }

    /// Rebuilds an instance from a stored record.
    ///
    /// Stored values are canonical, so they parse back to the same typed
    /// values. ACLs and custom validators are not re-run: they applied when
    /// the record was written.
    pub fn decode_record(&self, record: &JsonValue) -> LedgerResult<AssetInstance> {
        let fields = record
            .as_object()
            .ok_or_else(|| LedgerError::storage("stored record is not a JSON object"))?;
        let asset_type = fields
            .get(ASSET_TYPE_FIELD)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| LedgerError::storage("stored record has no @assetType"))?;
        let key = fields
            .get(KEY_FIELD)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| LedgerError::storage("stored record has no @key"))?;
        let schema = self.asset_types.lookup(asset_type)?;

        let mut props = BTreeMap::new();
        for property in &schema.properties {
            if let Some(stored) = fields.get(&property.tag) {
                let parsed = self
                    .parse_typed(&property.data_type, stored)
                    .map_err(|e| tag_if_untagged(e, &property.tag))?;
                props.insert(property.tag.clone(), parsed);
            }
        }

        Ok(AssetInstance::new(asset_type, key, props))
    }

    /// Parses a raw value for any property kind, without ACL or validator.
    pub fn parse_typed(&self, data_type: &PropertyType, raw: &JsonValue) -> LedgerResult<Parsed> {
        match data_type {
            PropertyType::DataType { tag } => self.datatypes.parse(tag, raw),
            PropertyType::Reference { target } => {
                let key = self.resolve_reference(target, raw)?;
                Ok(Parsed::new(key.clone(), Value::Reference(key)))
            }
            PropertyType::ReferenceList { target } => {
                let keys = self.resolve_reference_list(target, raw)?;
                let canonical = serde_json::to_string(&keys)
                    .map_err(|e| LedgerError::invalid_format(e.to_string()))?;
                Ok(Parsed::new(canonical, Value::References(keys)))
            }
        }
    }

    /// Turns a reference encoding into the target asset's key.
    ///
    /// Accepted encodings:
    /// - the full key, `<target>:<parts>`
    /// - `{"@key": "<key>"}`
    /// - an object holding the target's key properties
    /// - for single-key targets, the bare key value
    ///
    /// Existence is not checked here.
    pub fn resolve_reference(&self, target: &str, raw: &JsonValue) -> LedgerResult<String> {
        let schema = self.asset_types.lookup(target)?;
        match raw {
            JsonValue::String(s) => self.key_from_string(schema, s),
            JsonValue::Object(fields) => {
                if let Some(declared) = fields.get(ASSET_TYPE_FIELD) {
                    if declared.as_str() != Some(target) {
                        return Err(LedgerError::invalid_value(format!(
                            "reference must point to a {}",
                            target
                        )));
                    }
                }
                match fields.get(KEY_FIELD) {
                    Some(JsonValue::String(key)) => self.key_from_string(schema, key),
                    Some(other) => Err(LedgerError::invalid_format(format!(
                        "@key must be a string, got {}",
                        encoding_name(other)
                    ))),
                    None => self.key_from_fields(schema, fields),
                }
            }
            other => Err(LedgerError::invalid_format(format!(
                "reference to {} expects a key string or object, got {}",
                target,
                encoding_name(other)
            ))),
        }
    }

    fn resolve_reference_list(&self, target: &str, raw: &JsonValue) -> LedgerResult<Vec<String>> {
        let decoded;
        let items = match raw {
            JsonValue::Array(items) => items,
            JsonValue::String(s) => {
                decoded = serde_json::from_str::<JsonValue>(s).map_err(|_| {
                    LedgerError::invalid_format(format!("list of {} references must be an array", target))
                })?;
                decoded.as_array().ok_or_else(|| {
                    LedgerError::invalid_format(format!("list of {} references must be an array", target))
                })?
            }
            other => {
                return Err(LedgerError::invalid_format(format!(
                    "list of {} references expects an array, got {}",
                    target,
                    encoding_name(other)
                )))
            }
        };

        items
            .iter()
            .map(|item| self.resolve_reference(target, item))
            .collect()
    }

    fn key_from_string(&self, schema: &AssetTypeSchema, s: &str) -> LedgerResult<String> {
        let prefix = format!("{}{}", schema.tag, KEY_SEPARATOR);
        if let Some(rest) = s.strip_prefix(&prefix) {
            if rest.is_empty() {
                return Err(LedgerError::invalid_value(format!(
                    "'{}' is not a well-formed {} key",
                    s, schema.tag
                )));
            }
            return Ok(s.to_string());
        }

        if s.contains(KEY_SEPARATOR) && self.asset_types.contains(asset_type_of_key(s)) {
            return Err(LedgerError::invalid_value(format!(
                "reference must point to a {}, got '{}'",
                schema.tag, s
            )));
        }

        let mut keys = schema.key_properties();
        match (keys.next(), keys.next()) {
            (Some(only), None) => {
                let parsed = self.parse_typed(&only.data_type, &JsonValue::String(s.to_string()))?;
                schema.derive_key(|tag| (tag == only.tag).then_some(parsed.canonical.as_str()))
            }
            _ => Err(LedgerError::invalid_value(format!(
                "'{}' is not a {} key",
                s, schema.tag
            ))),
        }
    }

    fn key_from_fields(&self, schema: &AssetTypeSchema, fields: &Map<String, JsonValue>) -> LedgerResult<String> {
        let mut parts = BTreeMap::new();
        for property in schema.key_properties() {
            let raw = fields
                .get(&property.tag)
                .filter(|v| !v.is_null())
                .ok_or_else(|| LedgerError::missing_required(&property.tag))?;
            let parsed = self
                .parse_typed(&property.data_type, raw)
                .map_err(|e| tag_if_untagged(e, &property.tag))?;
            parts.insert(property.tag.as_str(), parsed.canonical);
        }
        schema.derive_key(|tag| parts.get(tag).map(String::as_str))
    }
}

/// Rejects properties the schema does not declare
pub(crate) fn check_declared(schema: &AssetTypeSchema, raw_props: &Map<String, JsonValue>) -> LedgerResult<()> {
    if let Some(declared) = raw_props.get(ASSET_TYPE_FIELD) {
        if declared.as_str() != Some(schema.tag.as_str()) {
            return Err(LedgerError::invalid_value(format!(
                "@assetType does not match '{}'",
                schema.tag
            ))
            .with_tag(ASSET_TYPE_FIELD));
        }
    }
    for tag in raw_props.keys() {
        if tag == ASSET_TYPE_FIELD || tag == KEY_FIELD {
            continue;
        }
        if schema.property(tag).is_none() {
            return Err(LedgerError::new(
                ErrorKind::InvalidValue,
                format!("'{}' does not declare this property", schema.tag),
            )
            .with_tag(tag.clone()));
        }
    }
    Ok(())
}

fn tag_if_untagged(err: LedgerError, tag: &str) -> LedgerError {
    if err.tag().is_some() {
        err
    } else {
        err.with_tag(tag)
    }
}
