//! In-memory asset instance and its ledger encoding

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use crate::datatype::Parsed;
use crate::value::Value;

/// Reserved record field naming the asset type
pub const ASSET_TYPE_FIELD: &str = "@assetType";
/// Reserved record field holding the derived key
pub const KEY_FIELD: &str = "@key";

/// A validated asset: typed values plus their canonical forms
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInstance {
    asset_type: String,
    key: String,
    props: BTreeMap<String, Parsed>,
}

impl AssetInstance {
    pub fn new(
        asset_type: impl Into<String>,
        key: impl Into<String>,
        props: BTreeMap<String, Parsed>,
    ) -> Self {
        Self {
            asset_type: asset_type.into(),
            key: key.into(),
            props,
        }
    }

    pub fn asset_type(&self) -> &str {
        &self.asset_type
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.props.get(tag).map(|p| &p.value)
    }

    pub fn canonical(&self, tag: &str) -> Option<&str> {
        self.props.get(tag).map(|p| p.canonical.as_str())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.props.contains_key(tag)
    }

    pub fn props(&self) -> impl Iterator<Item = (&str, &Parsed)> {
        self.props.iter().map(|(tag, parsed)| (tag.as_str(), parsed))
    }

    pub(crate) fn set(&mut self, tag: impl Into<String>, parsed: Parsed) {
        self.props.insert(tag.into(), parsed);
    }

    pub(crate) fn remove(&mut self, tag: &str) -> Option<Parsed> {
        self.props.remove(tag)
    }

    /// Flat ledger record: tag to canonical string, reference lists as arrays
    pub fn to_record(&self) -> JsonValue {
        let mut record = Map::new();
        record.insert(ASSET_TYPE_FIELD.into(), JsonValue::String(self.asset_type.clone()));
        record.insert(KEY_FIELD.into(), JsonValue::String(self.key.clone()));
        for (tag, parsed) in &self.props {
            let stored = match &parsed.value {
                Value::References(_) => parsed.value.to_json(),
                _ => JsonValue::String(parsed.canonical.clone()),
            };
            record.insert(tag.clone(), stored);
        }
        JsonValue::Object(record)
    }

    /// Typed JSON view for responses
    pub fn to_json(&self) -> JsonValue {
        let mut out = Map::new();
        out.insert(ASSET_TYPE_FIELD.into(), JsonValue::String(self.asset_type.clone()));
        out.insert(KEY_FIELD.into(), JsonValue::String(self.key.clone()));
        for (tag, parsed) in &self.props {
            out.insert(tag.clone(), parsed.value.to_json());
        }
        JsonValue::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> AssetInstance {
        let mut props = BTreeMap::new();
        props.insert("id".to_string(), Parsed::new("R1", Value::String("R1".into())));
        props.insert("quantity".to_string(), Parsed::new("25", Value::Integer(25)));
        props.insert(
            "rations".to_string(),
            Parsed::new(
                r#"["ration:R1"]"#,
                Value::References(vec!["ration:R1".into()]),
            ),
        );
        AssetInstance::new("inventory", "inventory:R1", props)
    }

    #[test]
    fn test_record_holds_canonical_strings() {
        let record = sample().to_record();
        assert_eq!(record["@assetType"], json!("inventory"));
        assert_eq!(record["@key"], json!("inventory:R1"));
        assert_eq!(record["quantity"], json!("25"));
        assert_eq!(record["rations"], json!(["ration:R1"]));
    }

    #[test]
    fn test_json_view_is_typed() {
        let view = sample().to_json();
        assert_eq!(view["quantity"], json!(25));
    }
}
