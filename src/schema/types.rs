//! Asset type definitions
//!
//! An asset type is an ordered list of property schemas. Declaration order is
//! significant: it fixes the order of key parts and the order in which
//! properties are validated, so the first reported error is deterministic.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::{LedgerError, LedgerResult};
use crate::validation::ValidationContext;
use crate::value::Value;

/// Separator between the asset type tag and each key part
pub const KEY_SEPARATOR: char = ':';

/// Custom check run after a property parses. Returns a reason on failure.
pub type PropertyValidator = fn(&Value, &ValidationContext) -> Result<(), String>;

/// What a property holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PropertyType {
    /// A value parsed by a registered data type
    DataType { tag: String },
    /// Key of one asset of the target type
    Reference { target: String },
    /// Keys of zero or more assets of the target type
    ReferenceList { target: String },
}

impl PropertyType {
    pub fn data_type(tag: impl Into<String>) -> Self {
        PropertyType::DataType { tag: tag.into() }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        PropertyType::Reference {
            target: target.into(),
        }
    }

    pub fn reference_list(target: impl Into<String>) -> Self {
        PropertyType::ReferenceList {
            target: target.into(),
        }
    }

    /// Target asset type for reference kinds
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            PropertyType::DataType { .. } => None,
            PropertyType::Reference { target } | PropertyType::ReferenceList { target } => {
                Some(target)
            }
        }
    }

    /// Short human-readable name, e.g. `->ration` or `[]->ration`
    pub fn type_name(&self) -> String {
        match self {
            PropertyType::DataType { tag } => tag.clone(),
            PropertyType::Reference { target } => format!("->{}", target),
            PropertyType::ReferenceList { target } => format!("[]->{}", target),
        }
    }
}

/// One property of an asset type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    pub tag: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub data_type: PropertyType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_key: bool,
    /// Organizations allowed to set this property; empty means anyone
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    #[serde(skip)]
    pub validator: Option<PropertyValidator>,
}

impl PropertySchema {
    /// Create an optional property with no writer restriction
    pub fn new(tag: impl Into<String>, label: impl Into<String>, data_type: PropertyType) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            description: String::new(),
            data_type,
            required: false,
            is_key: false,
            writers: Vec::new(),
            default_value: None,
            validator: None,
        }
    }

    /// Mark as key. Key properties are always required.
    pub fn key(mut self) -> Self {
        self.is_key = true;
        self.required = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn writers(mut self, writers: &[&str]) -> Self {
        self.writers = writers.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn default_value(mut self, value: JsonValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn validator(mut self, validator: PropertyValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Whether `org` may set this property
    pub fn can_write(&self, org: &str) -> bool {
        self.writers.is_empty() || self.writers.iter().any(|w| w == org)
    }
}

/// Schema of one asset type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTypeSchema {
    pub tag: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub properties: Vec<PropertySchema>,
}

impl AssetTypeSchema {
    pub fn new(
        tag: impl Into<String>,
        label: impl Into<String>,
        properties: Vec<PropertySchema>,
    ) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            description: String::new(),
            properties,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn property(&self, tag: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.tag == tag)
    }

    /// Key properties in declaration order
    pub fn key_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties.iter().filter(|p| p.is_key)
    }

    /// Validates the schema structure itself (not an instance)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.tag.is_empty() || self.tag.starts_with('@') || self.tag.contains(KEY_SEPARATOR) {
            return Err(format!("invalid asset type tag '{}'", self.tag));
        }

        let mut seen = HashSet::new();
        for property in &self.properties {
            if property.tag.is_empty() || property.tag.starts_with('@') {
                return Err(format!("invalid property tag '{}'", property.tag));
            }
            if !seen.insert(property.tag.as_str()) {
                return Err(format!("duplicate property tag '{}'", property.tag));
            }
            if property.is_key {
                if !property.required {
                    return Err(format!("key property '{}' must be required", property.tag));
                }
                if matches!(property.data_type, PropertyType::ReferenceList { .. }) {
                    return Err(format!(
                        "key property '{}' cannot be a reference list",
                        property.tag
                    ));
                }
            }
        }

        if self.key_properties().next().is_none() {
            return Err(format!("asset type '{}' has no key property", self.tag));
        }

        Ok(())
    }

    /// Derive the ledger key from the canonical forms of the key properties
    ///
    /// Key parts are joined in declaration order and prefixed with the type
    /// tag, e.g. `ration:R-001`. A `:` or `%` inside a part is percent-encoded
    /// so distinct key tuples never share a key.
    pub fn derive_key<'a, F>(&self, canonical_of: F) -> LedgerResult<String>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut key = self.tag.clone();
        for property in self.key_properties() {
            let part = canonical_of(&property.tag)
                .ok_or_else(|| LedgerError::missing_required(&property.tag))?;
            key.push(KEY_SEPARATOR);
            push_key_part(&mut key, part);
        }
        Ok(key)
    }
}

fn push_key_part(key: &mut String, part: &str) {
    for c in part.chars() {
        match c {
            '%' => key.push_str("%25"),
            KEY_SEPARATOR => key.push_str("%3A"),
            c => key.push(c),
        }
    }
}

/// Asset type tag encoded in a ledger key
pub fn asset_type_of_key(key: &str) -> &str {
    key.split(KEY_SEPARATOR).next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ration_like() -> AssetTypeSchema {
        AssetTypeSchema::new(
            "lot",
            "Lot",
            vec![
                PropertySchema::new("warehouse", "Warehouse", PropertyType::data_type("string")).key(),
                PropertySchema::new("batch", "Batch", PropertyType::data_type("integer")).key(),
                PropertySchema::new("note", "Note", PropertyType::data_type("string")),
            ],
        )
    }

    #[test]
    fn test_key_parts_follow_declaration_order() {
        let schema = ration_like();
        let values: HashMap<&str, &str> = [("batch", "7"), ("warehouse", "north"), ("note", "x")]
            .into_iter()
            .collect();
        let key = schema.derive_key(|tag| values.get(tag).copied()).unwrap();
        assert_eq!(key, "lot:north:7");
        assert_eq!(asset_type_of_key(&key), "lot");
    }

    #[test]
    fn test_separator_inside_key_part_is_escaped() {
        let schema = ration_like();
        let first: HashMap<&str, &str> = [("warehouse", "x:y"), ("batch", "z")].into_iter().collect();
        let second: HashMap<&str, &str> = [("warehouse", "x"), ("batch", "y:z")].into_iter().collect();

        let a = schema.derive_key(|tag| first.get(tag).copied()).unwrap();
        let b = schema.derive_key(|tag| second.get(tag).copied()).unwrap();
        assert_eq!(a, "lot:x%3Ay:z");
        assert_eq!(b, "lot:x:y%3Az");

        let percent: HashMap<&str, &str> = [("warehouse", "x%3Ay"), ("batch", "z")].into_iter().collect();
        let c = schema.derive_key(|tag| percent.get(tag).copied()).unwrap();
        assert_eq!(c, "lot:x%253Ay:z");
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_key_part() {
        let schema = ration_like();
        let err = schema.derive_key(|_| None).unwrap_err();
        assert_eq!(err.tag(), Some("warehouse"));
    }

    #[test]
    fn test_structure_requires_a_key() {
        let schema = AssetTypeSchema::new(
            "note",
            "Note",
            vec![PropertySchema::new("text", "Text", PropertyType::data_type("string"))],
        );
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_structure_rejects_duplicate_tags() {
        let mut schema = ration_like();
        schema
            .properties
            .push(PropertySchema::new("note", "Again", PropertyType::data_type("string")));
        let err = schema.validate_structure().unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_property_type_json_shape() {
        let json = serde_json::to_value(PropertyType::reference_list("ration")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "referenceList", "target": "ration"}));
        assert_eq!(PropertyType::reference("distributor").type_name(), "->distributor");
    }

    #[test]
    fn test_can_write() {
        let open = PropertySchema::new("a", "A", PropertyType::data_type("string"));
        assert!(open.can_write("anyMSP"));

        let restricted = open.writers(&["org2MSP"]);
        assert!(restricted.can_write("org2MSP"));
        assert!(!restricted.can_write("org1MSP"));
    }
}
