//! Data type registry
//!
//! A data type is a named parsing contract: it declares the raw encodings it
//! accepts and turns a raw JSON value into a canonical string plus a typed
//! [`Value`]. Parsers are plain `fn` pointers, so they carry no state and can be
//! shared across threads freely.
//!
//! Every built-in parser:
//! - rejects encodings it does not declare with `InvalidFormat`
//! - decodes structure before running semantic checks
//! - accepts its own canonical output, so parsing is idempotent

mod enums;
mod identity;
mod primitives;
mod structured;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::value::Value;

pub use enums::{
    INSPECTION_STATUSES, PACKAGE_RAMADAN, PACKAGE_TYPES, RATION_CARD_CATEGORIES,
    RATION_CARD_STATUSES, RATION_CATEGORIES,
};
pub use identity::normalize_nid;
pub use primitives::{parse_integer_raw, parse_timestamp};

/// Parser signature shared by every data type
pub type ParseFn = fn(&JsonValue) -> LedgerResult<Parsed>;

/// Output of a successful parse
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Normalized string form, used for keys and storage
    pub canonical: String,
    pub value: Value,
}

impl Parsed {
    pub fn new(canonical: impl Into<String>, value: Value) -> Self {
        Self {
            canonical: canonical.into(),
            value,
        }
    }
}

/// A registered parsing contract
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataType {
    pub tag: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub accepted_formats: &'static [&'static str],
    /// Human label to ordinal, for enumerations
    #[serde(skip_serializing_if = "no_drop_down")]
    pub drop_down_values: &'static [(&'static str, i64)],
    #[serde(skip)]
    pub parse: ParseFn,
}

fn no_drop_down(values: &&'static [(&'static str, i64)]) -> bool {
    values.is_empty()
}

impl DataType {
    /// Run the parser
    pub fn parse(&self, raw: &JsonValue) -> LedgerResult<Parsed> {
        (self.parse)(raw)
    }
}

/// Process-wide map from type tag to data type
///
/// Built once at start-up, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct DataTypeRegistry {
    types: BTreeMap<&'static str, DataType>,
}

impl DataTypeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in type
    pub fn with_builtins() -> LedgerResult<Self> {
        let mut registry = Self::new();
        for data_type in primitives::builtins()
            .into_iter()
            .chain(enums::builtins())
            .chain(identity::builtins())
            .chain(structured::builtins())
        {
            registry.register(data_type)?;
        }
        Ok(registry)
    }

    /// Register a data type. Fails if the tag is taken.
    pub fn register(&mut self, data_type: DataType) -> LedgerResult<()> {
        if self.types.contains_key(data_type.tag) {
            return Err(LedgerError::new(
                ErrorKind::AlreadyExists,
                format!("data type '{}' is already registered", data_type.tag),
            ));
        }
        self.types.insert(data_type.tag, data_type);
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> LedgerResult<&DataType> {
        self.types
            .get(tag)
            .ok_or_else(|| LedgerError::unknown_type(tag))
    }

    /// Parse a raw value with the type registered under `tag`
    pub fn parse(&self, tag: &str, raw: &JsonValue) -> LedgerResult<Parsed> {
        self.lookup(tag)?.parse(raw)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Describe a raw JSON value's encoding for error messages
pub(crate) fn encoding_name(raw: &JsonValue) -> &'static str {
    match raw {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub(crate) fn expect_string<'a>(raw: &'a JsonValue, type_tag: &str) -> LedgerResult<&'a str> {
    raw.as_str().ok_or_else(|| {
        LedgerError::invalid_format(format!(
            "{} expects a string, got {}",
            type_tag,
            encoding_name(raw)
        ))
    })
}
