//! Transaction definitions and the registry that holds them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::context::{Args, TxContext};
use crate::datatype::DataTypeRegistry;
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::schema::{AssetTypeRegistry, PropertyType};

/// Routine body. Receives only validated arguments.
pub type Routine = fn(&mut TxContext<'_>, &Args) -> LedgerResult<JsonValue>;

/// Authenticated identity of an invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub org: String,
    pub role: String,
}

impl Caller {
    pub fn new(org: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            role: role.into(),
        }
    }
}

/// One allowed (organization, role) pair. No role admits every role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerPattern {
    pub org: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl CallerPattern {
    pub fn new(org: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            role: Some(role.into()),
        }
    }

    pub fn any_role(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            role: None,
        }
    }

    pub fn matches(&self, caller: &Caller) -> bool {
        self.org == caller.org && self.role.as_ref().map_or(true, |role| *role == caller.role)
    }
}

/// Argument schema: a property schema without key or writer information
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSchema {
    pub tag: String,
    pub label: String,
    pub description: String,
    pub data_type: PropertyType,
    pub required: bool,
}

impl ArgumentSchema {
    pub fn new(tag: impl Into<String>, label: impl Into<String>, data_type: PropertyType) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            description: String::new(),
            data_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDefinition {
    pub tag: String,
    pub label: String,
    pub description: String,
    /// HTTP-style verb, informational only
    pub method: String,
    pub args: Vec<ArgumentSchema>,
    /// Empty admits any authenticated caller
    pub callers: Vec<CallerPattern>,
    #[serde(skip)]
    pub routine: Routine,
}

impl TransactionDefinition {
    pub fn new(
        tag: impl Into<String>,
        label: impl Into<String>,
        method: impl Into<String>,
        routine: Routine,
    ) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            description: String::new(),
            method: method.into(),
            args: Vec::new(),
            callers: Vec::new(),
            routine,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn arg(mut self, arg: ArgumentSchema) -> Self {
        self.args.push(arg);
        self
    }

    pub fn caller(mut self, pattern: CallerPattern) -> Self {
        self.callers.push(pattern);
        self
    }

    pub fn allows(&self, caller: &Caller) -> bool {
        self.callers.is_empty() || self.callers.iter().any(|p| p.matches(caller))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionRegistry {
    transactions: BTreeMap<String, TransactionDefinition>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: TransactionDefinition) -> LedgerResult<()> {
        if self.transactions.contains_key(&definition.tag) {
            return Err(LedgerError::new(
                ErrorKind::AlreadyExists,
                format!("transaction '{}' is already registered", definition.tag),
            ));
        }
        self.transactions.insert(definition.tag.clone(), definition);
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> LedgerResult<&TransactionDefinition> {
        self.transactions.get(tag).ok_or_else(|| {
            LedgerError::new(
                ErrorKind::UnknownType,
                format!("transaction '{}' is not registered", tag),
            )
        })
    }

    /// Every argument must name a registered data type or asset type.
    pub fn verify(&self, datatypes: &DataTypeRegistry, asset_types: &AssetTypeRegistry) -> LedgerResult<()> {
        for definition in self.transactions.values() {
            for arg in &definition.args {
                let known = match &arg.data_type {
                    PropertyType::DataType { tag } => datatypes.lookup(tag).map(|_| ()),
                    PropertyType::Reference { target } | PropertyType::ReferenceList { target } => {
                        asset_types.lookup(target).map(|_| ())
                    }
                };
                known.map_err(|e| e.with_tag(format!("{}.{}", definition.tag, arg.tag)))?;
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransactionDefinition> {
        self.transactions.values()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut TxContext<'_>, _: &Args) -> LedgerResult<JsonValue> {
        Ok(JsonValue::Null)
    }

    #[test]
    fn test_caller_patterns() {
        let tx = TransactionDefinition::new("count", "Count", "GET", noop)
            .caller(CallerPattern::new("org1MSP", "admin"))
            .caller(CallerPattern::any_role("org2MSP"));

        assert!(tx.allows(&Caller::new("org1MSP", "admin")));
        assert!(!tx.allows(&Caller::new("org1MSP", "member")));
        assert!(tx.allows(&Caller::new("org2MSP", "member")));
        assert!(!tx.allows(&Caller::new("org3MSP", "admin")));
    }

    #[test]
    fn test_no_callers_admits_anyone() {
        let tx = TransactionDefinition::new("open", "Open", "GET", noop);
        assert!(tx.allows(&Caller::new("anyMSP", "client")));
    }

    #[test]
    fn test_registry_rejects_duplicates_and_unknown_arguments() {
        let mut registry = TransactionRegistry::new();
        registry
            .register(
                TransactionDefinition::new("count", "Count", "GET", noop)
                    .arg(ArgumentSchema::new("n", "N", PropertyType::data_type("decimal"))),
            )
            .unwrap();
        assert_eq!(
            registry
                .register(TransactionDefinition::new("count", "Count", "GET", noop))
                .unwrap_err()
                .kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(registry.lookup("sum").unwrap_err().kind(), ErrorKind::UnknownType);

        let datatypes = DataTypeRegistry::with_builtins().unwrap();
        let err = registry.verify(&datatypes, &AssetTypeRegistry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        assert_eq!(err.tag(), Some("count.n"));
    }
}
