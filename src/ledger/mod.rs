//! Ledger store collaborators
//!
//! The engine talks to the ledger through [`Ledger`]: point reads, equality
//! range queries and an atomic optimistic commit. Each invocation works on a
//! [`TxStub`], which stages writes and remembers the version of every record it
//! read. At commit the ledger re-checks those versions; any change since the
//! read fails the whole write set with `Conflict`.

mod file;
mod memory;
mod stub;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::{LedgerError, LedgerResult};

pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use stub::TxStub;

/// Commit sequence number that last wrote a record
pub type Version = u64;

/// A stored record and the commit that wrote it
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRecord {
    pub record: JsonValue,
    pub version: Version,
}

/// Equality match over stored record fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector {
    fields: BTreeMap<String, JsonValue>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector matching every record of one asset type
    pub fn asset_type(tag: &str) -> Self {
        Self::new().with("@assetType", JsonValue::String(tag.to_string()))
    }

    pub fn with(mut self, field: impl Into<String>, value: JsonValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Build from a JSON object of field to expected value
    pub fn from_json(value: &JsonValue) -> LedgerResult<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| LedgerError::invalid_format("selector must be a JSON object"))?;
        Ok(Self {
            fields: fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    pub fn matches(&self, record: &JsonValue) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A staged change to one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "op", content = "record")]
pub enum Write {
    Put(JsonValue),
    Delete,
}

/// Everything one invocation read and wants to write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSet {
    /// Version observed per key; `None` means observed absent
    pub reads: BTreeMap<String, Option<Version>>,
    pub writes: BTreeMap<String, Write>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// The ledger store
pub trait Ledger: Send + Sync {
    fn get(&self, key: &str) -> LedgerResult<Option<VersionedRecord>>;

    /// Records matching the selector, ordered by key
    fn range_query(&self, selector: &Selector) -> LedgerResult<Vec<(String, VersionedRecord)>>;

    /// Apply every write or none. Fails `Conflict` if any read version moved.
    fn commit(&self, write_set: &WriteSet) -> LedgerResult<()>;
}

/// Versioned key space shared by the ledger implementations
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    records: BTreeMap<String, VersionedRecord>,
    sequence: Version,
}

impl LedgerState {
    pub(crate) fn get(&self, key: &str) -> Option<&VersionedRecord> {
        self.records.get(key)
    }

    pub(crate) fn range_query(&self, selector: &Selector) -> Vec<(String, VersionedRecord)> {
        self.records
            .iter()
            .filter(|(_, stored)| selector.matches(&stored.record))
            .map(|(key, stored)| (key.clone(), stored.clone()))
            .collect()
    }

    pub(crate) fn sequence(&self) -> Version {
        self.sequence
    }

    /// Fails with `Conflict` on the first key whose version moved
    pub(crate) fn check_reads(&self, write_set: &WriteSet) -> LedgerResult<()> {
        for (key, observed) in &write_set.reads {
            let current = self.records.get(key).map(|r| r.version);
            if current != *observed {
                return Err(LedgerError::conflict(key));
            }
        }
        Ok(())
    }

    /// Apply writes under the given commit sequence
    pub(crate) fn apply(&mut self, sequence: Version, writes: &BTreeMap<String, Write>) {
        for (key, write) in writes {
            match write {
                Write::Put(record) => {
                    self.records.insert(
                        key.clone(),
                        VersionedRecord {
                            record: record.clone(),
                            version: sequence,
                        },
                    );
                }
                Write::Delete => {
                    self.records.remove(key);
                }
            }
        }
        self.sequence = self.sequence.max(sequence);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_matches_all_fields() {
        let selector = Selector::asset_type("ration").with("distributionPoint", json!("distributionPoint:DP1"));
        assert!(selector.matches(&json!({
            "@assetType": "ration",
            "distributionPoint": "distributionPoint:DP1",
            "id": "R1"
        })));
        assert!(!selector.matches(&json!({"@assetType": "ration", "id": "R2"})));
    }

    #[test]
    fn test_selector_from_json() {
        let selector = Selector::from_json(&json!({"@assetType": "member"})).unwrap();
        assert!(selector.matches(&json!({"@assetType": "member"})));
        assert!(Selector::from_json(&json!(["member"])).is_err());
    }

    #[test]
    fn test_state_detects_moved_versions() {
        let mut state = LedgerState::default();
        let mut writes = BTreeMap::new();
        writes.insert("k".to_string(), Write::Put(json!({"v": 1})));
        state.apply(1, &writes);

        let mut stale = WriteSet::default();
        stale.reads.insert("k".to_string(), None);
        assert!(state.check_reads(&stale).is_err());

        let mut fresh = WriteSet::default();
        fresh.reads.insert("k".to_string(), Some(1));
        assert!(state.check_reads(&fresh).is_ok());
    }
}
