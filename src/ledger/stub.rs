//! Per-invocation ledger view

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use super::{Ledger, Selector, Version, Write, WriteSet};
use crate::errors::LedgerResult;

/// Staging area for one transaction invocation.
///
/// Reads see the invocation's own staged writes first. Every record read
/// from the ledger has its version remembered for the optimistic commit.
pub struct TxStub<'a> {
    ledger: &'a dyn Ledger,
    reads: BTreeMap<String, Option<Version>>,
    writes: BTreeMap<String, Write>,
}

impl<'a> TxStub<'a> {
    pub fn new(ledger: &'a dyn Ledger) -> Self {
        Self {
            ledger,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> LedgerResult<Option<JsonValue>> {
        if let Some(staged) = self.writes.get(key) {
            return Ok(match staged {
                Write::Put(record) => Some(record.clone()),
                Write::Delete => None,
            });
        }

        let stored = self.ledger.get(key)?;
        self.reads
            .entry(key.to_string())
            .or_insert_with(|| stored.as_ref().map(|s| s.version));
        Ok(stored.map(|s| s.record))
    }

    pub fn exists(&mut self, key: &str) -> LedgerResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn put(&mut self, key: impl Into<String>, record: JsonValue) {
        self.writes.insert(key.into(), Write::Put(record));
    }

    pub fn delete(&mut self, key: impl Into<String>) {
        self.writes.insert(key.into(), Write::Delete);
    }

    /// Records matching `selector`, merged with staged writes, ordered by key
    pub fn range_query(&mut self, selector: &Selector) -> LedgerResult<Vec<(String, JsonValue)>> {
        let mut results = BTreeMap::new();
        for (key, stored) in self.ledger.range_query(selector)? {
            self.reads.entry(key.clone()).or_insert(Some(stored.version));
            results.insert(key, stored.record);
        }

        for (key, write) in &self.writes {
            match write {
                Write::Put(record) if selector.matches(record) => {
                    results.insert(key.clone(), record.clone());
                }
                _ => {
                    results.remove(key);
                }
            }
        }

        Ok(results.into_iter().collect())
    }

    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    pub fn into_write_set(self) -> WriteSet {
        WriteSet {
            reads: self.reads,
            writes: self.writes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use serde_json::json;

    fn seeded() -> MemoryLedger {
        let ledger = MemoryLedger::new();
        let mut stub = TxStub::new(&ledger);
        stub.put("ration:R1", json!({"@assetType": "ration", "id": "R1"}));
        stub.put("ration:R2", json!({"@assetType": "ration", "id": "R2"}));
        ledger.commit(&stub.into_write_set()).unwrap();
        ledger
    }

    #[test]
    fn test_reads_see_staged_writes() {
        let ledger = seeded();
        let mut stub = TxStub::new(&ledger);

        stub.delete("ration:R1");
        assert!(stub.get("ration:R1").unwrap().is_none());

        stub.put("ration:R3", json!({"@assetType": "ration", "id": "R3"}));
        let keys: Vec<String> = stub
            .range_query(&Selector::asset_type("ration"))
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["ration:R2", "ration:R3"]);
    }

    #[test]
    fn test_records_observed_versions() {
        let ledger = seeded();
        let mut stub = TxStub::new(&ledger);
        stub.get("ration:R1").unwrap();
        stub.get("member:missing").unwrap();

        let ws = stub.into_write_set();
        assert_eq!(ws.reads.get("ration:R1"), Some(&Some(1)));
        assert_eq!(ws.reads.get("member:missing"), Some(&None));
        assert!(ws.is_empty());
    }

    #[test]
    fn test_staged_writes_invisible_to_ledger_until_commit() {
        let ledger = seeded();
        let mut stub = TxStub::new(&ledger);
        stub.delete("ration:R2");
        assert!(ledger.get("ration:R2").unwrap().is_some());
    }
}
