//! In-memory ledger

use std::sync::RwLock;

use super::{Ledger, LedgerState, Selector, VersionedRecord, WriteSet};
use crate::errors::{LedgerError, LedgerResult};

/// Volatile ledger for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> LedgerError {
    LedgerError::storage("Lock poisoned")
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<VersionedRecord>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.get(key).cloned())
    }

    fn range_query(&self, selector: &Selector) -> LedgerResult<Vec<(String, VersionedRecord)>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.range_query(selector))
    }

    fn commit(&self, write_set: &WriteSet) -> LedgerResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.check_reads(write_set)?;
        if write_set.is_empty() {
            return Ok(());
        }
        let sequence = state.sequence() + 1;
        state.apply(sequence, &write_set.writes);
        Ok(())
    }
}
