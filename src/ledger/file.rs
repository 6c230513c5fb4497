//! Append-only file ledger
//!
//! One line per commit:
//!
//! ```text
//! <crc32 as 8 hex digits> <commit JSON>
//! ```
//!
//! The checksum (CRC32, IEEE polynomial) covers the JSON bytes. The file is
//! replayed into memory at open; any line that fails its checksum or does not
//! decode aborts the open rather than silently skipping history.
//!
//! Each commit is a single unbuffered append. A failed append is truncated
//! back to the last good offset, so nothing from a rejected commit reaches a
//! later one.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Ledger, LedgerState, Selector, Version, VersionedRecord, Write, WriteSet};
use crate::errors::{LedgerError, LedgerResult};

#[derive(Debug, Serialize, Deserialize)]
struct CommitEntry {
    seq: Version,
    writes: BTreeMap<String, Write>,
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn encode_line(entry: &CommitEntry) -> LedgerResult<Vec<u8>> {
    let json = serde_json::to_string(entry)?;
    Ok(format!("{:08x} {}\n", checksum(json.as_bytes()), json).into_bytes())
}

fn decode_line(line: &str) -> Result<CommitEntry, String> {
    let (crc, json) = line
        .split_once(' ')
        .ok_or_else(|| "missing checksum".to_string())?;
    let expected = u32::from_str_radix(crc, 16).map_err(|_| format!("bad checksum '{}'", crc))?;
    if checksum(json.as_bytes()) != expected {
        return Err("checksum mismatch".to_string());
    }
    serde_json::from_str(json).map_err(|e| format!("undecodable entry: {}", e))
}

struct Inner {
    state: LedgerState,
    file: File,
    /// End of the last durable line
    offset: u64,
}

impl Inner {
    fn append(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.file.write_all(line)?;
        self.file.sync_all()
    }
}

/// Durable ledger backed by a checksummed append-only log
pub struct FileLedger {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl FileLedger {
    /// Open or create a ledger file, replaying its history.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut state = LedgerState::default();

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (index, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry = decode_line(&line).map_err(|reason| {
                    LedgerError::storage(format!(
                        "corrupt ledger entry at {}:{}: {}",
                        path.display(),
                        index + 1,
                        reason
                    ))
                })?;
                if entry.seq <= state.sequence() {
                    return Err(LedgerError::storage(format!(
                        "ledger sequence went backwards at {}:{}",
                        path.display(),
                        index + 1
                    )));
                }
                state.apply(entry.seq, &entry.writes);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let offset = file.metadata()?.len();
        info!(path = %path.display(), sequence = state.sequence(), records = state.len(), "ledger opened");

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                state,
                file,
                offset,
            }),
        })
    }

    /// Get the ledger file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> LedgerResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::storage("Lock poisoned"))
    }
}

impl Ledger for FileLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<VersionedRecord>> {
        Ok(self.lock()?.state.get(key).cloned())
    }

    fn range_query(&self, selector: &Selector) -> LedgerResult<Vec<(String, VersionedRecord)>> {
        Ok(self.lock()?.state.range_query(selector))
    }

    fn commit(&self, write_set: &WriteSet) -> LedgerResult<()> {
        let mut inner = self.lock()?;
        inner.state.check_reads(write_set)?;
        if write_set.is_empty() {
            return Ok(());
        }

        let entry = CommitEntry {
            seq: inner.state.sequence() + 1,
            writes: write_set.writes.clone(),
        };
        let line = encode_line(&entry)?;

        // Durable before visible
        if let Err(e) = inner.append(&line) {
            let offset = inner.offset;
            if let Err(truncate) = inner.file.set_len(offset) {
                warn!(error = %truncate, offset, "could not drop partial ledger entry");
            }
            return Err(e.into());
        }
        inner.offset += line.len() as u64;

        inner.state.apply(entry.seq, &entry.writes);
        debug!(sequence = entry.seq, writes = entry.writes.len(), "ledger commit");
        Ok(())
    }
}
