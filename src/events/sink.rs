//! Event sinks
//!
//! A sink receives an event tag and an opaque payload. The engine never reads
//! anything back from it.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Destination for emitted events
pub trait EventSink: Send + Sync {
    fn emit(&self, tag: &str, payload: &[u8]) -> io::Result<()>;
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "event sink lock poisoned")
}

/// One delivered event as the sinks store it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub tag: String,
    /// Payload decoded as JSON when possible, else as a string
    pub payload: JsonValue,
}

impl RecordedEvent {
    fn new(tag: &str, payload: &[u8]) -> Self {
        let payload = serde_json::from_slice(payload)
            .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(payload).into_owned()));
        Self {
            tag: tag.to_string(),
            payload,
        }
    }
}

/// Appends events to a JSON-lines file, syncing after each one.
pub struct FileEventSink {
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl FileEventSink {
    /// Open or create an event log file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Get the event log path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for FileEventSink {
    fn emit(&self, tag: &str, payload: &[u8]) -> io::Result<()> {
        let line = serde_json::to_string(&RecordedEvent::new(tag, payload))?;
        let mut writer = self.writer.lock().map_err(|_| poisoned())?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }
}

/// In-memory event sink for testing.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all delivered events.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn tags(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.tag).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, tag: &str, payload: &[u8]) -> io::Result<()> {
        self.events
            .lock()
            .map_err(|_| poisoned())?
            .push(RecordedEvent::new(tag, payload));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_memory_sink_records_events() {
        let sink = MemoryEventSink::new();
        sink.emit("rationCreatedLog", br#"{"log":"New ration created"}"#).unwrap();
        sink.emit("raw", b"not json").unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload["log"], "New ration created");
        assert_eq!(events[1].payload, JsonValue::String("not json".into()));
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.log");

        let sink = FileEventSink::open(&path).unwrap();
        sink.emit("rationDeletedLog", br#"{"key":"ration:R1"}"#).unwrap();
        sink.emit("rationCreatedLog", br#"{"key":"ration:R2"}"#).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: RecordedEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.tag, "rationDeletedLog");
        assert_eq!(first.payload["key"], "ration:R1");
    }
}
