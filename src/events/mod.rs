//! Event types and delivery sinks
//!
//! Routines request events by tag; the engine delivers them after the ledger
//! commit succeeds. Delivery is best-effort: a sink failure is logged and the
//! transaction still succeeds.

mod sink;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::{ErrorKind, LedgerError, LedgerResult};

pub use sink::{EventSink, FileEventSink, MemoryEventSink, RecordedEvent};

/// A declared event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub tag: String,
    pub label: String,
    pub description: String,
    /// Fixed prefix of every log line for this event
    pub base_log: String,
    /// Organizations the event is addressed to
    pub receivers: Vec<String>,
}

impl EventType {
    pub fn new(
        tag: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        base_log: impl Into<String>,
        receivers: &[&str],
    ) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            description: description.into(),
            base_log: base_log.into(),
            receivers: receivers.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    events: BTreeMap<String, EventType>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, event: EventType) -> LedgerResult<()> {
        if self.events.contains_key(&event.tag) {
            return Err(LedgerError::new(
                ErrorKind::AlreadyExists,
                format!("event '{}' is already registered", event.tag),
            ));
        }
        self.events.insert(event.tag.clone(), event);
        Ok(())
    }

    /// Unregistered tags fail `UnknownType`
    pub fn lookup(&self, tag: &str) -> LedgerResult<&EventType> {
        self.events.get(tag).ok_or_else(|| {
            LedgerError::new(
                ErrorKind::UnknownType,
                format!("event '{}' is not registered", tag),
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EventRegistry::new();
        registry
            .register(EventType::new(
                "stockCountedLog",
                "Stock Counted Log",
                "Log of a stock count",
                "Stock counted",
                &["org2MSP"],
            ))
            .unwrap();

        assert_eq!(registry.lookup("stockCountedLog").unwrap().base_log, "Stock counted");
        assert_eq!(
            registry.lookup("stockLostLog").unwrap_err().kind(),
            ErrorKind::UnknownType
        );
    }

    #[test]
    fn test_duplicate_event_rejected() {
        let mut registry = EventRegistry::new();
        let event = EventType::new("a", "A", "", "a", &[]);
        registry.register(event.clone()).unwrap();
        assert_eq!(
            registry.register(event).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
    }
}
