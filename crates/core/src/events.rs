//! Structured diagnostic event sink.
//!
//! Store and sync components report notable conditions (corrupted cache
//! discarded, degraded image store, per-survey sync outcome) through an
//! injected sink so tests can assert on them without capturing a console.

use std::sync::Mutex;

/// Receiver for structured diagnostic events.
pub trait EventSink: Send + Sync {
    fn emit(&self, kind: &str, fields: serde_json::Value);
}

/// Default sink: forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, kind: &str, fields: serde_json::Value) {
        log::info!(target: "patwari::events", "{} {}", kind, fields);
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All emitted events in order.
    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events.lock().expect("event sink lock").clone()
    }

    /// Emitted event kinds in order.
    pub fn kinds(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|(kind, _)| kind)
            .collect()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, kind: &str, fields: serde_json::Value) {
        self.events
            .lock()
            .expect("event sink lock")
            .push((kind.to_string(), fields));
    }
}
