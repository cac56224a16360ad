//! Battle Event Log
//!
//! Sink for round narration and error conditions. The battle log returned
//! to players is assembled separately; this is the operator-facing stream.

use std::sync::Mutex;

use tracing::{error, info, warn};

/// Severity of a recorded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Routine narration.
    Info,
    /// Notable narration (round and battle winners).
    Highlight,
    /// Recoverable problem.
    Warning,
    /// Failure that aborted or degraded an operation.
    Error,
}

/// Structured sink for battle events.
pub trait EventLog: Send + Sync {
    /// Record one message.
    fn record(&self, level: LogLevel, message: &str);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn record(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(target: "battle", "{}", message),
            LogLevel::Highlight => info!(target: "battle", highlight = true, "{}", message),
            LogLevel::Warning => warn!(target: "battle", "{}", message),
            LogLevel::Error => error!(target: "battle", "{}", message),
        }
    }
}

/// Keeps every record in memory. Used by tests.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Messages recorded at `level`.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl EventLog for MemoryEventLog {
    fn record(&self, level: LogLevel, message: &str) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((level, message.to_string()));
    }
}
