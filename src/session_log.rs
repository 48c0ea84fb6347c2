// SPDX-License-Identifier: MPL-2.0

//! Bounded, newest-first session log shown on the kiosk

use crate::constants::session::LOG_CAPACITY;
use std::collections::VecDeque;
use tracing::info;

/// One timestamped line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock label, e.g. `[14:03:27]`
    pub timestamp_label: String,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.timestamp_label, self.message)
    }
}

/// Fixed-capacity ring of status lines, newest first
///
/// Diagnostics only: nothing in the engine reads it back for control flow.
#[derive(Debug, Clone)]
pub struct SessionLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl SessionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend a message stamped with the current local time, evicting the oldest when full
    pub fn push(&mut self, message: impl Into<String>) {
        let label = chrono::Local::now().format("[%H:%M:%S]").to_string();
        self.push_labeled(label, message);
    }

    /// Prepend a message with an explicit timestamp label
    pub fn push_labeled(&mut self, timestamp_label: impl Into<String>, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp_label: timestamp_label.into(),
            message: message.into(),
        };
        info!(target: "gesture_booth::session", message = %entry.message, "Session log");

        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy for publishing to the UI
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}
