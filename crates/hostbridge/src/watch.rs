//! Registry of filesystem watch registrations.
//!
//! Watches are recorded so that `unwatch` and teardown have something to
//! release. Change notifications are not produced.

use std::collections::BTreeMap;

/// One `watch` registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    /// Watch id chosen by script code.
    pub id: String,
    /// Watched path.
    pub path: String,
    /// Callback id of the registering request, if it had one.
    pub callback_id: Option<String>,
    /// Whether subdirectories were requested.
    pub recursive: bool,
}

/// Watch registrations keyed by id.
#[derive(Debug, Default)]
pub struct WatchTable {
    entries: BTreeMap<String, WatchEntry>,
}

impl WatchTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a watch, returning any registration it replaced.
    pub fn register(&mut self, entry: WatchEntry) -> Option<WatchEntry> {
        self.entries.insert(entry.id.clone(), entry)
    }

    /// Removes a watch; absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<WatchEntry> {
        self.entries.remove(id)
    }

    /// Looks up a watch.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&WatchEntry> {
        self.entries.get(id)
    }

    /// Number of active watches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every registration.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
