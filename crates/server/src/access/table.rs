use tracing::{debug, info};

use crate::access::types::{AccessEntry, Accesses, Timestamp};

/// Process-wide table of the last access time of every client.
///
/// Each operation is atomic on its own; callers never see the underlying map.
#[derive(Clone, Default)]
pub struct AccessTable {
    entries: Accesses,
}

impl AccessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last recorded access of `client_id`, if any.
    pub fn lookup(&self, client_id: &str) -> Option<Timestamp> {
        self.entries.get(client_id).map(|entry| entry.last_access)
    }

    /// Inserts or overwrites the last access of `client_id`.
    ///
    /// The stored time is monotonic: an `at` older than the stored one keeps
    /// the stored time, but the request is still counted.
    pub fn record(&self, client_id: &str, at: Timestamp) {
        self.entries
            .entry(client_id.to_string())
            .and_modify(|entry| {
                entry.touch(at);
                debug!("Updated last access of '{}'", client_id);
            })
            .or_insert_with(|| {
                info!("New client recorded: '{}'", client_id);
                AccessEntry::new(client_id.to_string(), at)
            });
    }

    /// Snapshot of the entry for `client_id`.
    pub fn entry(&self, client_id: &str) -> Option<AccessEntry> {
        self.entries.get(client_id).map(|entry| entry.value().clone())
    }

    /// Drops every entry. Only used while shutting down.
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        info!("Cleared {} client access entries", count);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
