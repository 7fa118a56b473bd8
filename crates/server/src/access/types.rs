use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Local};
use dashmap::DashMap;

/// Textual peer address a request came from. Not authenticated.
pub type ClientId = String;

pub type Timestamp = DateTime<Local>;

/// Derives the client identity from a peer address. Only the IP is used so
/// that every connection from the same host maps to the same entry.
pub fn client_id(addr: &SocketAddr) -> ClientId {
    addr.ip().to_string()
}

/// Last recorded access of one client
#[derive(Debug, Clone)]
pub struct AccessEntry {
    pub client_id: ClientId,
    /// Completion time of the most recent request
    pub last_access: Timestamp,
    /// Number of requests recorded for this client
    pub requests: u64,
}

impl AccessEntry {
    pub fn new(client_id: ClientId, at: Timestamp) -> Self {
        Self {
            client_id,
            last_access: at,
            requests: 1,
        }
    }

    /// Records another request. The stored time never moves backwards, even
    /// when two handlers for the same client finish out of order.
    pub fn touch(&mut self, at: Timestamp) {
        self.last_access = self.last_access.max(at);
        self.requests += 1;
    }
}

/// Thread-safe map of client identities to their last access
pub type Accesses = Arc<DashMap<ClientId, AccessEntry>>;
