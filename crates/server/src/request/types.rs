use std::fmt;
use std::io;

use crate::access::Timestamp;

/// `strftime` pattern used when reporting a previous access.
pub const LAST_ACCESS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which branch of the protocol a request ended up in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// File found and streamed. Holds the number of file bytes sent.
    Fetched(u64),
    /// File could not be opened; the reason was sent instead.
    FetchFailed,
    /// File opened but reading it failed after this many bytes were sent.
    ReadFailed(u64),
    ReportedAccess,
    Rejected,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Fetched(bytes) => write!(f, "fetched {} bytes", bytes),
            Outcome::FetchFailed => write!(f, "fetch failed"),
            Outcome::ReadFailed(bytes) => write!(f, "file read failed after {} bytes", bytes),
            Outcome::ReportedAccess => write!(f, "reported last access"),
            Outcome::Rejected => write!(f, "rejected"),
        }
    }
}

pub fn file_header(filename: &str) -> String {
    format!("Contents of file '{}':\n", filename)
}

pub fn open_failure(filename: &str, err: &io::Error) -> String {
    format!("Error opening file '{}': {}\n", filename, err)
}

pub fn last_access(previous: Option<Timestamp>) -> String {
    match previous {
        Some(at) => format!("Last Access = {}.\n", at.format(LAST_ACCESS_FORMAT)),
        None => "Last Access = Null.\n".to_string(),
    }
}

pub fn not_recognized(verb: &str) -> String {
    format!("Command '{}' not recognized.\n", verb)
}
