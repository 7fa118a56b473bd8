mod table;
mod types;

pub use table::AccessTable;
pub use types::{client_id, AccessEntry, ClientId, Timestamp};
