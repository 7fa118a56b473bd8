mod handler;
mod types;

pub use handler::RequestHandler;
pub use types::{Outcome, LAST_ACCESS_FORMAT};
