pub mod types;
pub mod service;

pub use types::{ClientError, ClientSettings, InputError, Request, Settings};
pub use service::Service;
