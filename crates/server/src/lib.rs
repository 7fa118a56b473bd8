pub mod access;
pub mod config;
pub mod listener;
pub mod request;

pub use access::AccessTable;
pub use listener::Dispatcher;
pub use request::RequestHandler;
