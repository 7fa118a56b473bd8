use anyhow::Result;
use tracing::info;

use server::config;
use server::listener::{self, Dispatcher};
use server::{AccessTable, RequestHandler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging and print header
    shared::init()?;
    shared::print_header(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // Load and validate configuration
    let settings = config::load_config(std::env::args().nth(1))?;
    let settings = config::validate_settings(settings)?;

    let listener = listener::bind(&settings)?;
    info!("Listening on: {}", settings.listen_addr);

    let access = AccessTable::new();
    let handler = RequestHandler::new(access.clone(), settings.root.clone());
    let dispatcher = Dispatcher::new(access, handler);

    tokio::spawn(shared::signal::cancel_on_ctrl_c(dispatcher.shutdown_token()));

    dispatcher.run(listener).await?;
    info!("Server stopped");

    Ok(())
}
