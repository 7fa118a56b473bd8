use anyhow::{Context, Result};
use tracing::info;

use client::{Service, Settings};

const DEFAULT_CONFIG_PATH: &str = "client.yml";

#[tokio::main]
async fn main() -> Result<()> {
    shared::init()?;
    shared::print_header(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let settings: Settings = match std::env::args().nth(1) {
        Some(config_path) => {
            let settings = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read settings file '{}'", config_path))?;
            serde_yaml::from_str(&settings)?
        }
        None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(settings) => serde_yaml::from_str(&settings)?,
            Err(_) => Settings::default(),
        },
    };

    if let Some(description) = &settings.client.description {
        info!("{}", description);
    }

    let service = Service::new(settings.client);
    service.run().await?;
    Ok(())
}
