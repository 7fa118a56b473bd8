use anyhow::{anyhow, Result};
use tracing_core::{Level, LevelFilter};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub mod protocol;
pub mod signal;

pub use protocol::Command;

#[derive(Debug)]
pub struct TracingConfig {
    pub log_level: Level,
    pub default_directive: LevelFilter,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: Level::DEBUG,
            default_directive: LevelFilter::INFO,
        }
    }
}

pub fn print_header(cargo_pkg_name: &str, cargo_pkg_version: &str) {
    let build = if option_env!("MYGET_OFFICIAL_BUILD").is_some() {
        ""
    } else {
        " - UNOFFICIAL BUILD"
    };

    println!("myget-{} ver. {}{}", cargo_pkg_name, cargo_pkg_version, build);
}

pub fn init() -> Result<()> {
    let config = TracingConfig::default();
    init_tracing_subscriber(&config)
}

fn init_tracing_subscriber(config: &TracingConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(LevelFilter::from_level(config.log_level))
        .with(tracing_subscriber::fmt::layer()
            .with_level(true)
            .with_target(false)
            .with_thread_ids(true)
            .with_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(config.default_directive.into())
                    .from_env_lossy(),
            )
        )
        .try_init()
        .map_err(|err| anyhow!("Failed to install tracing subscriber: {}", err))
}
