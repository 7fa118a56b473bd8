use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use shared::protocol::SERVER_PORT;

const DEFAULT_CONFIG_PATH: &str = "server.yml";
const DEFAULT_BACKLOG: u32 = 10;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: Server,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub description: Option<String>,
    // Address and port to accept connections on. Defaults to every interface on the protocol port.
    pub listen_addr: Option<String>,
    // Length of the pending connection queue handed to listen(2).
    pub backlog: Option<u32>,
    // Directory requested filenames are resolved against. Defaults to the working directory.
    pub root: Option<PathBuf>,
}

/// Settings after defaults have been applied and addresses parsed.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
    pub backlog: u32,
    pub root: PathBuf,
}

/// Reads the settings file. Without an explicit path a missing `server.yml`
/// falls back to the built-in defaults.
pub fn load_config(path: Option<String>) -> Result<Settings> {
    let settings = match path {
        Some(path) => {
            let settings = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file '{}'", path))?;
            parse_settings(&settings)?
        }
        None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(settings) => parse_settings(&settings)?,
            Err(_) => {
                info!("No '{}' found; using built-in defaults.", DEFAULT_CONFIG_PATH);
                Settings::default()
            }
        },
    };

    if let Some(description) = &settings.server.description {
        info!("{}", description);
    }

    Ok(settings)
}

pub fn parse_settings(settings: &str) -> Result<Settings> {
    serde_yaml::from_str(settings).context("Failed to parse settings")
}

pub fn validate_settings(settings: Settings) -> Result<ServerSettings> {
    let server = settings.server;

    let listen_addr = match server.listen_addr {
        Some(addr) => addr
            .parse()
            .with_context(|| format!("Invalid listen address '{}'", addr))?,
        None => {
            info!("Listen address not set; using 0.0.0.0:{}.", SERVER_PORT);
            SocketAddr::from(([0, 0, 0, 0], SERVER_PORT))
        }
    };

    let backlog = match server.backlog {
        None | Some(0) => {
            info!("Backlog not set; setting to {}.", DEFAULT_BACKLOG);
            DEFAULT_BACKLOG
        }
        Some(backlog) => backlog,
    };

    let root = server.root.unwrap_or_else(|| PathBuf::from("."));

    Ok(ServerSettings {
        listen_addr,
        backlog,
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_protocol_constants() {
        let settings = validate_settings(Settings::default()).unwrap();
        assert_eq!(settings.listen_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(settings.backlog, 10);
        assert_eq!(settings.root, PathBuf::from("."));
    }

    #[test]
    fn yaml_overrides_defaults() {
        let settings = parse_settings(
            "server:\n  listenAddr: 127.0.0.1:9000\n  backlog: 32\n  root: /srv/files\n",
        )
        .unwrap();
        let settings = validate_settings(settings).unwrap();
        assert_eq!(settings.listen_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(settings.backlog, 32);
        assert_eq!(settings.root, PathBuf::from("/srv/files"));
    }

    #[test]
    fn zero_backlog_falls_back() {
        let settings = parse_settings("server:\n  backlog: 0\n").unwrap();
        assert_eq!(validate_settings(settings).unwrap().backlog, 10);
    }

    #[test]
    fn bad_listen_address_is_rejected() {
        let settings = parse_settings("server:\n  listenAddr: nowhere\n").unwrap();
        assert!(validate_settings(settings).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(load_config(Some("/definitely/not/here.yml".into())).is_err());
    }
}
