use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::protocol::{SERVER_PORT, VERB_GET, VERB_LAST_ACCESS};
use shared::Command;

/// Seconds to wait for a connection before giving up.
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Host `MyLastAccess` is sent to; the command carries no host of its own.
pub const LAST_ACCESS_HOST: &str = "localhost";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub client: ClientSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub description: Option<String>,
    pub server_port: Option<u16>,
    // Connect timeout in seconds. There is no retry once it expires.
    pub connect_timeout: Option<u64>,
}

impl ClientSettings {
    pub fn server_port(&self) -> u16 {
        self.server_port.unwrap_or(SERVER_PORT)
    }

    pub fn connect_timeout(&self) -> Duration {
        match self.connect_timeout {
            None | Some(0) => Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Some(secs) => Duration::from_secs(secs),
        }
    }
}

/// Failures of a single request attempt. None of them ends the prompt loop.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to resolve address '{host}': {source}")]
    Resolve { host: String, source: io::Error },

    #[error("No address found for '{0}'")]
    NoAddress(String),

    #[error("Timed out after {0:?} while connecting to the server")]
    Timeout(Duration),

    #[error("Error while connecting: {0}")]
    Connect(#[source] io::Error),

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

/// Reasons a typed line is refused before any connection is made.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid command!")]
    UnknownCommand,

    #[error("Missing filename or host for 'MyGet'!")]
    MissingArguments,

    #[error("Command 'MyLastAccess' takes no additional parameters!")]
    UnexpectedArguments,
}

/// A validated command together with the host to send it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub host: String,
    pub command: Command,
}

impl Request {
    /// Validates one line typed at the prompt.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let tokens: Vec<&str> = line.split_whitespace().take(3).collect();

        match tokens.as_slice() {
            [VERB_GET, host, filename] => Ok(Self {
                host: host.to_string(),
                command: Command::Get {
                    host: host.to_string(),
                    filename: filename.to_string(),
                },
            }),
            [VERB_GET, ..] => Err(InputError::MissingArguments),
            [VERB_LAST_ACCESS] => Ok(Self {
                host: LAST_ACCESS_HOST.to_string(),
                command: Command::LastAccess,
            }),
            [VERB_LAST_ACCESS, ..] => Err(InputError::UnexpectedArguments),
            _ => Err(InputError::UnknownCommand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_needs_host_and_filename() {
        assert_eq!(
            Request::parse("MyGet example.org notes.txt").unwrap(),
            Request {
                host: "example.org".into(),
                command: Command::Get { host: "example.org".into(), filename: "notes.txt".into() },
            }
        );
        assert_eq!(Request::parse("MyGet localhost"), Err(InputError::MissingArguments));
        assert_eq!(Request::parse("MyGet"), Err(InputError::MissingArguments));
    }

    #[test]
    fn last_access_goes_to_localhost() {
        let request = Request::parse("  MyLastAccess ").unwrap();
        assert_eq!(request.host, "localhost");
        assert_eq!(request.command, Command::LastAccess);
        assert_eq!(Request::parse("MyLastAccess now"), Err(InputError::UnexpectedArguments));
    }

    #[test]
    fn other_verbs_are_refused() {
        assert_eq!(Request::parse("Foo bar"), Err(InputError::UnknownCommand));
        assert_eq!(Request::parse(""), Err(InputError::UnknownCommand));
    }

    #[test]
    fn settings_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.server_port(), 8080);
        assert_eq!(settings.connect_timeout(), Duration::from_secs(5));

        let settings: Settings = serde_yaml::from_str("client:\n  serverPort: 9000\n  connectTimeout: 2\n").unwrap();
        assert_eq!(settings.client.server_port(), 9000);
        assert_eq!(settings.client.connect_timeout(), Duration::from_secs(2));
    }
}
