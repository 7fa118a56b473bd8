//! Text protocol spoken between the client and the server.
//!
//! A connection carries exactly one command of the form `<verb> <arg1> <arg2>`,
//! sent as a single message followed by a NUL byte. The server answers with one
//! or more chunks and signals the end of the response by closing the connection.

/// Fixed TCP port the server listens on.
pub const SERVER_PORT: u16 = 8080;

/// Size of the buffers used to read a command and to stream file contents.
pub const BUFFER_SIZE: usize = 4096;

pub const VERB_GET: &str = "MyGet";
pub const VERB_LAST_ACCESS: &str = "MyLastAccess";

/// A command as understood by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `MyGet <host> <filename>`. The host is carried but never consulted.
    Get { host: String, filename: String },
    /// `MyLastAccess`.
    LastAccess,
    /// Anything else, including `MyGet` without a filename. Holds the verb as received.
    Unknown(String),
}

impl Command {
    /// Parses one received message. Only the first three whitespace separated
    /// tokens matter; trailing NUL terminators are ignored.
    pub fn parse(message: &str) -> Self {
        let mut tokens = message
            .split(|c: char| c == '\0' || c.is_whitespace())
            .filter(|token| !token.is_empty());

        let verb = tokens.next().unwrap_or_default();
        let arg1 = tokens.next();
        let arg2 = tokens.next();

        match (verb, arg1, arg2) {
            (VERB_GET, Some(host), Some(filename)) => Command::Get {
                host: host.to_string(),
                filename: filename.to_string(),
            },
            (VERB_LAST_ACCESS, _, _) => Command::LastAccess,
            (verb, _, _) => Command::Unknown(verb.to_string()),
        }
    }

    /// Parses raw bytes read from a connection, replacing invalid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(bytes))
    }

    pub fn verb(&self) -> &str {
        match self {
            Command::Get { .. } => VERB_GET,
            Command::LastAccess => VERB_LAST_ACCESS,
            Command::Unknown(verb) => verb,
        }
    }

    /// Encodes the command for the wire, including the terminating NUL byte.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut line = match self {
            Command::Get { host, filename } => format!("{} {} {}", VERB_GET, host, filename),
            Command::LastAccess => VERB_LAST_ACCESS.to_string(),
            Command::Unknown(verb) => verb.clone(),
        }
        .into_bytes();
        line.push(0);
        line
    }
}
