use std::io;
use std::path::PathBuf;

use chrono::Local;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use shared::protocol::BUFFER_SIZE;
use shared::Command;

use crate::access::{AccessTable, ClientId, Timestamp};
use crate::request::types::{self, Outcome};

/// Serves exactly one command on one connection.
///
/// A request reads its command, captures the client's previous access,
/// answers, and only then records its own access, so `MyLastAccess` always
/// reports the request before it.
#[derive(Clone)]
pub struct RequestHandler {
    access: AccessTable,
    root: PathBuf,
}

impl RequestHandler {
    pub fn new(access: AccessTable, root: impl Into<PathBuf>) -> Self {
        Self {
            access,
            root: root.into(),
        }
    }

    /// Runs the request to completion and closes the connection.
    ///
    /// Errors returned here come from the connection itself; problems with the
    /// requested file are answered to the client and reported as an `Outcome`.
    #[tracing::instrument(skip(self, stream))]
    pub async fn handle<S>(&self, mut stream: S, client_id: ClientId) -> io::Result<Outcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf = vec![0; BUFFER_SIZE];
        let received_bytes = stream.read(&mut buf).await?;
        let command = Command::from_bytes(&buf[..received_bytes]);
        debug!("Received {} bytes: {:?}", received_bytes, command);

        let previous_access = self.access.lookup(&client_id);

        let outcome = self
            .respond(&mut stream, &command, &client_id, previous_access)
            .await;

        // Every dispatched request counts as an access, whatever its answer was.
        self.access.record(&client_id, Local::now());

        if let Err(err) = stream.shutdown().await {
            debug!("Failed to close connection of '{}': {:?}", client_id, err);
        }

        outcome
    }

    async fn respond<S>(
        &self,
        stream: &mut S,
        command: &Command,
        client_id: &str,
        previous_access: Option<Timestamp>,
    ) -> io::Result<Outcome>
    where
        S: AsyncWrite + Unpin,
    {
        let outcome = match command {
            Command::Get { filename, .. } => {
                info!("Client '{}' requested file '{}'", client_id, filename);
                self.fetch(stream, filename).await?
            }
            Command::LastAccess => {
                info!("Client '{}' requested its last access", client_id);
                stream
                    .write_all(types::last_access(previous_access).as_bytes())
                    .await?;
                Outcome::ReportedAccess
            }
            Command::Unknown(verb) => {
                warn!("Unrecognized command from client '{}': '{}'", client_id, verb);
                stream.write_all(types::not_recognized(verb).as_bytes()).await?;
                Outcome::Rejected
            }
        };

        stream.flush().await?;
        Ok(outcome)
    }

    async fn fetch<S>(&self, stream: &mut S, filename: &str) -> io::Result<Outcome>
    where
        S: AsyncWrite + Unpin,
    {
        let mut file = match File::open(self.root.join(filename)).await {
            Ok(file) => file,
            Err(err) => {
                warn!("Failed to open file '{}': {}", filename, err);
                stream
                    .write_all(types::open_failure(filename, &err).as_bytes())
                    .await?;
                return Ok(Outcome::FetchFailed);
            }
        };

        stream.write_all(types::file_header(filename).as_bytes()).await?;

        let mut buf = vec![0; BUFFER_SIZE];
        let mut sent_bytes = 0u64;
        loop {
            let read_bytes = match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(read_bytes) => read_bytes,
                Err(err) => {
                    // The header is already out; the client sees a truncated body.
                    warn!("Failed to read file '{}' after {} bytes: {}", filename, sent_bytes, err);
                    return Ok(Outcome::ReadFailed(sent_bytes));
                }
            };
            stream.write_all(&buf[..read_bytes]).await?;
            sent_bytes += read_bytes as u64;
        }
        info!("File '{}' sent ({} bytes)", filename, sent_bytes);

        Ok(Outcome::Fetched(sent_bytes))
    }
}
