use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::access::{client_id, AccessTable};
use crate::config::ServerSettings;
use crate::request::RequestHandler;

/// Binds the listening socket. Failures here are fatal startup errors.
pub fn bind(settings: &ServerSettings) -> Result<TcpListener> {
    let socket = match settings.listen_addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .context("Failed to create socket")?;

    socket.set_reuseaddr(true)?;
    socket
        .bind(settings.listen_addr)
        .with_context(|| format!("Failed to bind {}", settings.listen_addr))?;

    socket
        .listen(settings.backlog)
        .with_context(|| format!("Failed to listen on {}", settings.listen_addr))
}

/// Accepts connections and hands each one to a detached request task.
#[derive(Clone)]
pub struct Dispatcher {
    shutdown: CancellationToken,
    access: AccessTable,
    handler: RequestHandler,
}

impl Dispatcher {
    pub fn new(access: AccessTable, handler: RequestHandler) -> Self {
        Self {
            shutdown: CancellationToken::new(),
            access,
            handler,
        }
    }

    /// Token that stops the accept loop once cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accepts until shutdown is requested, then clears the access table.
    ///
    /// Requests already running are not waited for.
    pub async fn run(&self, listener: TcpListener) -> Result<()> {
        loop {
            select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received; no longer accepting connections");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => self.dispatch(stream, addr),
                        Err(err) => warn!("Failed to accept connection: {:?}", err),
                    }
                }
            }
        }

        drop(listener);
        self.access.clear();
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, addr: SocketAddr) {
        debug!("Accepted connection from '{}'", addr);

        tokio::spawn({
            let handler = self.handler.clone();
            async move {
                match handler.handle(stream, client_id(&addr)).await {
                    Ok(outcome) => debug!("Request from '{}' done: {}", addr, outcome),
                    Err(err) => debug!("Connection from '{}' dropped: {:?}", addr, err),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn local_settings() -> ServerSettings {
        ServerSettings {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            backlog: 10,
            root: PathBuf::from("."),
        }
    }

    #[tokio::test]
    async fn shutdown_stops_accepting_and_clears_the_table() {
        let listener = bind(&local_settings()).unwrap();
        let addr = listener.local_addr().unwrap();
        let access = AccessTable::new();
        let dispatcher = Dispatcher::new(access.clone(), RequestHandler::new(access.clone(), "."));
        let shutdown = dispatcher.shutdown_token();
        let join = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.run(listener).await }
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"MyLastAccess\0").await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert_eq!(response, "Last Access = Null.\n");
        assert_eq!(access.len(), 1);

        shutdown.cancel();
        join.await.unwrap().unwrap();

        assert!(access.is_empty());
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn bind_fails_when_the_port_is_taken() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let settings = ServerSettings {
            listen_addr: taken.local_addr().unwrap(),
            ..local_settings()
        };
        assert!(bind(&settings).is_err());
    }
}
