use std::future::Future;
use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shared::Command;

use crate::types::{ClientError, ClientSettings, Request};

const PROMPT: &str = "Enter a command as 'MyGet localhost <file>' or 'MyLastAccess': ";

/// Interactive client: one prompt, one connection, one response at a time.
#[derive(Clone)]
pub struct Service {
    shutdown: CancellationToken,
    settings: ClientSettings,
}

impl Service {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            shutdown: CancellationToken::new(),
            settings,
        }
    }

    /// Token that ends the prompt loop, including a request in flight.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Prompts until stdin closes or ctrl + c is received.
    pub async fn run(&self) -> Result<()> {
        tokio::spawn(shared::signal::cancel_on_ctrl_c(self.shutdown.clone()));

        let lines = spawn_stdin_reader();
        let mut stdout = tokio::io::stdout();
        self.prompt(lines, &mut stdout).await
    }

    /// Runs the prompt loop over `lines`, writing prompts and responses to `out`.
    pub async fn prompt<W>(&self, mut lines: mpsc::Receiver<String>, out: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        loop {
            out.write_all(PROMPT.as_bytes()).await?;
            out.flush().await?;

            let line = select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                line = lines.recv() => line,
            };

            let Some(line) = line else {
                debug!("stdin closed; exiting");
                return Ok(());
            };

            let request = match Request::parse(&line) {
                Ok(request) => request,
                Err(err) => {
                    out.write_all(format!("{}\n", err).as_bytes()).await?;
                    continue;
                }
            };

            select! {
                _ = self.shutdown.cancelled() => {
                    info!("Request interrupted; exiting");
                    return Ok(());
                }
                result = self.send(&request, out) => {
                    if let Err(err) = result {
                        warn!("Request failed: {}", err);
                        out.write_all(format!("{}\n", err).as_bytes()).await?;
                    }
                }
            }
        }
    }

    /// Connects, sends the command and copies the whole response to `out`.
    pub async fn send<W>(&self, request: &Request, out: &mut W) -> Result<u64, ClientError>
    where
        W: AsyncWrite + Unpin,
    {
        let addr = resolve(&request.host, self.settings.server_port()).await?;
        let mut stream = connect_with_timeout(addr, self.settings.connect_timeout()).await?;
        out.write_all(b"Connection to the server established.\n").await?;

        let received_bytes = exchange(&mut stream, &request.command, out).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(received_bytes)
    }
}

/// Reads stdin lines on a plain thread. A blocked read there never holds up
/// runtime shutdown, so the process can exit while waiting for input.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Resolves `host`, preferring an IPv4 address.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ClientError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| ClientError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| ClientError::NoAddress(host.to_string()))
}

/// Opens a connection to `addr`, giving up once `timeout` elapses. No retry.
pub async fn connect_with_timeout(addr: SocketAddr, timeout: Duration) -> Result<TcpStream, ClientError> {
    debug!("Connecting to '{}' (timeout {:?})", addr, timeout);
    bounded(TcpStream::connect(addr), timeout).await
}

/// Waits for `connect` for at most `timeout`, telling an expired wait apart
/// from an error reported by the connection attempt itself.
pub async fn bounded<T, F>(connect: F, timeout: Duration) -> Result<T, ClientError>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(err)) => Err(ClientError::Connect(err)),
        Err(_) => Err(ClientError::Timeout(timeout)),
    }
}

/// Sends one command and copies every response byte to `out` until the
/// server closes the connection.
pub async fn exchange<S, W>(stream: &mut S, command: &Command, out: &mut W) -> io::Result<u64>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: AsyncWrite + Unpin,
{
    stream.write_all(&command.to_wire()).await?;
    stream.flush().await?;
    tokio::io::copy(stream, out).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test(start_paused = true)]
    async fn pending_connect_times_out() {
        let result = bounded(std::future::pending::<io::Result<()>>(), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ClientError::Timeout(d)) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn refused_connect_is_a_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = connect_with_timeout(addr, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ClientError::Connect(_))));
    }

    #[tokio::test]
    async fn cancel_interrupts_a_response_in_progress() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (written_tx, written_rx) = tokio::sync::oneshot::channel();
        let stalled = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0; 64];
            socket.read(&mut buf).await.unwrap();
            socket.write_all(b"partial").await.unwrap();
            written_tx.send(()).unwrap();
            // Keep the connection open without finishing the response.
            std::future::pending::<()>().await;
        });

        let service = Service::new(ClientSettings {
            server_port: Some(port),
            ..ClientSettings::default()
        });
        let (lines_tx, lines_rx) = mpsc::channel(1);
        lines_tx.send("MyLastAccess".to_string()).await.unwrap();

        let shutdown = service.shutdown_token();
        tokio::spawn(async move {
            written_rx.await.unwrap();
            shutdown.cancel();
        });

        let mut out = Vec::new();
        let result = tokio::time::timeout(Duration::from_secs(5), service.prompt(lines_rx, &mut out)).await;

        assert!(result.expect("prompt loop kept running after cancel").is_ok());
        assert!(String::from_utf8_lossy(&out).contains("Connection to the server established."));
        stalled.abort();
    }

    #[tokio::test]
    async fn closed_input_ends_the_prompt_loop() {
        let service = Service::new(ClientSettings::default());
        let (lines_tx, lines_rx) = mpsc::channel(1);
        lines_tx.send("Foo bar".to_string()).await.unwrap();
        drop(lines_tx);

        let mut out = Vec::new();
        service.prompt(lines_rx, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches(PROMPT).count(), 2);
        assert!(out.contains("Invalid command!\n"));
    }

    #[tokio::test]
    async fn resolves_localhost() {
        let addr = resolve("localhost", 8080).await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8080);
    }

    #[tokio::test]
    async fn exchange_sends_the_command_and_reads_until_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0; 64];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(b"Last Access = Null.\n").await.unwrap();
            buf[..n].to_vec()
        });

        let mut stream = connect_with_timeout(addr, Duration::from_secs(5)).await.unwrap();
        let mut out = Vec::new();
        let received = exchange(&mut stream, &Command::LastAccess, &mut out).await.unwrap();

        assert_eq!(server.await.unwrap(), b"MyLastAccess\0".to_vec());
        assert_eq!(received, 20);
        assert_eq!(out, b"Last Access = Null.\n".to_vec());
    }
}
