use std::future::Future;
use std::io;

use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels `shutdown` once the process receives ctrl + c.
pub async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    cancel_on(tokio::signal::ctrl_c(), shutdown).await
}

/// Cancels `shutdown` when `signal` fires. If the signal handler could not be
/// installed the token is left untouched and the process keeps running.
pub async fn cancel_on<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    select! {
        result = signal => {
            match result {
                Ok(()) => {
                    info!("ctrl + c received; shutting down...");
                    shutdown.cancel();
                }
                Err(err) => warn!("Failed to listen for ctrl + c: {:?}", err),
            }
        }
        _ = shutdown.cancelled() => {}
    }
}
