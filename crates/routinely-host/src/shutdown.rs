use tokio::sync::watch;
use tracing::{error, info};

/// A shutdown flag the host loop watches. Send `true` to stop it.
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Shutdown receiver that flips once Ctrl+C is pressed
///
/// Must be called from within a tokio runtime.
pub fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(target: "host", "Received Ctrl+C, shutting down");
                let _ = tx.send(true);
            }
            Err(e) => {
                error!(target: "host", "Failed to listen for Ctrl+C: {}", e);
                // Keep the sender alive so the host is not stopped early
                tx.closed().await;
            }
        }
    });
    rx
}
