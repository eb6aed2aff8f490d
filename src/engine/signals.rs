// src/engine/signals.rs

//! Completes when the supervisor itself is asked to stop.

use tokio::signal::unix::{signal, SignalKind};

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
    Ok(())
}
