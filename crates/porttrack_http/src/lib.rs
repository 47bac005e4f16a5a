//! HTTP transport adapter for container tracking.
//!
//! # Responsibility
//! - Map HTTP routes onto `ContainerService` operations.
//! - Map service failures to status codes and log request outcomes.
//!
//! # Invariants
//! - Each request opens its own migrated connection on a blocking thread.
//! - This is the only layer that logs container operation outcomes.

pub mod api;
pub mod config;

pub use api::{app, ApiFailure, BASE_PATH};
pub use config::ServerArgs;

use anyhow::Context;
use log::{error, info};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    db_path: Arc<PathBuf>,
}

impl ApiState {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }
}

/// Binds `addr` and serves the API until Ctrl-C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: ApiState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr().context("listener has no local address")?;

    info!(
        "event=server_start module=http status=ok addr={} db_path={}",
        local_addr,
        state.db_path().display()
    );

    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("event=server_stop module=http status=ok");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    match unix_signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = signal::ctrl_c() => {},
                _ = term.recv() => {},
            }
        }
        Err(err) => {
            error!("event=signal_install module=http status=error signal=SIGTERM error={err}");
            let _ = signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}
