//! Server configuration from command-line flags and environment.

use clap::Parser;
use porttrack_core::default_log_level;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "porttrack-server",
    about = "HTTP API for tracking shipping containers through port processing",
    version
)]
pub struct ServerArgs {
    /// Socket address to listen on.
    #[arg(long, env = "PORTTRACK_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// SQLite database file; created and migrated when missing.
    #[arg(long, env = "PORTTRACK_DB_PATH", default_value = "./porttrack.sqlite3")]
    pub db: PathBuf,

    /// trace|debug|info|warn|error; `debug` in debug builds, `info` in release.
    #[arg(long, env = "PORTTRACK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotating log files; stderr when unset.
    #[arg(long, env = "PORTTRACK_LOG_DIR")]
    pub log_dir: Option<String>,
}

impl ServerArgs {
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}
