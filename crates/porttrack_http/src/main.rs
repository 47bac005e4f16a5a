//! `porttrack-server` entry point.

use anyhow::Context;
use clap::Parser;
use porttrack_core::db::open_db;
use porttrack_core::init_logging;
use porttrack_http::{serve, ApiState, ServerArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    init_logging(args.effective_log_level(), args.log_dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    // Migrate once up front so a bad database path fails before binding.
    open_db(&args.db)
        .with_context(|| format!("failed to open database {}", args.db.display()))?;

    serve(args.bind, ApiState::new(args.db)).await
}
