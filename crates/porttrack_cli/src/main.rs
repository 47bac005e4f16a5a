//! Operator CLI for the container store.
//!
//! # Responsibility
//! - Run lifecycle operations against a database file without the HTTP server.
//! - Print results as JSON for scripting.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use porttrack_core::db::open_db;
use porttrack_core::{
    init_logging, ContainerId, ContainerPatch, ContainerRepository, ContainerService,
    ContainerStatus, NewContainer, SqliteContainerRepository,
};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "porttrack",
    about = "Inspect and edit tracked containers in a porttrack database",
    version
)]
struct Cli {
    /// SQLite database file; created and migrated when missing.
    #[arg(long, env = "PORTTRACK_DB_PATH", default_value = "./porttrack.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new container.
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        status: String,
    },
    /// Show one container.
    Get { id: ContainerId },
    /// List all containers.
    List,
    /// Change code and/or status; omitted flags keep stored values.
    Update {
        id: ContainerId,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Remove a container.
    Delete { id: ContainerId },
    /// Print the known processing statuses.
    Statuses,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging("warn", None).map_err(anyhow::Error::msg)?;

    let output = match cli.command {
        Command::Statuses => known_statuses(),
        command => {
            let conn = open_db(&cli.db)
                .with_context(|| format!("failed to open database {}", cli.db.display()))?;
            let repo = SqliteContainerRepository::try_new(&conn)?;
            execute(&ContainerService::new(repo), command)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute<R: ContainerRepository>(
    service: &ContainerService<R>,
    command: Command,
) -> anyhow::Result<Value> {
    let value = match command {
        Command::Create { code, status } => {
            json!(service.create(NewContainer::new(code, status))?)
        }
        Command::Get { id } => {
            let container = service
                .get(id)?
                .ok_or_else(|| anyhow!("container with id {id} not found"))?;
            json!(container)
        }
        Command::List => json!(service.list_all()?),
        Command::Update { id, code, status } => {
            json!(service.update(id, &ContainerPatch { code, status })?)
        }
        Command::Delete { id } => {
            service.delete(id)?;
            json!({ "deleted": id })
        }
        Command::Statuses => known_statuses(),
    };
    Ok(value)
}

fn known_statuses() -> Value {
    json!(ContainerStatus::ALL)
}
