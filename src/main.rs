//! harp: HAProxy configuration management service.
//!
//! # Architecture Overview
//!
//! ```text
//!     API request (composite id)
//!            │
//!            ▼
//!     ┌──────────┐    ┌─────────┐    ┌───────────────┐
//!     │   http   │───▶│  admin  │───▶│    catalog    │  keys decode ids,
//!     │  server  │    │ handlers│    │ (model tree)  │  model enforces invariants
//!     └──────────┘    └────┬────┘    └───────────────┘
//!                          │ commit
//!                          ▼
//!                   ┌────────────┐    ┌──────────┐    ┌──────────────┐
//!                   │   render   │───▶│  write   │───▶│ reload cmd   │
//!                   └────────────┘    └──────────┘    └──────────────┘
//! ```
//!
//! `render` and `commit` work offline against a seed file, without the API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

use harp::catalog::Catalog;
use harp::commit::Committer;
use harp::config::{self, ObservabilityConfig};
use harp::http::HttpServer;
use harp::keys::{CompositeKey, ConfigurationKey};
use harp::{lifecycle, observability, render};

#[derive(Parser)]
#[command(name = "harp", version)]
#[command(about = "Manage HAProxy configurations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the management API
    Serve {
        /// Service configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the rendered text of one configuration from a seed file
    Render {
        #[arg(long)]
        seed: PathBuf,
        configuration: String,
    },
    /// Render, write and reload one configuration from a seed file
    Commit {
        #[arg(long)]
        seed: PathBuf,
        configuration: String,
        /// Reload command time limit
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config } => serve(config).await,
        Command::Render {
            seed,
            configuration,
        } => {
            observability::init(&ObservabilityConfig::default());
            let catalog = seeded(&seed)?;
            let key = ConfigurationKey::decode(&configuration)?;
            print!("{}", render(catalog.configuration(&key)?)?);
            Ok(())
        }
        Command::Commit {
            seed,
            configuration,
            timeout_secs,
        } => {
            observability::init(&ObservabilityConfig::default());
            let catalog = seeded(&seed)?;
            let key = ConfigurationKey::decode(&configuration)?;
            let committer = Committer::new(Duration::from_secs(timeout_secs));
            let report = committer.commit(catalog.configuration(&key)?).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn serve(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(&path)?;
    observability::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.admin.request_timeout_secs,
        reload_timeout_secs = config.reload.timeout_secs,
        "Configuration loaded"
    );

    let state = lifecycle::build_state(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(&config, state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn seeded(path: &std::path::Path) -> Result<Catalog, Box<dyn std::error::Error>> {
    let configurations = config::load_seed(path)?;
    Ok(Catalog::from_configurations(configurations)?)
}
