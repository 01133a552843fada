//! Azure OpenAI Gateway
//!
//! A thin reverse proxy in front of Azure OpenAI, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                    GATEWAY                       │
//!   Client Request       │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!   ─────────────────────┼─▶│ validate │──▶│ build    │──▶│  forward    │───┼──▶ Azure OpenAI
//!                        │  │ request  │   │ URL      │   │ (pooled)    │   │
//!                        │  └────┬─────┘   └────┬─────┘   └──────┬──────┘   │
//!                        │       │ reject       │ config error   │          │
//!   Client Response      │       ▼              ▼                ▼          │
//!   ◀────────────────────┼──────────────── response relay ◀──────┘          │
//!                        │                                                  │
//!                        │   config (file + env, hot reload) · tracing ·    │
//!                        │   metrics · graceful shutdown                    │
//!                        └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use azure_openai_gateway::config::{load_config, load_from_env};
use azure_openai_gateway::lifecycle::startup;
use azure_openai_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "azure-openai-gateway", version)]
#[command(about = "Reverse proxy for Azure OpenAI chat and completions deployments", long_about = None)]
struct Cli {
    /// TOML config file; watched for changes while running
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address (e.g. 127.0.0.1:8080)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    init_logging(&config.observability);
    tracing::info!("azure-openai-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config, cli.config, cli.bind).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
