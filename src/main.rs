//! Frontend asset proxy.
//!
//! A reverse proxy that exposes an S3 bucket as the origin of a single-page
//! application, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                  FRONTEND ASSET PROXY                 │
//!                     │                                                       │
//!   Client Request    │  ┌─────────┐    ┌─────────┐    ┌──────────────┐      │
//!   ──────────────────┼─▶│   net   │───▶│  http   │───▶│   routing    │      │
//!                     │  │listener │    │ server  │    │  route table │      │
//!                     │  └─────────┘    └─────────┘    └──────┬───────┘      │
//!                     │                                       │ object path  │
//!                     │                                       ▼              │
//!                     │                               ┌──────────────┐       │
//!                     │                               │    proxy     │       │
//!                     │                               │ fallback +   │       │
//!                     │                               │  fetcher     │       │
//!                     │                               └──────┬───────┘       │
//!                     │                                       │              │
//!                     │                                       ▼              │
//!   Client Response   │  ┌─────────┐                  ┌──────────────┐       │
//!   ◀─────────────────┼──│ writer  │◀─────────────────│    store     │◀──────┼── S3 / MinIO
//!                     │  └─────────┘                  └──────────────┘       │
//!                     │                                                       │
//!                     │  config · lifecycle · observability · resilience      │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use frontend_asset_proxy::lifecycle::startup;

#[derive(Debug, Parser)]
#[command(name = "frontend-asset-proxy", version, about = "Serve a single-page application from an S3 bucket")]
struct Cli {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration (secrets redacted) and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    startup::run(cli.config.as_deref(), cli.print_config).await
}
