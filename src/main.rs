//! Headless WordPress gateway.
//!
//! A reverse proxy that keeps a WordPress install headless: the REST API,
//! admin UI, login and static assets stay reachable, every other path is a
//! bare 404, and REST responses point at the host the client actually used.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────────────────┐
//!                 │                     HEADLESS GATEWAY                      │
//!                 │                                                           │
//!  Client ────────┼─▶ request id ─▶ trace ─▶ timeout ─▶ lockdown ─▶ CORS ─┐   │
//!                 │                                     │                 │   │
//!                 │                         ┌───────────┴──────────┐      │   │
//!                 │                         │ gateway pipeline     │      │   │
//!                 │                         │  origin trust        │      ▼   │
//!                 │                         │  path classifier ─404│   proxy ─┼──▶ WordPress
//!                 │                         │  canonical suppress  │      │   │
//!                 │                         │  canonical redirect ─301    │   │
//!                 │                         └──────────────────────┘      │   │
//!  Client ◀───────┼──────────── response host rewriter ◀──────────────────┘   │
//!                 └───────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use headless_gateway::http::HttpServer;
use headless_gateway::lifecycle::{signals::shutdown_on_signal, startup::Startup, Shutdown};
use headless_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "headless-gateway")]
#[command(about = "Reverse proxy that locks a WordPress install down to its API", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let startup = Startup::load(cli.config.as_deref())?;
    logging::init_logging(startup.config.observability.log_format, startup.site.debug);

    tracing::info!("headless-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    startup.log_summary();

    let Startup { config, site } = startup;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, &site)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_on_signal(&shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
