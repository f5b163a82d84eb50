//! `arcjet-server`: a content store and metadata index over HTTP.
//!
//! # Usage
//!
//! ```text
//! arcjet-server                          # in memory, 127.0.0.1:3000
//! arcjet-server -d ./data                # blobs under ./data
//! arcjet-server -l 0.0.0.0:8080 -v debug
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use arcjet_server::{ArcjetServer, ServerConfig, DEFAULT_LISTEN};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "arcjet-server",
    version,
    about = "Arcjet content store and metadata index"
)]
struct Cli {
    /// Address to listen on.
    #[arg(short, long, default_value = DEFAULT_LISTEN)]
    listen: SocketAddr,

    /// Directory for stored blobs. Blobs are kept in memory when omitted.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Largest accepted request body, in bytes.
    #[arg(long, default_value_t = ServerConfig::default().max_body_bytes)]
    max_body_bytes: usize,

    /// Log level, overridden by `RUST_LOG`.
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(&cli.log_level);

    let config = ServerConfig {
        listen: cli.listen,
        data_dir: cli.data_dir,
        max_body_bytes: cli.max_body_bytes,
    };

    let server = ArcjetServer::open(&config)
        .await
        .context("failed to open store")?;
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    server
        .serve_with_shutdown(listener, shutdown_signal())
        .await
        .context("server error")?;

    info!("arcjet server stopped");
    Ok(())
}

/// Initialize the `tracing` subscriber.
///
/// Respects `RUST_LOG` if set, otherwise uses `level`.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
