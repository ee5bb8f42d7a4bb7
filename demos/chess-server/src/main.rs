//! Standalone chess room server.
//!
//! Run with:
//! ```not_rust
//! cargo run -p chess-server
//! cargo run -p chess-server -- --host 0.0.0.0 --port 9000 --log-level info
//! ```
//!
//! `RUST_LOG` overrides `--log-level` when set.

use clap::Parser;
use rookery::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chess-server")]
#[command(about = "Realtime two-player chess rooms over WebSockets", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Default log level for rookery crates
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Longest display name kept before truncation
    #[arg(long, default_value = "32")]
    max_name_len: usize,
}

#[tokio::main]
async fn main() -> Result<(), RookeryError> {
    let args = Args::parse();
    setup_logger(&args.log_level);

    let room_config = RoomConfig {
        max_display_name_len: args.max_name_len,
        ..RoomConfig::default()
    };

    let server = RookeryServer::builder()
        .bind(&format!("{}:{}", args.host, args.port))
        .room_config(room_config)
        .build::<StandardChess>()
        .await?;

    tracing::info!("listening on ws://{}", server.local_addr()?);
    tracing::info!("Press Ctrl+C to shut down");

    server.run_until(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` for this binary and the rookery crates.
fn setup_logger(default_level: &str) {
    let fallback = [
        "chess_server",
        "rookery",
        "rookery_room",
        "rookery_session",
        "rookery_transport",
    ]
    .iter()
    .map(|target| format!("{target}={default_level}"))
    .collect::<Vec<_>>()
    .join(",");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
