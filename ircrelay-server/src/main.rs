//! ircrelay server
//!
//! Relays buildbot results, commit announcements, link titles and
//! documentation references into a single IRC channel.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use anyhow::Context;
use clap::Parser;
use config::ConfigLoader;
use ircrelay_core::RelayContext;
use ircrelay_core::events::{chat_line_channel, transport_event_channel};
use ircrelay_core::processors::RelaySession;
use ircrelay_core::transport::IrcTransport;
use server::{build_router, run_server};
use shutdown::{shutdown_signal, spawn_doc_refresh_handler};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,ircrelay_core=debug";

/// ircrelay - CI and commit relay bot for IRC
#[derive(Parser, Debug)]
#[command(name = "ircrelay-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to an optional configuration file
    #[arg(short, long, env = "IRCRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Channel to join and relay into [default: #i3]
    #[arg(long)]
    channel: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting ircrelay-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ConfigLoader::new(args.config.as_ref(), args.listen, args.channel)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    match &args.config {
        Some(path) => tracing::info!("Configuration loaded from {:?}", path),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    let listen_addr = config.server.listen;

    // Failing to bind is fatal; nothing else is.
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {listen_addr}"))?;

    // Wire the relay
    let (lines_tx, lines_rx) = chat_line_channel();
    let (events_tx, events_rx) = transport_event_channel();
    let context = RelayContext::new(config, lines_tx);
    let transport = IrcTransport::new(context.config().irc.clone(), events_tx);
    let session = RelaySession::new(&context, transport, events_rx, lines_rx);

    let state = AppState::new(&context, session.subscribe_state());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let session_handle = tokio::spawn(session.run(shutdown_rx));

    // Spawn doc refresh handler (listens for SIGHUP)
    let refresh_notify = spawn_doc_refresh_handler(context.doc_refresher());

    // Run the server
    let router = build_router(state);
    tracing::info!("Starting HTTP server on {}", listen_addr);
    // The session stops together with the listener: webhook handlers may be
    // blocked on a full line queue, and only the session going away frees them.
    let result = run_server(router, listener, async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    })
    .await;

    // Stop the background tasks
    refresh_notify.notify_one();
    if let Err(e) = session_handle.await {
        tracing::error!("Relay session task failed: {}", e);
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_names_only_our_crates() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for directive in DEFAULT_LOG_FILTER.split(',').filter(|d| d.contains('=')) {
            assert!(directive.starts_with("ircrelay_"), "{directive}");
        }
    }

    #[test]
    fn test_channel_flag_is_optional() {
        let args = Args::try_parse_from(["ircrelay-server"]).unwrap();
        assert!(args.channel.is_none());
        let args = Args::try_parse_from(["ircrelay-server", "--channel", "#dev"]).unwrap();
        assert_eq!(args.channel.as_deref(), Some("#dev"));
    }
}
