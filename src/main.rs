//! sentinel - Straylight IRC channel sentinel.
//!
//! A protocol-level moderation bot: one connection, one event loop.

use clap::Parser;
use slirc_sentinel::bootstrap;
use slirc_sentinel::cli::Cli;
use slirc_sentinel::error::BotError;
use slirc_sentinel::session::Session;
use slirc_sentinel::transport::{Connector, TcpConnector};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let (config, owners, forbidden) = bootstrap::resolve(&cli).map_err(|e| {
        error!(error = %e, "bootstrap failed");
        e
    })?;

    info!(
        server = %config.server,
        port = config.port,
        nick = %config.nick,
        channel = %config.channel,
        "Starting sentinel"
    );

    let connector = TcpConnector;
    let (transport, events) = connector
        .connect(&config.server, config.port, config.bind_ip)
        .await?;

    let mut session = Session::new(
        config,
        owners,
        forbidden,
        Box::new(connector),
        transport,
        events,
    );
    session.register().await?;

    match session.run().await {
        // Peer close is a clean shutdown, not a crash
        Err(BotError::ConnectionClosed(reason)) => {
            info!(%reason, "connection closed, shutting down");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "session failed");
            Err(e.into())
        }
        Ok(()) => Ok(()),
    }
}
