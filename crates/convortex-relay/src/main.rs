//! Convortex Relay Daemon - Token exchange service
//!
//! Loads the shared configuration, reads provider client secrets from the
//! environment, and serves the relay HTTP API until SIGINT/SIGTERM.
//!
//! Usage: `convortex-relayd [CONFIG_PATH]`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use convortex_core::config::Config;
use convortex_relay::{ProviderTokenClient, RelayCredentials, RelayServer};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Waits for SIGINT or SIGTERM, then cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!(config_path = %config_path.display(), "Convortex relay starting (convortex-relayd)");

    let credentials = RelayCredentials::from_config(&config);
    let tokens = ProviderTokenClient::new(Duration::from_secs(config.http.timeout_secs));
    let server = RelayServer::new(credentials, tokens, &config.relay.bind)
        .with_context(|| format!("Invalid relay bind address '{}'", config.relay.bind))?;

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let result = server.run(shutdown_token).await;

    match &result {
        Ok(()) => info!("Convortex relay shut down gracefully"),
        Err(e) => error!(error = %e, "Convortex relay exiting with error"),
    }

    result
}
