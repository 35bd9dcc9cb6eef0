//! Starts a relay on an ephemeral port with Dropbox pointed at a mocked
//! token endpoint

use std::net::SocketAddr;
use std::time::Duration;

use convortex_core::config::ConfigBuilder;
use convortex_core::domain::ProviderKind;
use convortex_relay::{ProviderTokenClient, RelayCredentials, RelayServer};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

pub const TOKEN_PATH: &str = "/oauth2/token";

pub struct RelayEnv {
    pub provider: MockServer,
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    shutdown: CancellationToken,
}

impl RelayEnv {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RelayEnv {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Relay with Dropbox fully configured and Box missing its secret
pub async fn start_relay() -> RelayEnv {
    let provider = MockServer::start().await;
    let config = ConfigBuilder::new()
        .provider_client_id(ProviderKind::Dropbox, "db-id")
        .provider_token_url(ProviderKind::Dropbox, format!("{}{}", provider.uri(), TOKEN_PATH))
        .provider_client_id(ProviderKind::Box, "box-id")
        .build();
    let credentials = RelayCredentials::from_config_with(&config, |var| {
        (var == "CONVORTEX_DROPBOX_CLIENT_SECRET").then(|| "db-secret".to_string())
    });

    let server = RelayServer::new(
        credentials,
        ProviderTokenClient::new(Duration::from_secs(5)),
        "127.0.0.1:0",
    )
    .unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move { server.serve(listener, token).await });

    RelayEnv {
        provider,
        addr,
        http: reqwest::Client::new(),
        shutdown,
    }
}
