//! Shared test helpers for provider and relay integration tests
//!
//! Each helper starts a wiremock server and returns an adapter (or relay
//! client) pointed at it.

use convortex_cloud::client::ApiClient;
use convortex_cloud::providers::{BoxAdapter, DropboxAdapter, GoogleDriveAdapter, OneDriveAdapter};
use convortex_cloud::relay::RelayTokenExchange;
use convortex_core::domain::{ProviderConfig, ProviderKind};
use wiremock::MockServer;

pub const TOKEN: &str = "test-access-token";

/// Provider config for `kind` with both API hosts pointed at `server`
pub fn config_for(kind: ProviderKind, server: &MockServer) -> ProviderConfig {
    ProviderConfig::for_kind(kind, Some("test-client".to_string())).with_base_url(server.uri())
}

pub async fn setup_google_drive() -> (MockServer, GoogleDriveAdapter) {
    let server = MockServer::start().await;
    let adapter = GoogleDriveAdapter::new(
        config_for(ProviderKind::GoogleDrive, &server).with_folder("folder-1"),
        ApiClient::default(),
    );
    (server, adapter)
}

pub async fn setup_dropbox() -> (MockServer, DropboxAdapter) {
    let server = MockServer::start().await;
    let adapter = DropboxAdapter::new(config_for(ProviderKind::Dropbox, &server), ApiClient::default());
    (server, adapter)
}

pub async fn setup_onedrive() -> (MockServer, OneDriveAdapter) {
    let server = MockServer::start().await;
    let adapter =
        OneDriveAdapter::new(config_for(ProviderKind::OneDrive, &server), ApiClient::default());
    (server, adapter)
}

pub async fn setup_box() -> (MockServer, BoxAdapter) {
    let server = MockServer::start().await;
    let adapter = BoxAdapter::new(config_for(ProviderKind::Box, &server), ApiClient::default());
    (server, adapter)
}

pub async fn setup_relay() -> (MockServer, RelayTokenExchange) {
    let server = MockServer::start().await;
    let relay = RelayTokenExchange::new(server.uri(), &ApiClient::default());
    (server, relay)
}

/// Standard relay token payload
pub fn token_json(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access,
        "expires_in": 3600,
        "token_type": "Bearer"
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = serde_json::json!(refresh);
    }
    body
}
