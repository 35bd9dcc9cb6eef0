//! Shared setup: a Dropbox adapter pointed at wiremock, a connected token
//! store and a temp directory of local files

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration as StdDuration, SystemTime};

use chrono::{Duration, Utc};
use convortex_cloud::providers::DropboxAdapter;
use convortex_cloud::storage::MemoryTokenPersistence;
use convortex_cloud::relay::RelayTokenExchange;
use convortex_cloud::{ApiClient, ProviderRegistry, TokenStore};
use convortex_core::domain::{ProviderConfig, ProviderId, ProviderKind, TokenRecord};
use convortex_core::ports::ITokenPersistence;
use convortex_sync::{FsFileCodec, SyncOrchestrator};
use tempfile::TempDir;
use wiremock::MockServer;

pub const TOKEN: &str = "sync-token";

/// 2026-01-01T00:00:00Z
pub const JAN_1: u64 = 1_767_225_600;

pub struct Env {
    pub server: MockServer,
    pub orchestrator: SyncOrchestrator,
    pub persistence: Arc<MemoryTokenPersistence>,
    pub dir: TempDir,
}

pub fn dropbox() -> ProviderId {
    ProviderId::new("dropbox").unwrap()
}

pub async fn setup() -> Env {
    let server = MockServer::start().await;
    let client = ApiClient::default();

    let config = ProviderConfig::for_kind(ProviderKind::Dropbox, Some("client".to_string()))
        .with_base_url(server.uri());
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(DropboxAdapter::new(config, client.clone())));

    let persistence = Arc::new(MemoryTokenPersistence::new());
    persistence
        .save(
            &dropbox(),
            &TokenRecord {
                access_token: TOKEN.to_string(),
                refresh_token: Some("refresh".to_string()),
                expires_at: Utc::now() + Duration::hours(1),
            },
        )
        .unwrap();
    let exchange = Arc::new(RelayTokenExchange::new(server.uri(), &client));
    let tokens = Arc::new(TokenStore::new(persistence.clone(), exchange));

    Env {
        orchestrator: SyncOrchestrator::new(tokens, Arc::new(registry), Arc::new(FsFileCodec::new())),
        server,
        persistence,
        dir: tempfile::tempdir().unwrap(),
    }
}

/// Writes `content` to `dir/name` and pins its mtime to `unix_secs`
pub fn local_file(dir: &Path, name: &str, content: &[u8], unix_secs: u64) {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + StdDuration::from_secs(unix_secs))
        .unwrap();
}
