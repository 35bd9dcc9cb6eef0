//! Demo mode end to end: connect, push a directory, list and download,
//! with no network involved

use std::sync::Arc;

use convortex_cloud::relay::{RelayTokenExchange, RoutedTokenExchange};
use convortex_cloud::storage::MemoryTokenPersistence;
use convortex_cloud::{ApiClient, CallbackParams, OAuthFlowController, ProviderRegistry, TokenStore};
use convortex_core::config::ConfigBuilder;
use convortex_core::domain::{ProviderId, RemoteId};
use convortex_core::ports::ITokenExchange;
use convortex_sync::{scan_directory, FsFileCodec, SyncOrchestrator};

use crate::common::{local_file, JAN_1};

#[tokio::test]
async fn test_demo_mode_connect_and_sync() {
    let config = ConfigBuilder::new()
        .demo_mode(true)
        .relay_url("http://127.0.0.1:9")
        .build();
    let providers = config.provider_configs();
    assert!(providers.iter().all(|p| p.is_sandboxed()));

    let client = ApiClient::default();
    let live: Arc<dyn ITokenExchange> =
        Arc::new(RelayTokenExchange::new(config.oauth.relay_url.clone(), &client));
    let exchange: Arc<dyn ITokenExchange> =
        Arc::new(RoutedTokenExchange::from_configs(&providers, live));
    let tokens = Arc::new(TokenStore::new(
        Arc::new(MemoryTokenPersistence::new()),
        exchange.clone(),
    ));
    let controller = OAuthFlowController::new(
        providers.clone(),
        config.oauth.redirect_uri.clone(),
        tokens.clone(),
        exchange,
    );
    let registry = Arc::new(ProviderRegistry::from_configs(&providers, &client));
    let orchestrator = SyncOrchestrator::new(tokens.clone(), registry, Arc::new(FsFileCodec::new()));

    let provider = ProviderId::new("google-drive").unwrap();
    let url = controller.begin_authorization(&provider).unwrap();
    let params = CallbackParams::from_uri(&url).unwrap();
    assert!(controller.complete_from_callback(&params).await.unwrap());
    assert!(tokens.is_connected(&provider));

    let dir = tempfile::tempdir().unwrap();
    local_file(dir.path(), "notes.md", b"# notes", JAN_1);
    local_file(dir.path(), "photo.jpg", b"jpeg", JAN_1);
    let files = scan_directory(dir.path()).await.unwrap();

    let mut progress = Vec::new();
    let first = orchestrator
        .sync_files(&provider, &files, |p| progress.push(p))
        .await
        .unwrap();
    assert!(first.success);
    assert_eq!(first.uploaded_count, 2);
    assert_eq!(progress.len(), 2);

    // Sandbox copies carry the upload time, so the older local files are skipped.
    let second = orchestrator.sync_files(&provider, &files, |_| {}).await.unwrap();
    assert_eq!(second.uploaded_count, 0);
    assert_eq!(second.skipped_count, 2);

    let listed = orchestrator.list_remote(&provider).await.unwrap();
    let notes = listed.iter().find(|f| f.name == "notes.md").unwrap();
    let out = dir.path().join("restored").join("notes.md");
    let bytes = orchestrator
        .download_file(&provider, &RemoteId::new(notes.id.clone()).unwrap(), &out)
        .await
        .unwrap();
    assert_eq!(bytes, 7);
    assert_eq!(std::fs::read(&out).unwrap(), b"# notes");
}
