//! Wiring shared by every command
//!
//! Builds the token store, flow controller, provider registry and sync
//! orchestrator from the configuration file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use convortex_cloud::relay::{RelayTokenExchange, RoutedTokenExchange};
use convortex_cloud::storage::{
    JsonFileTokenPersistence, KeyringTokenPersistence, MemoryTokenPersistence,
};
use convortex_cloud::{ApiClient, OAuthFlowController, ProviderRegistry, TokenStore};
use convortex_core::config::Config;
use convortex_core::domain::{ProviderConfig, ProviderId};
use convortex_core::ports::{ITokenExchange, ITokenPersistence};
use convortex_sync::{FsFileCodec, SyncOrchestrator};
use tracing::{debug, info};

/// Resolves the config path from `--config` or the default location
pub fn config_path(flag: Option<&str>) -> PathBuf {
    flag.map(PathBuf::from).unwrap_or_else(Config::default_path)
}

/// Fully wired application services
pub struct AppContext {
    pub config: Config,
    pub providers: Vec<ProviderConfig>,
    pub tokens: Arc<TokenStore>,
    pub controller: OAuthFlowController,
    pub orchestrator: SyncOrchestrator,
}

impl AppContext {
    /// Loads configuration from `config_path` and wires all services
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        info!(config_path = %config_path.display(), "Loaded configuration");
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let errors = config.validate();
        if let Some(first) = errors.first() {
            bail!(
                "Invalid configuration ({} error{}): {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                first
            );
        }

        let providers = config.provider_configs();
        let client = ApiClient::new(Duration::from_secs(config.http.timeout_secs));

        let persistence = persistence_for(&config, &providers)?;
        let relay: Arc<dyn ITokenExchange> =
            Arc::new(RelayTokenExchange::new(config.oauth.relay_url.clone(), &client));
        let exchange: Arc<dyn ITokenExchange> =
            Arc::new(RoutedTokenExchange::from_configs(&providers, relay));

        let tokens = Arc::new(TokenStore::new(persistence, exchange.clone()));
        let controller = OAuthFlowController::new(
            providers.clone(),
            config.oauth.redirect_uri.clone(),
            tokens.clone(),
            exchange,
        );
        let registry = Arc::new(ProviderRegistry::from_configs(&providers, &client));
        let orchestrator =
            SyncOrchestrator::new(tokens.clone(), registry, Arc::new(FsFileCodec::new()));

        debug!(providers = providers.len(), "Services wired");
        Ok(Self {
            config,
            providers,
            tokens,
            controller,
            orchestrator,
        })
    }

    /// Looks up an enabled provider by id
    pub fn provider(&self, id: &str) -> Result<&ProviderConfig> {
        let known: Vec<&str> = self.providers.iter().map(|p| p.id.as_str()).collect();
        self.providers
            .iter()
            .find(|p| p.id.as_str() == id)
            .with_context(|| {
                format!("Unknown or disabled provider '{id}' (available: {})", known.join(", "))
            })
    }

    pub fn provider_id(&self, id: &str) -> Result<ProviderId> {
        Ok(self.provider(id)?.id.clone())
    }
}

fn persistence_for(
    config: &Config,
    providers: &[ProviderConfig],
) -> Result<Arc<dyn ITokenPersistence>> {
    let backend: Arc<dyn ITokenPersistence> = match config.storage.token_backend.as_str() {
        "file" => Arc::new(JsonFileTokenPersistence::new(&config.storage.token_file)),
        "keyring" => Arc::new(KeyringTokenPersistence::new(
            providers.iter().map(|p| p.id.clone()).collect(),
        )),
        "memory" => Arc::new(MemoryTokenPersistence::new()),
        other => bail!("Unsupported token backend '{other}'"),
    };
    debug!(backend = %config.storage.token_backend, "Token persistence selected");
    Ok(backend)
}
