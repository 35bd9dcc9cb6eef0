//! Cloud provider adapters
//!
//! One [`IProviderAdapter`] implementation per provider family, plus the
//! in-memory [`SandboxAdapter`] used when a provider has no client id.
//! [`ProviderRegistry`] maps provider ids to their adapter.

pub mod box_cloud;
pub mod dropbox;
pub mod google_drive;
pub mod onedrive;
pub mod sandbox;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use convortex_core::domain::{CloudError, ProviderConfig, ProviderId, ProviderKind};
use convortex_core::ports::IProviderAdapter;
use tracing::debug;

pub use box_cloud::BoxAdapter;
pub use dropbox::DropboxAdapter;
pub use google_drive::GoogleDriveAdapter;
pub use onedrive::OneDriveAdapter;
pub use sandbox::SandboxAdapter;

use crate::client::ApiClient;

/// Maps provider ids to their adapter
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: BTreeMap<ProviderId, Arc<dyn IProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the adapter matching each config's [`ProviderKind`]
    ///
    /// Sandboxed providers get a [`SandboxAdapter`].
    pub fn from_configs(configs: &[ProviderConfig], client: &ApiClient) -> Self {
        let mut registry = Self::new();
        for config in configs {
            let adapter: Arc<dyn IProviderAdapter> = if config.is_sandboxed() {
                Arc::new(SandboxAdapter::new(config.id.clone(), config.display_name.clone()))
            } else {
                match config.kind {
                    ProviderKind::GoogleDrive => {
                        Arc::new(GoogleDriveAdapter::new(config.clone(), client.clone()))
                    }
                    ProviderKind::Dropbox => {
                        Arc::new(DropboxAdapter::new(config.clone(), client.clone()))
                    }
                    ProviderKind::OneDrive => {
                        Arc::new(OneDriveAdapter::new(config.clone(), client.clone()))
                    }
                    ProviderKind::Box => Arc::new(BoxAdapter::new(config.clone(), client.clone())),
                }
            };
            debug!(provider = %config.id, sandboxed = config.is_sandboxed(), "Registered adapter");
            registry.register(adapter);
        }
        registry
    }

    /// Adds or replaces the adapter for its provider id
    pub fn register(&mut self, adapter: Arc<dyn IProviderAdapter>) {
        self.adapters.insert(adapter.provider_id().clone(), adapter);
    }

    pub fn get(&self, provider: &ProviderId) -> Result<Arc<dyn IProviderAdapter>, CloudError> {
        self.adapters
            .get(provider)
            .cloned()
            .ok_or_else(|| CloudError::UnknownProvider(provider.to_string()))
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        self.adapters.keys().cloned().collect()
    }
}

/// Parses an optional RFC 3339 timestamp, defaulting to the epoch
pub(crate) fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
