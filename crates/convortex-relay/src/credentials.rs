//! Provider credentials held by the relay
//!
//! Client ids and token endpoints come from the shared configuration file;
//! client secrets come from environment variables (named per provider in
//! config, defaulting to `CONVORTEX_<PROVIDER>_CLIENT_SECRET`).

use std::collections::BTreeMap;
use std::fmt;

use convortex_core::config::Config;
use convortex_core::domain::{ProviderId, ProviderKind};
use tracing::{info, warn};

/// Everything the relay needs to talk to one provider's token endpoint
#[derive(Clone)]
pub struct ProviderCredentials {
    pub kind: ProviderKind,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
}

impl ProviderCredentials {
    /// Client id and secret, when both are present
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Credentials for every enabled provider, keyed by provider id
#[derive(Debug, Clone, Default)]
pub struct RelayCredentials {
    providers: BTreeMap<ProviderId, ProviderCredentials>,
}

impl RelayCredentials {
    /// Builds credentials from `config`, reading secrets from the process
    /// environment
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with(config, |var| std::env::var(var).ok())
    }

    /// Builds credentials from `config`, resolving secret variables with
    /// `lookup`
    pub fn from_config_with<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut providers = BTreeMap::new();
        // Demo mode only affects clients; the relay always uses real ids.
        for provider in config.provider_configs() {
            let kind = provider.kind;
            let client_id = config.provider_settings(kind).client_id.clone();
            let secret_var = config.client_secret_env(kind);
            let client_secret = lookup(&secret_var).filter(|s| !s.is_empty());

            if client_id.is_none() || client_secret.is_none() {
                warn!(
                    provider = %provider.id,
                    secret_var = %secret_var,
                    has_client_id = client_id.is_some(),
                    has_client_secret = client_secret.is_some(),
                    "Provider credentials incomplete; exchanges will fail"
                );
            } else {
                info!(provider = %provider.id, "Provider credentials loaded");
            }

            providers.insert(
                provider.id.clone(),
                ProviderCredentials {
                    kind,
                    client_id,
                    client_secret,
                    auth_url: provider.auth_url,
                    token_url: provider.token_url,
                },
            );
        }
        Self { providers }
    }

    pub fn insert(&mut self, id: ProviderId, credentials: ProviderCredentials) {
        self.providers.insert(id, credentials);
    }

    /// Credentials for the provider with id `service_id`
    pub fn get(&self, service_id: &str) -> Option<&ProviderCredentials> {
        let id = ProviderId::new(service_id).ok()?;
        self.providers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
