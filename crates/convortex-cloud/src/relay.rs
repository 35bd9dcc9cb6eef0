//! Token exchange implementations
//!
//! - [`RelayTokenExchange`] - Calls the backend relay, which holds client secrets
//! - [`SandboxTokenExchange`] - Mints synthetic tokens without network traffic
//! - [`RoutedTokenExchange`] - Picks one of the two per provider

use std::collections::HashSet;
use std::sync::Arc;

use convortex_core::domain::relay::{
    ExchangeRequest, RefreshRequest, RelayErrorBody, ERROR_MISSING_CREDENTIALS,
};
use convortex_core::domain::{
    CloudError, ProviderConfig, ProviderId, TokenResponse, DEFAULT_TOKEN_LIFETIME_SECS,
};
use convortex_core::ports::ITokenExchange;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{excerpt, ApiClient};

// ============================================================================
// RelayTokenExchange
// ============================================================================

/// Client of the token relay's `/oauth/exchange` and `/oauth/refresh` routes
pub struct RelayTokenExchange {
    client: Client,
    base_url: String,
}

/// Which relay route failed, to pick the matching error variant
#[derive(Clone, Copy)]
enum RelayCall {
    Exchange,
    Refresh,
}

impl RelayTokenExchange {
    pub fn new(base_url: impl Into<String>, client: &ApiClient) -> Self {
        Self {
            client: client.http().clone(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize>(
        &self,
        route: &str,
        body: &B,
        provider: &ProviderId,
        call: RelayCall,
    ) -> Result<TokenResponse, CloudError> {
        let url = format!("{}{}", self.base_url, route);
        debug!(provider = %provider, %url, "Calling token relay");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| call_error(call, provider, format!("relay unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(relay_failure(response, provider, call).await);
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| call_error(call, provider, format!("invalid relay response: {e}")))
    }
}

fn call_error(call: RelayCall, provider: &ProviderId, message: String) -> CloudError {
    match call {
        RelayCall::Exchange => CloudError::TokenExchangeFailed(message),
        RelayCall::Refresh => CloudError::RefreshFailed {
            provider: provider.to_string(),
            message,
        },
    }
}

async fn relay_failure(response: Response, provider: &ProviderId, call: RelayCall) -> CloudError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<RelayErrorBody>(&body) {
        Ok(err) if err.error == ERROR_MISSING_CREDENTIALS => {
            CloudError::MissingCredentials(provider.to_string())
        }
        Ok(err) => call_error(call, provider, format!("{}: {}", status, err.describe())),
        Err(_) => {
            let excerpt = excerpt(&body);
            let message = if excerpt.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {excerpt}")
            };
            call_error(call, provider, message)
        }
    }
}

#[async_trait::async_trait]
impl ITokenExchange for RelayTokenExchange {
    async fn exchange_code(
        &self,
        provider: &ProviderId,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, CloudError> {
        let body = ExchangeRequest {
            service_id: provider.to_string(),
            code: code.to_string(),
            redirect_uri: redirect_uri.to_string(),
        };
        let token = self
            .post("/oauth/exchange", &body, provider, RelayCall::Exchange)
            .await?;
        info!(provider = %provider, "Authorization code exchanged via relay");
        Ok(token)
    }

    async fn refresh(
        &self,
        provider: &ProviderId,
        refresh_token: &str,
    ) -> Result<TokenResponse, CloudError> {
        let body = RefreshRequest {
            service_id: provider.to_string(),
            refresh_token: refresh_token.to_string(),
        };
        self.post("/oauth/refresh", &body, provider, RelayCall::Refresh)
            .await
    }
}

// ============================================================================
// SandboxTokenExchange
// ============================================================================

/// Prefix of synthetic authorization codes produced in sandbox mode
pub const SANDBOX_CODE_PREFIX: &str = "sandbox-code-";

/// Issues synthetic one-hour tokens for sandboxed providers
#[derive(Debug, Default, Clone, Copy)]
pub struct SandboxTokenExchange;

impl SandboxTokenExchange {
    fn mint(provider: &ProviderId) -> TokenResponse {
        TokenResponse {
            access_token: format!("sandbox-access-{}-{}", provider, Uuid::new_v4().simple()),
            refresh_token: Some(format!("sandbox-refresh-{}-{}", provider, Uuid::new_v4().simple())),
            expires_in: Some(DEFAULT_TOKEN_LIFETIME_SECS),
            token_type: "Bearer".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ITokenExchange for SandboxTokenExchange {
    async fn exchange_code(
        &self,
        provider: &ProviderId,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenResponse, CloudError> {
        if code.is_empty() {
            return Err(CloudError::TokenExchangeFailed(
                "empty authorization code".to_string(),
            ));
        }
        debug!(provider = %provider, "Minting sandbox token");
        Ok(Self::mint(provider))
    }

    async fn refresh(
        &self,
        provider: &ProviderId,
        _refresh_token: &str,
    ) -> Result<TokenResponse, CloudError> {
        Ok(Self::mint(provider))
    }
}

// ============================================================================
// RoutedTokenExchange
// ============================================================================

/// Sends sandboxed providers to one exchange and everything else to another
pub struct RoutedTokenExchange {
    sandboxed: HashSet<ProviderId>,
    sandbox: Arc<dyn ITokenExchange>,
    live: Arc<dyn ITokenExchange>,
}

impl RoutedTokenExchange {
    pub fn new(
        sandboxed: HashSet<ProviderId>,
        sandbox: Arc<dyn ITokenExchange>,
        live: Arc<dyn ITokenExchange>,
    ) -> Self {
        Self {
            sandboxed,
            sandbox,
            live,
        }
    }

    /// Routes every provider without a client id to [`SandboxTokenExchange`]
    pub fn from_configs(configs: &[ProviderConfig], live: Arc<dyn ITokenExchange>) -> Self {
        let sandboxed = configs
            .iter()
            .filter(|c| c.is_sandboxed())
            .map(|c| c.id.clone())
            .collect();
        Self::new(sandboxed, Arc::new(SandboxTokenExchange), live)
    }

    fn route(&self, provider: &ProviderId) -> &Arc<dyn ITokenExchange> {
        if self.sandboxed.contains(provider) {
            &self.sandbox
        } else {
            &self.live
        }
    }
}

#[async_trait::async_trait]
impl ITokenExchange for RoutedTokenExchange {
    async fn exchange_code(
        &self,
        provider: &ProviderId,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, CloudError> {
        self.route(provider)
            .exchange_code(provider, code, redirect_uri)
            .await
    }

    async fn refresh(
        &self,
        provider: &ProviderId,
        refresh_token: &str,
    ) -> Result<TokenResponse, CloudError> {
        self.route(provider).refresh(provider, refresh_token).await
    }
}
