//! OAuth2 Authorization Code flow controller
//!
//! Drives the per-provider authorization flow:
//!
//! 1. [`OAuthFlowController::begin_authorization`] composes the provider's
//!    authorization URL with a fresh random `state` and records the pending flow
//! 2. The URL is handed to an [`IPopupLauncher`] (see [`OAuthFlowController::connect`])
//! 3. [`OAuthFlowController::complete_authorization`] validates the returned
//!    `state`, exchanges the code through an [`ITokenExchange`] and stores the
//!    token in the [`TokenStore`]
//!
//! Providers without a client id are sandboxed: the authorization URL points
//! straight back at the redirect URI with a synthetic code, and the routed
//! exchange mints a synthetic token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use convortex_core::domain::{CloudError, PendingAuthorization, ProviderConfig, ProviderId};
use convortex_core::ports::{IPopupLauncher, ITokenExchange};
use dashmap::DashMap;
use oauth2::{basic::BasicClient, AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::callback::CallbackParams;
use crate::relay::SANDBOX_CODE_PREFIX;
use crate::token_store::TokenStore;

/// Where a provider's authorization flow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    AuthorizationRequested,
    AwaitingCallback,
    TokenExchanged,
    Failed,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlowState::Idle => "idle",
            FlowState::AuthorizationRequested => "authorization requested",
            FlowState::AwaitingCallback => "awaiting callback",
            FlowState::TokenExchanged => "connected",
            FlowState::Failed => "failed",
        };
        f.write_str(s)
    }
}

pub struct OAuthFlowController {
    providers: HashMap<ProviderId, ProviderConfig>,
    redirect_uri: String,
    token_store: Arc<TokenStore>,
    exchange: Arc<dyn ITokenExchange>,
    /// At most one pending flow per provider
    pending: Mutex<HashMap<ProviderId, PendingAuthorization>>,
    states: DashMap<ProviderId, FlowState>,
}

impl OAuthFlowController {
    pub fn new(
        providers: Vec<ProviderConfig>,
        redirect_uri: impl Into<String>,
        token_store: Arc<TokenStore>,
        exchange: Arc<dyn ITokenExchange>,
    ) -> Self {
        Self {
            providers: providers.into_iter().map(|p| (p.id.clone(), p)).collect(),
            redirect_uri: redirect_uri.into(),
            token_store,
            exchange,
            pending: Mutex::new(HashMap::new()),
            states: DashMap::new(),
        }
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn provider(&self, provider: &ProviderId) -> Result<&ProviderConfig, CloudError> {
        self.providers
            .get(provider)
            .ok_or_else(|| CloudError::UnknownProvider(provider.to_string()))
    }

    pub fn flow_state(&self, provider: &ProviderId) -> FlowState {
        self.states
            .get(provider)
            .map(|s| *s.value())
            .unwrap_or(FlowState::Idle)
    }

    fn set_state(&self, provider: &ProviderId, state: FlowState) {
        debug!(provider = %provider, %state, "Flow state changed");
        self.states.insert(provider.clone(), state);
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<ProviderId, PendingAuthorization>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts an authorization flow and returns the URL the user must visit
    ///
    /// Starting again for the same provider replaces the earlier pending flow.
    pub fn begin_authorization(&self, provider: &ProviderId) -> Result<String, CloudError> {
        let config = self.provider(provider)?;
        let state = CsrfToken::new_random().secret().clone();

        let url = if config.is_sandboxed() {
            self.sandbox_url(&state)?
        } else {
            self.authorization_url(config, &state)?
        };

        self.pending()
            .insert(provider.clone(), PendingAuthorization::new(state, provider.clone()));
        self.set_state(provider, FlowState::AuthorizationRequested);
        info!(provider = %provider, sandboxed = config.is_sandboxed(), "Authorization started");
        Ok(url)
    }

    fn authorization_url(&self, config: &ProviderConfig, state: &str) -> Result<String, CloudError> {
        let client_id = config.client_id.clone().unwrap_or_default();
        let auth_url = AuthUrl::new(config.auth_url.clone()).map_err(|e| {
            CloudError::Launch(format!("invalid authorization endpoint for {}: {e}", config.id))
        })?;
        let redirect = RedirectUrl::new(self.redirect_uri.clone())
            .map_err(|e| CloudError::Launch(format!("invalid redirect URI: {e}")))?;

        let client = BasicClient::new(ClientId::new(client_id))
            .set_auth_uri(auth_url)
            .set_redirect_uri(redirect);

        let state = state.to_string();
        let mut request = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(config.scopes.iter().cloned().map(Scope::new));
        for (name, value) in &config.extra_auth_params {
            request = request.add_extra_param(name.as_str(), value.as_str());
        }

        let (url, _state) = request.url();
        Ok(url.to_string())
    }

    fn sandbox_url(&self, state: &str) -> Result<String, CloudError> {
        let mut url = url::Url::parse(&self.redirect_uri)
            .map_err(|e| CloudError::Launch(format!("invalid redirect URI: {e}")))?;
        let code = format!("{SANDBOX_CODE_PREFIX}{}", Uuid::new_v4().simple());
        url.query_pairs_mut()
            .append_pair("code", &code)
            .append_pair("state", state);
        Ok(url.to_string())
    }

    /// Begins authorization and hands the URL to `launcher`
    pub fn connect(
        &self,
        provider: &ProviderId,
        launcher: &dyn IPopupLauncher,
    ) -> Result<String, CloudError> {
        let url = self.begin_authorization(provider)?;
        if let Err(e) = launcher.open(&url) {
            self.pending().remove(provider);
            self.set_state(provider, FlowState::Failed);
            return Err(e);
        }
        self.set_state(provider, FlowState::AwaitingCallback);
        Ok(url)
    }

    /// Finishes the flow whose pending `state` matches
    ///
    /// # Errors
    /// - [`CloudError::StateMismatch`] if no pending flow carries `state`; no
    ///   pending flow is consumed and the token store is untouched
    /// - any error from the token exchange, after which the flow is `Failed`
    pub async fn complete_authorization(&self, code: &str, state: &str) -> Result<bool, CloudError> {
        let pending = self.take_pending(state)?;
        let provider = pending.provider_id;

        match self
            .exchange
            .exchange_code(&provider, code, &self.redirect_uri)
            .await
            .and_then(|token| self.token_store.store(&provider, token))
        {
            Ok(_) => {
                self.set_state(&provider, FlowState::TokenExchanged);
                info!(provider = %provider, "Authorization completed");
                Ok(true)
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Authorization failed");
                self.set_state(&provider, FlowState::Failed);
                Err(e)
            }
        }
    }

    /// Finishes a flow from raw callback parameters
    ///
    /// A provider-reported `error` fails the matching flow with
    /// [`CloudError::TokenExchangeFailed`].
    pub async fn complete_from_callback(&self, params: &CallbackParams) -> Result<bool, CloudError> {
        if let Some(message) = params.error_message() {
            let pending = self.take_pending(&params.state)?;
            self.set_state(&pending.provider_id, FlowState::Failed);
            warn!(provider = %pending.provider_id, %message, "Provider denied authorization");
            return Err(CloudError::TokenExchangeFailed(message));
        }

        let code = params.code.as_deref().unwrap_or_default();
        self.complete_authorization(code, &params.state).await
    }

    fn take_pending(&self, state: &str) -> Result<PendingAuthorization, CloudError> {
        let mut pending = self.pending();
        let provider = pending
            .values()
            .find(|p| p.matches(state))
            .map(|p| p.provider_id.clone());
        match provider.and_then(|p| pending.remove(&p)) {
            Some(found) => Ok(found),
            None => {
                warn!("Callback state does not match any pending authorization");
                Err(CloudError::StateMismatch)
            }
        }
    }

    /// Removes stored tokens and any pending flow for `provider`
    pub fn disconnect(&self, provider: &ProviderId) -> Result<(), CloudError> {
        self.provider(provider)?;
        self.pending().remove(provider);
        self.token_store.remove(provider)?;
        self.set_state(provider, FlowState::Idle);
        Ok(())
    }

    pub fn has_pending(&self, provider: &ProviderId) -> bool {
        self.pending().contains_key(provider)
    }
}
