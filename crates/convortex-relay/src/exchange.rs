//! Provider token endpoint client
//!
//! Wraps the `oauth2` crate's code and refresh-token grants. The client
//! secret is sent in the request body (`AuthType::RequestBody`), which all
//! four supported providers accept.

use std::borrow::Cow;
use std::time::Duration;

use convortex_core::domain::TokenResponse;
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthType, AuthorizationCode, ClientId, ClientSecret, RedirectUrl, RefreshToken,
    RequestTokenError, TokenResponse as _, TokenUrl,
};
use tracing::{debug, warn};

use crate::credentials::ProviderCredentials;

/// Why an exchange or refresh did not produce a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeFailure {
    /// No client id or no client secret configured for the provider
    MissingCredentials,
    /// The caller's request was unusable (e.g. an invalid redirect URI)
    InvalidRequest(String),
    /// The provider refused the grant or could not be reached
    Rejected(String),
}

/// Performs OAuth grants against provider token endpoints
#[derive(Debug, Clone)]
pub struct ProviderTokenClient {
    http: reqwest::Client,
}

impl ProviderTokenClient {
    pub fn new(timeout: Duration) -> Self {
        // Token endpoints must not redirect; following one would leak the code.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build token HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { http }
    }

    /// Exchanges an authorization code for tokens
    pub async fn exchange_code(
        &self,
        credentials: &ProviderCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, ExchangeFailure> {
        let (client_id, client_secret) = credentials
            .pair()
            .ok_or(ExchangeFailure::MissingCredentials)?;
        let token_url = token_url(credentials)?;
        let redirect = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| ExchangeFailure::InvalidRequest(format!("invalid redirectUri: {e}")))?;

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.to_string()))
            .set_token_uri(token_url)
            .set_auth_type(AuthType::RequestBody);

        debug!(kind = ?credentials.kind, "Exchanging authorization code");
        let response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_redirect_uri(Cow::Owned(redirect))
            .request_async(&self.http)
            .await
            .map_err(|e| ExchangeFailure::Rejected(describe(e)))?;

        Ok(into_domain(&response))
    }

    /// Obtains a new access token from a refresh token
    pub async fn refresh(
        &self,
        credentials: &ProviderCredentials,
        refresh_token: &str,
    ) -> Result<TokenResponse, ExchangeFailure> {
        let (client_id, client_secret) = credentials
            .pair()
            .ok_or(ExchangeFailure::MissingCredentials)?;
        let token_url = token_url(credentials)?;

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.to_string()))
            .set_token_uri(token_url)
            .set_auth_type(AuthType::RequestBody);

        debug!(kind = ?credentials.kind, "Refreshing access token");
        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ExchangeFailure::Rejected(describe(e)))?;

        Ok(into_domain(&response))
    }
}

fn token_url(credentials: &ProviderCredentials) -> Result<TokenUrl, ExchangeFailure> {
    TokenUrl::new(credentials.token_url.clone())
        .map_err(|e| ExchangeFailure::Rejected(format!("invalid token endpoint: {e}")))
}

fn into_domain(response: &BasicTokenResponse) -> TokenResponse {
    TokenResponse {
        access_token: response.access_token().secret().clone(),
        refresh_token: response.refresh_token().map(|t| t.secret().clone()),
        expires_in: response
            .expires_in()
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX)),
        token_type: "Bearer".to_string(),
    }
}

fn describe<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => match response.error_description() {
            Some(description) => format!("{}: {}", response.error(), description),
            None => response.error().to_string(),
        },
        RequestTokenError::Request(e) => format!("token endpoint unreachable: {e}"),
        RequestTokenError::Parse(e, _) => format!("unreadable token response: {e}"),
        RequestTokenError::Other(message) => message,
    }
}
