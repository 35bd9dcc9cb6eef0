//! Token persistence and token exchange ports
//!
//! - [`ITokenPersistence`] is the durable side of the token store. The store
//!   owns the records; a persistence back-end only loads and saves them.
//! - [`ITokenExchange`] turns authorization codes and refresh tokens into
//!   fresh tokens. The production implementation talks to a backend relay
//!   that holds client secrets, so nothing on the client side ever sees one.

use crate::domain::{CloudError, ProviderId, TokenRecord, TokenResponse};

/// Durable, provider-keyed storage of [`TokenRecord`]s
///
/// Methods are synchronous: back-ends are local (a JSON file, the OS
/// keyring, memory) and the calls are short.
pub trait ITokenPersistence: Send + Sync {
    /// Loads the record for `provider`, if any
    fn load(&self, provider: &ProviderId) -> Result<Option<TokenRecord>, CloudError>;

    /// Stores `record` for `provider`, overwriting any existing record
    fn save(&self, provider: &ProviderId, record: &TokenRecord) -> Result<(), CloudError>;

    /// Deletes the record for `provider`; deleting a missing record succeeds
    fn delete(&self, provider: &ProviderId) -> Result<(), CloudError>;

    /// Provider ids that currently have a stored record
    fn providers(&self) -> Result<Vec<ProviderId>, CloudError>;
}

/// Exchange of authorization codes and refresh tokens for new tokens
#[async_trait::async_trait]
pub trait ITokenExchange: Send + Sync {
    /// Exchanges an authorization `code` obtained via `redirect_uri`
    ///
    /// # Errors
    /// [`CloudError::MissingCredentials`] when the relay has no client secret
    /// for the provider, [`CloudError::TokenExchangeFailed`] otherwise.
    async fn exchange_code(
        &self,
        provider: &ProviderId,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, CloudError>;

    /// Obtains a new access token from `refresh_token`
    ///
    /// # Errors
    /// [`CloudError::RefreshFailed`] when the refresh token is rejected.
    async fn refresh(
        &self,
        provider: &ProviderId,
        refresh_token: &str,
    ) -> Result<TokenResponse, CloudError>;
}
