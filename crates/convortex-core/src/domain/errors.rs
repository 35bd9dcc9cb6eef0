//! Domain error types
//!
//! Two families of errors live here:
//! - [`DomainError`] for validation failures when constructing domain values
//! - [`CloudError`] for everything the OAuth, token and provider layers can
//!   report back to a caller

use thiserror::Error;

/// Errors that can occur when constructing or validating domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Provider identifier is empty or not a lowercase slug
    #[error("Invalid provider id: {0}")]
    InvalidProviderId(String),

    /// Remote file identifier is empty or contains control characters
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// File name is empty or contains a path separator
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors surfaced by the cloud-sync subsystem
///
/// None of these are fatal to the hosting process; every variant is meant to
/// be reported to the caller for display.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CloudError {
    /// The provider id is not present in the configured catalogue
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Callback state does not match any pending authorization
    #[error("OAuth state mismatch: callback rejected")]
    StateMismatch,

    /// The token relay has no client credentials for the provider
    #[error("Missing client credentials for {0}")]
    MissingCredentials(String),

    /// The relay or provider rejected the authorization code
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The refresh token was rejected; the provider must be re-authorized
    #[error("Token refresh failed for {provider}: {message}")]
    RefreshFailed {
        /// Provider whose session was torn down
        provider: String,
        /// Reason reported by the refresher
        message: String,
    },

    /// No token is stored for the provider
    #[error("Not connected to {0}")]
    NotConnected(String),

    /// Provider rejected an upload
    #[error("Upload to {provider} failed: {message}")]
    UploadError {
        /// Provider display name
        provider: String,
        /// Status text and body excerpt
        message: String,
    },

    /// Provider rejected a download
    #[error("Download from {provider} failed: {message}")]
    DownloadError {
        /// Provider display name
        provider: String,
        /// Status text and body excerpt
        message: String,
    },

    /// Provider rejected a folder listing
    #[error("Listing {provider} failed: {message}")]
    ListError {
        /// Provider display name
        provider: String,
        /// Status text and body excerpt
        message: String,
    },

    /// Token persistence back-end failed
    #[error("Token storage error: {0}")]
    Storage(String),

    /// The authorization popup/browser could not be opened
    #[error("Failed to open authorization page: {0}")]
    Launch(String),

    /// A local file could not be read or written
    #[error("Local file error: {0}")]
    LocalFile(String),
}

impl CloudError {
    /// Returns true if the error means the user must (re-)authorize the provider
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            CloudError::NotConnected(_) | CloudError::RefreshFailed { .. }
        )
    }
}

impl From<DomainError> for CloudError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidProviderId(id) => CloudError::UnknownProvider(id),
            other => CloudError::LocalFile(other.to_string()),
        }
    }
}
