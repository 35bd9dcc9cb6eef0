//! Wire types shared by the token relay and its clients
//!
//! Request bodies use camelCase keys; successful responses are a plain
//! [`TokenResponse`](super::TokenResponse).

use serde::{Deserialize, Serialize};

/// Error code returned when the relay holds no client secret for a provider
pub const ERROR_MISSING_CREDENTIALS: &str = "missing_credentials";
/// Error code returned for a `serviceId` the relay does not know
pub const ERROR_UNKNOWN_PROVIDER: &str = "unknown_provider";
/// Error code returned for a malformed request body
pub const ERROR_INVALID_REQUEST: &str = "invalid_request";
/// Error code returned when the provider rejects an authorization code
pub const ERROR_EXCHANGE_FAILED: &str = "exchange_failed";
/// Error code returned when the provider rejects a refresh token
pub const ERROR_REFRESH_FAILED: &str = "refresh_failed";

/// Body of `POST /oauth/exchange`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub service_id: String,
    pub code: String,
    pub redirect_uri: String,
}

/// Body of `POST /oauth/refresh`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub service_id: String,
    pub refresh_token: String,
}

/// Error body returned by the relay for any non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RelayErrorBody {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message.into()),
        }
    }

    /// Code and message joined for display
    pub fn describe(&self) -> String {
        match &self.message {
            Some(message) => format!("{}: {}", self.error, message),
            None => self.error.clone(),
        }
    }
}
