//! OAuth token and pending-authorization records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::ProviderId;

/// Lifetime assumed when a token response omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Longer lifetimes are clamped to this (ten years)
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 3600;

/// Stored OAuth credentials for one provider
///
/// Exclusively owned by the token store: created on a successful code
/// exchange, replaced on refresh, deleted on disconnect or when a refresh
/// fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer token for authenticating API requests
    pub access_token: String,
    /// Token for obtaining a new access token without user interaction
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Returns true if the access token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if the access token has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Seconds left before expiry, negative once expired
    pub fn seconds_remaining(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

/// Token payload returned by the exchange relay
///
/// Mirrors the standard OAuth token response, which is what the relay passes
/// through from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Access-token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Converts the response into a record anchored at `now`
    ///
    /// A refresh response that omits `refresh_token` keeps `previous_refresh`,
    /// since most providers only rotate it occasionally.
    pub fn into_record_at(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> TokenRecord {
        let lifetime = self
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let expires_at = Duration::try_seconds(lifetime)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        TokenRecord {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at,
        }
    }

    /// Converts the response into a record anchored at the current time
    pub fn into_record(self, previous_refresh: Option<String>) -> TokenRecord {
        self.into_record_at(Utc::now(), previous_refresh)
    }
}

/// An OAuth flow that has been started and is waiting for its callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    /// Random anti-forgery value echoed back by the provider
    pub state: String,
    pub provider_id: ProviderId,
    pub created_at: DateTime<Utc>,
}

impl PendingAuthorization {
    pub fn new(state: impl Into<String>, provider_id: ProviderId) -> Self {
        Self {
            state: state.into(),
            provider_id,
            created_at: Utc::now(),
        }
    }

    /// True if `state` is the value this flow was started with
    pub fn matches(&self, state: &str) -> bool {
        !state.is_empty() && self.state == state
    }
}
