//! Token Store
//!
//! Owns the OAuth token record of every connected provider and hands out
//! valid access tokens, refreshing expired ones on demand.
//!
//! Refresh is single-flight per provider: concurrent callers that find the
//! same expired record serialize on a per-provider lock, and whoever enters
//! second re-reads the record and returns the token refreshed by the first.
//! If the first caller's refresh failed, the waiters get the same
//! `RefreshFailed` instead of a refresh attempt of their own.

use std::sync::Arc;

use chrono::Utc;
use convortex_core::domain::{CloudError, ProviderId, TokenRecord, TokenResponse};
use convortex_core::ports::{ITokenExchange, ITokenPersistence};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct TokenStore {
    persistence: Arc<dyn ITokenPersistence>,
    exchange: Arc<dyn ITokenExchange>,
    /// Per-provider refresh lock, guarding the message of the last failed refresh
    refresh_locks: DashMap<ProviderId, Arc<Mutex<Option<String>>>>,
}

impl TokenStore {
    pub fn new(persistence: Arc<dyn ITokenPersistence>, exchange: Arc<dyn ITokenExchange>) -> Self {
        Self {
            persistence,
            exchange,
            refresh_locks: DashMap::new(),
        }
    }

    /// True if a record exists for `provider` and has not expired
    ///
    /// Never refreshes. A persistence failure counts as not connected.
    pub fn is_connected(&self, provider: &ProviderId) -> bool {
        match self.persistence.load(provider) {
            Ok(Some(record)) => record.expires_at > Utc::now(),
            Ok(None) => false,
            Err(e) => {
                warn!(provider = %provider, error = %e, "Failed to read token record");
                false
            }
        }
    }

    /// Returns a copy of the stored record, e.g. for status display
    pub fn record(&self, provider: &ProviderId) -> Result<Option<TokenRecord>, CloudError> {
        self.persistence.load(provider)
    }

    /// Stores the token obtained from an authorization, overwriting any record
    pub fn store(
        &self,
        provider: &ProviderId,
        response: TokenResponse,
    ) -> Result<TokenRecord, CloudError> {
        let record = response.into_record(None);
        self.store_record(provider, &record)?;
        Ok(record)
    }

    /// Stores `record` as-is, overwriting any existing record
    pub fn store_record(&self, provider: &ProviderId, record: &TokenRecord) -> Result<(), CloudError> {
        self.persistence.save(provider, record)?;
        info!(provider = %provider, expires_at = %record.expires_at, "Stored token");
        Ok(())
    }

    /// Deletes the record for `provider`; removing an absent record succeeds
    pub fn remove(&self, provider: &ProviderId) -> Result<(), CloudError> {
        self.persistence.delete(provider)?;
        info!(provider = %provider, "Removed token");
        Ok(())
    }

    /// Providers that currently pass [`is_connected`](Self::is_connected)
    pub fn connected_providers(&self) -> Result<Vec<ProviderId>, CloudError> {
        Ok(self
            .persistence
            .providers()?
            .into_iter()
            .filter(|p| self.is_connected(p))
            .collect())
    }

    /// Returns a non-expired access token for `provider`
    ///
    /// # Errors
    /// - [`CloudError::NotConnected`] if no record is stored
    /// - [`CloudError::RefreshFailed`] if the record expired and could not be
    ///   refreshed; the record is deleted in that case
    pub async fn get_valid_access_token(&self, provider: &ProviderId) -> Result<String, CloudError> {
        let record = self
            .persistence
            .load(provider)?
            .ok_or_else(|| CloudError::NotConnected(provider.to_string()))?;

        if !record.is_expired() {
            return Ok(record.access_token);
        }

        let lock = self
            .refresh_locks
            .entry(provider.clone())
            .or_default()
            .value()
            .clone();
        let mut last_failure = lock.lock().await;

        // Another caller may have refreshed (or torn down) while we waited.
        let Some(record) = self.persistence.load(provider)? else {
            let message = last_failure
                .clone()
                .unwrap_or_else(|| "session ended during refresh".to_string());
            debug!(provider = %provider, "Session torn down by a concurrent caller");
            return Err(CloudError::RefreshFailed {
                provider: provider.to_string(),
                message,
            });
        };
        if !record.is_expired() {
            debug!(provider = %provider, "Token already refreshed by a concurrent caller");
            return Ok(record.access_token);
        }

        let result = self.refresh(provider, record).await;
        *last_failure = match &result {
            Err(CloudError::RefreshFailed { message, .. }) => Some(message.clone()),
            _ => None,
        };
        result
    }

    async fn refresh(&self, provider: &ProviderId, record: TokenRecord) -> Result<String, CloudError> {
        let Some(refresh_token) = record.refresh_token else {
            return self.tear_down(provider, "no refresh token available".to_string());
        };

        info!(provider = %provider, "Refreshing access token");
        match self.exchange.refresh(provider, &refresh_token).await {
            Ok(response) => {
                let refreshed = response.into_record(Some(refresh_token));
                self.persistence.save(provider, &refreshed)?;
                info!(provider = %provider, expires_at = %refreshed.expires_at, "Access token refreshed");
                Ok(refreshed.access_token)
            }
            Err(CloudError::RefreshFailed { message, .. }) => self.tear_down(provider, message),
            Err(e) => self.tear_down(provider, e.to_string()),
        }
    }

    fn tear_down(&self, provider: &ProviderId, message: String) -> Result<String, CloudError> {
        warn!(provider = %provider, reason = %message, "Refresh failed, disconnecting provider");
        if let Err(e) = self.persistence.delete(provider) {
            warn!(provider = %provider, error = %e, "Failed to delete stale token record");
        }
        Err(CloudError::RefreshFailed {
            provider: provider.to_string(),
            message,
        })
    }
}
