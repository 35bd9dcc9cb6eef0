//! Shared HTTP client for provider REST APIs
//!
//! Wraps a `reqwest::Client` configured with the request timeout and maps
//! transport failures and non-2xx responses onto the operation-specific
//! [`CloudError`] variants. Error messages carry the HTTP status, the
//! status text and a short excerpt of the response body.

use std::time::Duration;

use convortex_core::domain::CloudError;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Default request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum number of body characters copied into an error message
const BODY_EXCERPT_LEN: usize = 200;

/// The provider operation a request belongs to, used to pick the error variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Download,
    List,
}

impl Operation {
    /// Builds the [`CloudError`] for this operation
    pub fn error(self, provider: &str, message: impl Into<String>) -> CloudError {
        let provider = provider.to_string();
        let message = message.into();
        match self {
            Operation::Upload => CloudError::UploadError { provider, message },
            Operation::Download => CloudError::DownloadError { provider, message },
            Operation::List => CloudError::ListError { provider, message },
        }
    }
}

/// HTTP client shared by all provider adapters
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Creates a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build configured HTTP client, using defaults");
            Client::new()
        });
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Sends `request`, mapping only transport failures to errors
    ///
    /// Used where the caller needs to inspect a non-2xx status itself.
    pub async fn send_raw(
        &self,
        request: RequestBuilder,
        provider: &str,
        op: Operation,
    ) -> Result<Response, CloudError> {
        request
            .send()
            .await
            .map_err(|e| op.error(provider, format!("request failed: {e}")))
    }

    /// Sends `request` and requires a 2xx status
    pub async fn send(
        &self,
        request: RequestBuilder,
        provider: &str,
        op: Operation,
    ) -> Result<Response, CloudError> {
        let response = self.send_raw(request, provider, op).await?;
        ensure_success(response, provider, op).await
    }

    /// Sends `request`, requires a 2xx status and decodes the JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        provider: &str,
        op: Operation,
    ) -> Result<T, CloudError> {
        let response = self.send(request, provider, op).await?;
        read_json(response, provider, op).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Returns `response` unchanged if its status is 2xx, otherwise an error
pub async fn ensure_success(
    response: Response,
    provider: &str,
    op: Operation,
) -> Result<Response, CloudError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let message = failure_message(response).await;
    debug!(provider, ?op, %message, "Provider request failed");
    Err(op.error(provider, message))
}

/// Decodes a JSON body, reporting malformed payloads as operation errors
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    provider: &str,
    op: Operation,
) -> Result<T, CloudError> {
    response
        .json::<T>()
        .await
        .map_err(|e| op.error(provider, format!("invalid response: {e}")))
}

/// Formats `"<status> <reason>: <body excerpt>"` for a failed response
pub async fn failure_message(response: Response) -> String {
    let status = response.status();
    let status_text = match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    };
    let body = response.text().await.unwrap_or_default();
    let excerpt = excerpt(&body);
    if excerpt.is_empty() {
        status_text
    } else {
        format!("{status_text}: {excerpt}")
    }
}

/// Trims `body` to a single-line excerpt of bounded length
pub(crate) fn excerpt(body: &str) -> String {
    let flat: String = body
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() > BODY_EXCERPT_LEN {
        let cut: String = flat.chars().take(BODY_EXCERPT_LEN).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
