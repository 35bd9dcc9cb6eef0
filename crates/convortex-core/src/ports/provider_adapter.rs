//! Provider adapter port (driven/secondary port)
//!
//! One implementation exists per cloud provider family. Each speaks that
//! provider's REST dialect and normalizes its listing shape into
//! [`RemoteFileDescriptor`].
//!
//! ## Design Notes
//!
//! - Access tokens are passed per call; adapters hold no credentials, so a
//!   single adapter instance can be shared freely across tasks.
//! - Errors use the typed [`CloudError`] taxonomy so the sync orchestrator can
//!   attribute failures per file without string matching.
//! - No retry policy: a failed call surfaces immediately to the caller.

use crate::domain::{CloudError, ProviderId, RemoteFileDescriptor, RemoteId};

/// Uniform upload/download/list contract over a provider's REST surface
#[async_trait::async_trait]
pub trait IProviderAdapter: Send + Sync {
    /// Identifier of the provider this adapter talks to
    fn provider_id(&self) -> &ProviderId;

    /// Human readable provider name, used in error messages
    fn display_name(&self) -> &str;

    /// Uploads `data` as `file_name` into the configured remote folder,
    /// overwriting any existing file with that name
    ///
    /// # Errors
    /// [`CloudError::UploadError`] on a non-success HTTP status; the message
    /// includes the provider's status text.
    async fn upload(
        &self,
        access_token: &str,
        data: Vec<u8>,
        file_name: &str,
    ) -> Result<RemoteFileDescriptor, CloudError>;

    /// Downloads the raw bytes of a remote file
    ///
    /// # Errors
    /// [`CloudError::DownloadError`] on a non-success HTTP status.
    async fn download(&self, access_token: &str, remote_id: &RemoteId)
        -> Result<Vec<u8>, CloudError>;

    /// Lists the files in the configured remote folder, following the
    /// provider's pagination until the listing is complete
    ///
    /// # Errors
    /// [`CloudError::ListError`] on a non-success HTTP status.
    async fn list(&self, access_token: &str) -> Result<Vec<RemoteFileDescriptor>, CloudError>;
}
