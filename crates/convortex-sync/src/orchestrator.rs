//! Upload-direction sync orchestration
//!
//! The [`SyncOrchestrator`] pushes a set of local files to one provider's
//! folder, uploading a file only when the remote side has no file of that
//! name or has an older copy.
//!
//! ## Sync Flow
//!
//! 1. **Pre-flight**: Resolve the adapter, obtain a valid access token and
//!    list the remote folder. A failure here aborts the whole sync.
//! 2. **Per file**: Decide upload/skip by name and modification time, read
//!    the content through the file codec and upload it. A failure here is
//!    recorded against the file and the sync moves on.
//! 3. **Summary**: Return a [`SyncResult`] with counts, errors and duration.
//!
//! Remote files are never downloaded during a sync; downloads are explicit
//! via [`SyncOrchestrator::download_file`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use convortex_cloud::{ProviderRegistry, TokenStore};
use convortex_core::domain::{
    CloudError, LocalFile, ProviderId, RemoteFileDescriptor, RemoteId, SyncProgress, SyncResult,
};
use convortex_core::ports::{IFileCodec, IProviderAdapter};
use tracing::{debug, info, instrument, warn};

/// Drives uploads, downloads and listings through the token store and the
/// provider registry
pub struct SyncOrchestrator {
    tokens: Arc<TokenStore>,
    registry: Arc<ProviderRegistry>,
    codec: Arc<dyn IFileCodec>,
}

impl SyncOrchestrator {
    pub fn new(
        tokens: Arc<TokenStore>,
        registry: Arc<ProviderRegistry>,
        codec: Arc<dyn IFileCodec>,
    ) -> Self {
        Self {
            tokens,
            registry,
            codec,
        }
    }

    /// Uploads every local file that is missing remotely or newer than its
    /// remote namesake
    ///
    /// `on_progress` is called once per local file, after that file has been
    /// handled, whether it was uploaded, skipped or failed.
    ///
    /// # Errors
    /// Only pre-flight failures are returned as `Err`: unknown provider, no
    /// usable token, or a failed remote listing. Per-file failures end up in
    /// [`SyncResult::errors`] as `"<file name>: <message>"`.
    #[instrument(skip(self, local_files, on_progress), fields(provider = %provider, files = local_files.len()))]
    pub async fn sync_files<F>(
        &self,
        provider: &ProviderId,
        local_files: &[LocalFile],
        mut on_progress: F,
    ) -> Result<SyncResult, CloudError>
    where
        F: FnMut(SyncProgress),
    {
        let started = Instant::now();
        let adapter = self.registry.get(provider)?;
        let token = self.tokens.get_valid_access_token(provider).await?;
        let remote_files = adapter.list(&token).await?;

        // First listing entry wins when a folder holds duplicate names.
        let mut remote_by_name: HashMap<&str, &RemoteFileDescriptor> = HashMap::new();
        for remote in &remote_files {
            remote_by_name.entry(remote.name.as_str()).or_insert(remote);
        }
        debug!(remote = remote_files.len(), "Remote folder listed");

        let mut result = SyncResult::default();
        let total = local_files.len();

        for (index, file) in local_files.iter().enumerate() {
            match remote_by_name.get(file.name.as_str()) {
                Some(remote) if !file.is_newer_than(remote) => {
                    debug!(file = %file.name, "Remote copy is current, skipping");
                    result.skipped_count += 1;
                }
                _ => match self.push(adapter.as_ref(), provider, file).await {
                    Ok(uploaded) => {
                        debug!(file = %file.name, remote_id = %uploaded.id, "Uploaded");
                        result.uploaded_count += 1;
                    }
                    Err(e) => {
                        let msg = format!("{}: {}", file.name, e);
                        warn!(%msg);
                        result.errors.push(msg);
                    }
                },
            }

            on_progress(SyncProgress::new(index + 1, total, file.name.clone()));
        }

        result.success = result.errors.is_empty();
        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            uploaded = result.uploaded_count,
            skipped = result.skipped_count,
            errors = result.errors.len(),
            duration_ms = result.duration_ms,
            "Sync finished"
        );
        Ok(result)
    }

    /// Uploads a single local file, overwriting any remote file of that name
    #[instrument(skip(self, file), fields(provider = %provider, file = %file.name))]
    pub async fn upload_file(
        &self,
        provider: &ProviderId,
        file: &LocalFile,
    ) -> Result<RemoteFileDescriptor, CloudError> {
        let adapter = self.registry.get(provider)?;
        self.push(adapter.as_ref(), provider, file).await
    }

    /// Downloads a remote file and writes it to `destination`
    ///
    /// Returns the number of bytes written.
    #[instrument(skip(self, destination), fields(provider = %provider, remote_id = %remote_id))]
    pub async fn download_file(
        &self,
        provider: &ProviderId,
        remote_id: &RemoteId,
        destination: &Path,
    ) -> Result<u64, CloudError> {
        let adapter = self.registry.get(provider)?;
        let token = self.tokens.get_valid_access_token(provider).await?;
        let data = adapter.download(&token, remote_id).await?;
        self.codec.write(destination, &data).await?;
        info!(bytes = data.len(), destination = %destination.display(), "Downloaded");
        Ok(data.len() as u64)
    }

    /// Lists the provider's configured folder
    #[instrument(skip(self), fields(provider = %provider))]
    pub async fn list_remote(
        &self,
        provider: &ProviderId,
    ) -> Result<Vec<RemoteFileDescriptor>, CloudError> {
        let adapter = self.registry.get(provider)?;
        let token = self.tokens.get_valid_access_token(provider).await?;
        adapter.list(&token).await
    }

    // A fresh token per file, so a long sync survives an expiry mid-way.
    async fn push(
        &self,
        adapter: &dyn IProviderAdapter,
        provider: &ProviderId,
        file: &LocalFile,
    ) -> Result<RemoteFileDescriptor, CloudError> {
        let token = self.tokens.get_valid_access_token(provider).await?;
        let data = self.codec.read(file).await?;
        adapter.upload(&token, data, &file.name).await
    }
}
