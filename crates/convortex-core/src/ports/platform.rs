//! Platform adapter ports
//!
//! Thin seams between the OAuth/sync logic and the host platform, so that
//! the logic is testable without a browser or a real filesystem.

use std::path::Path;

use crate::domain::{CloudError, LocalFile};

/// Opens an authorization URL for the user (browser tab, popup window, ...)
pub trait IPopupLauncher: Send + Sync {
    /// # Errors
    /// [`CloudError::Launch`] if the URL could not be opened.
    fn open(&self, url: &str) -> Result<(), CloudError>;
}

/// Reads and writes file contents on behalf of the sync orchestrator
#[async_trait::async_trait]
pub trait IFileCodec: Send + Sync {
    /// Reads the full contents of `file`
    async fn read(&self, file: &LocalFile) -> Result<Vec<u8>, CloudError>;

    /// Writes `data` to `path`, replacing any existing file
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), CloudError>;
}
