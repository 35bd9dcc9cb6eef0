//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`IFileCodec`] using `tokio::fs`, and scans a directory into
//! the [`LocalFile`] list the orchestrator consumes.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename so a download never
//!   leaves a half-written file behind.
//! - **Flat scan**: `scan_directory` looks at regular files directly inside
//!   the directory; subdirectories, symlinks and dotfiles are not offered.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use convortex_core::domain::{CloudError, LocalFile};
use convortex_core::ports::IFileCodec;
use tracing::{debug, instrument, warn};

fn local_error(path: &Path, err: std::io::Error) -> CloudError {
    CloudError::LocalFile(format!("{}: {}", path.display(), err))
}

/// Adapter that bridges the [`IFileCodec`] port to the real filesystem.
///
/// Zero-sized: every operation takes its path from the arguments.
#[derive(Debug, Clone, Default)]
pub struct FsFileCodec;

impl FsFileCodec {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl IFileCodec for FsFileCodec {
    #[instrument(skip(self, file), fields(path = %file.path.display()))]
    async fn read(&self, file: &LocalFile) -> Result<Vec<u8>, CloudError> {
        debug!("reading file");
        let data = tokio::fs::read(&file.path)
            .await
            .map_err(|e| local_error(&file.path, e))?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }

    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), CloudError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| local_error(parent, e))?;
        }

        // Same directory as the target so the rename stays on one filesystem.
        let tmp_path = {
            let mut p = path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };

        debug!(?tmp_path, "writing to temporary file");
        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| local_error(&tmp_path, e))?;

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(local_error(path, e));
        }

        debug!("write complete");
        Ok(())
    }
}

/// Describes the regular file at `path`, named after its last component
///
/// # Errors
/// [`CloudError::LocalFile`] if the path is missing, not a regular file, or
/// has no UTF-8 file name.
pub async fn describe_file(path: &Path) -> Result<LocalFile, CloudError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| local_error(path, e))?;
    if !metadata.is_file() {
        return Err(CloudError::LocalFile(format!(
            "{}: not a regular file",
            path.display()
        )));
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CloudError::LocalFile(format!("{}: no usable file name", path.display())))?;
    let modified_at: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|e| local_error(path, e))?;
    Ok(LocalFile::new(name, path, metadata.len(), modified_at))
}

/// Lists the regular files directly inside `dir`, sorted by name
///
/// # Errors
/// [`CloudError::LocalFile`] if the directory cannot be read.
#[instrument(fields(dir = %dir.display()))]
pub async fn scan_directory(dir: &Path) -> Result<Vec<LocalFile>, CloudError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| local_error(dir, e))?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(|e| local_error(dir, e))? {
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            warn!(path = %path.display(), "Skipping file with non UTF-8 name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type().await.map_err(|e| local_error(&path, e))?;
        if !file_type.is_file() {
            continue;
        }

        let metadata = entry.metadata().await.map_err(|e| local_error(&path, e))?;
        let modified_at: DateTime<Utc> = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| local_error(&path, e))?;

        files.push(LocalFile::new(name, path, metadata.len(), modified_at));
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = files.len(), "directory scanned");
    Ok(files)
}
