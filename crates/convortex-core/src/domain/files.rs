//! File descriptors on both sides of a sync, and the sync summary

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote file, normalized from a provider's native listing shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileDescriptor {
    /// Provider-native identifier, usable with `download`
    pub id: String,
    pub name: String,
    /// MIME type when the provider reports one
    pub mime_type: Option<String>,
    /// Size in bytes
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

/// A local file offered to the sync orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Name used for remote matching and upload
    pub name: String,
    /// Where the content lives; interpreted by the file codec
    pub path: PathBuf,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

impl LocalFile {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            modified_at,
        }
    }

    /// True if this file should overwrite `remote`
    ///
    /// Only a strictly newer local modification time wins; equal timestamps
    /// are treated as already in sync.
    pub fn is_newer_than(&self, remote: &RemoteFileDescriptor) -> bool {
        self.modified_at > remote.modified_at
    }
}

/// Summary of one `sync_files` invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// True when no per-file error was recorded
    pub success: bool,
    pub uploaded_count: u32,
    /// Always zero for upload-direction syncs
    pub downloaded_count: u32,
    /// Per-file failures, in processing order
    pub errors: Vec<String>,
    /// Files skipped because the remote copy was as new or newer
    pub skipped_count: u32,
    /// Wall-clock duration of the sync in milliseconds
    pub duration_ms: u64,
}

/// Progress notification emitted after each processed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    pub processed: usize,
    pub total: usize,
    /// Percent complete, 0..=100
    pub percent: u8,
    /// Name of the file that was just processed
    pub file_name: String,
}

impl SyncProgress {
    pub fn new(processed: usize, total: usize, file_name: impl Into<String>) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((processed.min(total) * 100) / total) as u8
        };
        Self {
            processed,
            total,
            percent,
            file_name: file_name.into(),
        }
    }
}
