//! Sync command - Push a local directory to a provider
//!
//! Scans the directory (non-recursively), then uploads files that are
//! missing remotely or newer than the remote copy. Remote files are never
//! downloaded or deleted.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use convortex_sync::scan_directory;
use tracing::info;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

/// Upload new and modified files from a directory
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Provider id
    pub provider: String,
    /// Local directory to push
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

impl SyncCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);
        let id = ctx.provider_id(&self.provider)?;

        let files = scan_directory(&self.dir).await?;
        info!(provider = %id, dir = %self.dir.display(), files = files.len(), "Starting sync");
        formatter.info(&format!(
            "Syncing {} file(s) from {} to {}",
            files.len(),
            self.dir.display(),
            id
        ));

        let result = ctx
            .orchestrator
            .sync_files(&id, &files, |p| {
                formatter.progress(p.processed, p.total, p.percent, &p.file_name)
            })
            .await?;

        if format.is_json() {
            formatter.print_json(&serde_json::to_value(&result)?);
        } else {
            formatter.success(&format!(
                "Sync finished in {} ms: {} uploaded, {} up to date",
                result.duration_ms, result.uploaded_count, result.skipped_count
            ));
            for error in &result.errors {
                formatter.error(error);
            }
        }

        if !result.success {
            bail!("{} file(s) failed to sync", result.errors.len());
        }
        Ok(())
    }
}
