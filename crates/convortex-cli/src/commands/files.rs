//! File commands - List, upload and download single files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use convortex_core::domain::RemoteId;
use convortex_sync::describe_file;
use serde_json::json;

use crate::context::AppContext;
use crate::output::{get_formatter, human_size, OutputFormat};

/// List files in the provider's Convortex folder
#[derive(Debug, Args)]
pub struct LsCommand {
    /// Provider id
    pub provider: String,
}

impl LsCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);
        let id = ctx.provider_id(&self.provider)?;

        let files = ctx.orchestrator.list_remote(&id).await?;

        if format.is_json() {
            formatter.print_json(&json!({ "provider": id.as_str(), "files": files }));
            return Ok(());
        }

        formatter.success(&format!("{} file(s) on {}", files.len(), id));
        for file in &files {
            formatter.info(&format!(
                "{:<40} {:>10}  {}  {}",
                file.name,
                human_size(file.size),
                file.modified_at.format("%Y-%m-%d %H:%M"),
                file.id
            ));
        }
        Ok(())
    }
}

/// Upload one local file, replacing any remote file of the same name
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Provider id
    pub provider: String,
    /// Local file to upload
    pub path: PathBuf,
}

impl UploadCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);
        let id = ctx.provider_id(&self.provider)?;

        let local = describe_file(&self.path).await?;
        let remote = ctx.orchestrator.upload_file(&id, &local).await?;

        if format.is_json() {
            formatter.print_json(&json!({ "provider": id.as_str(), "file": remote }));
        } else {
            formatter.success(&format!(
                "Uploaded {} ({})",
                remote.name,
                human_size(local.size)
            ));
            formatter.info(&format!("Remote id: {}", remote.id));
        }
        Ok(())
    }
}

/// Download one remote file by id
#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Provider id
    pub provider: String,
    /// Remote file id, as shown by `convortex ls`
    pub remote_id: String,
    /// Destination path (defaults to the remote file name in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DownloadCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);
        let id = ctx.provider_id(&self.provider)?;
        let remote_id = RemoteId::new(self.remote_id.clone())
            .with_context(|| format!("Invalid remote id '{}'", self.remote_id))?;

        let destination = match &self.output {
            Some(path) => path.clone(),
            None => {
                let listing = ctx.orchestrator.list_remote(&id).await?;
                let name = listing
                    .iter()
                    .find(|f| f.id == remote_id.as_str())
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| safe_file_name(remote_id.as_str()));
                PathBuf::from(name)
            }
        };

        let bytes = ctx
            .orchestrator
            .download_file(&id, &remote_id, &destination)
            .await?;

        if format.is_json() {
            formatter.print_json(&json!({
                "provider": id.as_str(),
                "remote_id": remote_id.as_str(),
                "path": destination.display().to_string(),
                "bytes": bytes,
            }));
        } else {
            formatter.success(&format!(
                "Downloaded {} to {}",
                human_size(bytes),
                destination.display()
            ));
        }
        Ok(())
    }
}

/// Turns a provider id such as `id:abc/def` into a usable file name
fn safe_file_name(remote_id: &str) -> String {
    remote_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
