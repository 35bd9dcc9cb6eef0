//! Connect / disconnect commands - OAuth authorization per provider
//!
//! `convortex connect <provider>`:
//! 1. Binds the local callback server on the configured redirect URI
//! 2. Opens the provider consent page (or prints it with `--no-browser`)
//! 3. Waits for the redirect and completes the flow through the relay
//!
//! Sandboxed providers skip the browser: their authorization URL already
//! carries a synthetic code, which is completed directly.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use convortex_cloud::launcher::{RecordingLauncher, WebBrowserLauncher};
use convortex_cloud::{CallbackParams, LocalCallbackServer};
use serde_json::json;
use tracing::info;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

/// Authorize Convortex to access a provider
#[derive(Debug, Args)]
pub struct ConnectCommand {
    /// Provider id (google-drive, dropbox, onedrive, box)
    pub provider: String,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Seconds to wait for the OAuth redirect
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

impl ConnectCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);
        let provider = ctx.provider(&self.provider)?;
        let id = provider.id.clone();

        if provider.is_sandboxed() {
            info!(provider = %id, "Running sandbox authorization");
            let url = ctx.controller.begin_authorization(&id)?;
            let params = CallbackParams::from_uri(&url)
                .context("Sandbox authorization URL carries no code")?;
            ctx.controller.complete_from_callback(&params).await?;
        } else {
            let server = LocalCallbackServer::bind(ctx.controller.redirect_uri()).await?;

            if self.no_browser {
                let launcher = RecordingLauncher::new();
                let url = ctx.controller.connect(&id, &launcher)?;
                if format.is_json() {
                    formatter.print_json(&json!({ "authorization_url": url }));
                } else {
                    formatter.info(&format!(
                        "Open this URL to authorize {}:",
                        provider.display_name
                    ));
                    formatter.info(&url);
                }
            } else {
                formatter.info(&format!(
                    "Opening browser for {} authorization...",
                    provider.display_name
                ));
                ctx.controller
                    .connect(&id, &WebBrowserLauncher)
                    .context("Could not open a browser; retry with --no-browser")?;
            }

            formatter.info("Waiting for authorization callback...");
            let params = server
                .wait_for_callback(Duration::from_secs(self.timeout))
                .await?;
            ctx.controller.complete_from_callback(&params).await?;
        }

        let state = ctx.controller.flow_state(&id);
        if format.is_json() {
            formatter.print_json(&json!({
                "provider": id.as_str(),
                "connected": ctx.tokens.is_connected(&id),
                "sandboxed": provider.is_sandboxed(),
                "flow_state": state,
            }));
        } else {
            formatter.success(&format!("Connected to {}", provider.display_name));
            if provider.is_sandboxed() {
                formatter.info("Sandbox mode: files are kept in memory for this session only");
            }
        }
        Ok(())
    }
}

/// Remove stored tokens for a provider
#[derive(Debug, Args)]
pub struct DisconnectCommand {
    /// Provider id
    pub provider: String,
}

impl DisconnectCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);
        let id = ctx.provider_id(&self.provider)?;

        let was_connected = ctx.tokens.record(&id)?.is_some();
        ctx.controller.disconnect(&id)?;

        if format.is_json() {
            formatter.print_json(&json!({
                "provider": id.as_str(),
                "disconnected": true,
                "had_tokens": was_connected,
            }));
        } else if was_connected {
            formatter.success(&format!("Disconnected {id}"));
        } else {
            formatter.success(&format!("{id} had no stored tokens"));
        }
        Ok(())
    }
}
