//! Providers command - List configured cloud providers

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

/// List enabled providers and how they are configured
#[derive(Debug, Args)]
pub struct ProvidersCommand {}

impl ProvidersCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);

        if format.is_json() {
            let providers: Vec<_> = ctx
                .providers
                .iter()
                .map(|p| {
                    json!({
                        "id": p.id.as_str(),
                        "name": p.display_name,
                        "sandboxed": p.is_sandboxed(),
                        "folder": p.folder,
                        "connected": ctx.tokens.is_connected(&p.id),
                    })
                })
                .collect();
            formatter.print_json(&json!({ "providers": providers }));
            return Ok(());
        }

        formatter.success(&format!("{} provider(s) enabled", ctx.providers.len()));
        for p in &ctx.providers {
            let mode = if p.is_sandboxed() { "sandbox" } else { "live" };
            let connected = if ctx.tokens.is_connected(&p.id) {
                "connected"
            } else {
                "not connected"
            };
            formatter.info(&format!(
                "{:<14} {:<13} {:<8} {:<14} folder: {}",
                p.id, p.display_name, mode, connected, p.folder
            ));
        }
        if ctx.config.oauth.demo_mode {
            formatter.warn("Demo mode is on: every provider uses the local sandbox");
        }
        Ok(())
    }
}
