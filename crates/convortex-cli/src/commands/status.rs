//! Status command - Connection state of every provider

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde_json::json;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

/// Show which providers are connected and when their tokens expire
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Only show this provider
    pub provider: Option<String>,
}

impl StatusCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let ctx = AppContext::load(config_path)?;
        let formatter = get_formatter(format);

        let selected: Vec<_> = match &self.provider {
            Some(id) => vec![ctx.provider(id)?],
            None => ctx.providers.iter().collect(),
        };

        let now = Utc::now();
        let mut rows = Vec::new();
        for provider in selected {
            let record = ctx.tokens.record(&provider.id)?;
            rows.push((provider, record));
        }

        if format.is_json() {
            let items: Vec<_> = rows
                .iter()
                .map(|(p, record)| {
                    json!({
                        "provider": p.id.as_str(),
                        "connected": record.as_ref().is_some_and(|r| !r.is_expired_at(now)),
                        "has_refresh_token": record.as_ref().is_some_and(|r| r.refresh_token.is_some()),
                        "expires_at": record.as_ref().map(|r| r.expires_at.to_rfc3339()),
                        "flow_state": ctx.controller.flow_state(&p.id),
                    })
                })
                .collect();
            formatter.print_json(&json!({ "providers": items }));
            return Ok(());
        }

        for (p, record) in rows {
            match record {
                Some(r) if !r.is_expired_at(now) => formatter.success(&format!(
                    "{}: connected (token valid for {} min)",
                    p.display_name,
                    r.seconds_remaining() / 60
                )),
                Some(r) if r.refresh_token.is_some() => formatter.warn(&format!(
                    "{}: access token expired, will refresh on next use",
                    p.display_name
                )),
                Some(_) => formatter.warn(&format!(
                    "{}: token expired, run 'convortex connect {}'",
                    p.display_name, p.id
                )),
                None => formatter.info(&format!("{}: not connected", p.display_name)),
            }
        }
        Ok(())
    }
}
