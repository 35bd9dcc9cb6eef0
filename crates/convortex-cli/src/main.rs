//! Convortex CLI - Command-line interface for Convortex
//!
//! Provides commands for:
//! - Connecting and disconnecting cloud providers (OAuth via the relay)
//! - Listing, uploading and downloading files
//! - Pushing a local directory to a provider
//! - Viewing and validating configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;

use commands::{
    auth::{ConnectCommand, DisconnectCommand},
    config::ConfigCommand,
    files::{DownloadCommand, LsCommand, UploadCommand},
    providers::ProvidersCommand,
    status::StatusCommand,
    sync::SyncCommand,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "convortex",
    version,
    about = "Connect cloud drives and push files to them"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List enabled providers
    Providers(ProvidersCommand),
    /// Authorize access to a provider
    Connect(ConnectCommand),
    /// Remove stored tokens for a provider
    Disconnect(DisconnectCommand),
    /// Show provider connection status
    Status(StatusCommand),
    /// List remote files
    Ls(LsCommand),
    /// Upload a single file
    Upload(UploadCommand),
    /// Download a single file
    Download(DownloadCommand),
    /// Push new and modified files from a directory
    Sync(SyncCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output on stdout stays parseable.
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = OutputFormat::from_flag(cli.json);
    let config_path = context::config_path(cli.config.as_deref());

    let result = match cli.command {
        Commands::Providers(cmd) => cmd.execute(format, &config_path).await,
        Commands::Connect(cmd) => cmd.execute(format, &config_path).await,
        Commands::Disconnect(cmd) => cmd.execute(format, &config_path).await,
        Commands::Status(cmd) => cmd.execute(format, &config_path).await,
        Commands::Ls(cmd) => cmd.execute(format, &config_path).await,
        Commands::Upload(cmd) => cmd.execute(format, &config_path).await,
        Commands::Download(cmd) => cmd.execute(format, &config_path).await,
        Commands::Sync(cmd) => cmd.execute(format, &config_path).await,
        Commands::Config(cmd) => cmd.execute(format, &config_path).await,
    };

    if let Err(e) = &result {
        get_formatter(format).error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}
