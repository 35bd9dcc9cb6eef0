//! Convortex Sync - Pushing local files to cloud providers
//!
//! Provides:
//! - Name-based, newer-wins upload sync against a provider folder
//! - Explicit single-file upload and download
//! - Local directory scanning and filesystem file access
//!
//! ## Modules
//!
//! - [`orchestrator`] - Sync orchestrator
//! - [`filesystem`] - Local filesystem adapter (atomic writes, directory scan)

pub mod filesystem;
pub mod orchestrator;

pub use filesystem::{describe_file, scan_directory, FsFileCodec};
pub use orchestrator::SyncOrchestrator;
