//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the cloud-sync logic depends on; their
//! implementations live in adapter crates (`convortex-cloud`,
//! `convortex-sync`) or in tests.
//!
//! ## Ports Overview
//!
//! - [`IProviderAdapter`] - Upload/download/list against one cloud provider
//! - [`ITokenPersistence`] - Durable storage of token records
//! - [`ITokenExchange`] - Code exchange and refresh through the relay
//! - [`IPopupLauncher`] - Opening the provider consent page
//! - [`IFileCodec`] - Reading/writing local file contents

pub mod platform;
pub mod provider_adapter;
pub mod token_ports;

pub use platform::{IFileCodec, IPopupLauncher};
pub use provider_adapter::IProviderAdapter;
pub use token_ports::{ITokenExchange, ITokenPersistence};
