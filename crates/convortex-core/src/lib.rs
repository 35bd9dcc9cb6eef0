//! Convortex Core - Domain types, ports and configuration for cloud sync
//!
//! This crate contains the hexagonal core of the cloud-sync subsystem:
//! - **Domain types** - `ProviderId`, `ProviderConfig`, `TokenRecord`,
//!   `PendingAuthorization`, `RemoteFileDescriptor`, `LocalFile`, `SyncResult`
//! - **Error taxonomy** - `CloudError`, `DomainError`
//! - **Port definitions** - `IProviderAdapter`, `ITokenPersistence`,
//!   `ITokenExchange`, `IPopupLauncher`, `IFileCodec`
//! - **Configuration** - YAML configuration with validation and a builder
//!
//! Adapter crates implement the ports; nothing here performs I/O except
//! configuration loading.

pub mod config;
pub mod domain;
pub mod ports;
