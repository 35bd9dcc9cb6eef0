//! Domain entities and value types
//!
//! This module contains the core domain types for Convortex cloud sync:
//! - Newtypes for validated identifiers
//! - Provider descriptors
//! - Token and pending-authorization records
//! - Remote/local file descriptors and sync summaries
//! - Token relay wire types
//! - Domain-specific error types

pub mod errors;
pub mod files;
pub mod newtypes;
pub mod provider;
pub mod relay;
pub mod token;

// Re-export commonly used types
pub use errors::{CloudError, DomainError};
pub use files::{LocalFile, RemoteFileDescriptor, SyncProgress, SyncResult};
pub use newtypes::{validate_file_name, ProviderId, RemoteId};
pub use provider::{ProviderConfig, ProviderKind};
pub use token::{
    PendingAuthorization, TokenRecord, TokenResponse, DEFAULT_TOKEN_LIFETIME_SECS,
    MAX_TOKEN_LIFETIME_SECS,
};
