//! Convortex Cloud - OAuth, token management and provider adapters
//!
//! Provides:
//! - OAuth2 Authorization Code flows with anti-forgery state checks
//! - A token store with single-flight refresh and pluggable persistence
//! - Clients for the token exchange relay, plus a sandbox exchange
//! - Upload/download/list adapters for Google Drive, Dropbox, OneDrive and Box
//!
//! ## Modules
//!
//! - [`auth`] - OAuth flow controller
//! - [`callback`] - Local HTTP server receiving the OAuth redirect
//! - [`client`] - Shared HTTP client and error mapping
//! - [`launcher`] - Popup launchers for the authorization page
//! - [`providers`] - Provider adapters and the provider registry
//! - [`relay`] - Token exchange implementations
//! - [`storage`] - Token persistence back-ends
//! - [`token_store`] - Token Store

pub mod auth;
pub mod callback;
pub mod client;
pub mod launcher;
pub mod providers;
pub mod relay;
pub mod storage;
pub mod token_store;

pub use auth::{FlowState, OAuthFlowController};
pub use callback::{CallbackParams, LocalCallbackServer};
pub use client::ApiClient;
pub use providers::ProviderRegistry;
pub use token_store::TokenStore;
