//! Convortex Relay - Server-side OAuth token exchange
//!
//! Provides:
//! - `RelayCredentials`: Per-provider client id/secret and token endpoint
//! - `ProviderTokenClient`: Code exchange and refresh via the `oauth2` crate
//! - `RelayServer`: HTTP server exposing `/oauth/exchange`, `/oauth/refresh`
//!   and `/health`
//!
//! Client secrets live only in this process. They are read from environment
//! variables at startup and never echoed in responses or logs.

pub mod credentials;
pub mod exchange;
pub mod server;

pub use credentials::{ProviderCredentials, RelayCredentials};
pub use exchange::{ExchangeFailure, ProviderTokenClient};
pub use server::RelayServer;
