pub mod auth;
pub mod config;
pub mod files;
pub mod providers;
pub mod status;
pub mod sync;
