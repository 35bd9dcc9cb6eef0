//! Integration tests for convortex-cloud
//!
//! Uses wiremock to simulate the provider REST APIs and the token relay,
//! and verifies the adapters, the relay client and the token store end to end.

mod common;

mod test_box;
mod test_dropbox;
mod test_google_drive;
mod test_onedrive;
mod test_relay_exchange;
