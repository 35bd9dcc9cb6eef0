//! Cloud provider descriptors
//!
//! A [`ProviderConfig`] is the static, immutable description of one cloud
//! provider: where its OAuth endpoints live, which API hosts to talk to and
//! which client id to present. The catalogue is built once at startup from
//! the YAML configuration and never mutated afterwards.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::newtypes::ProviderId;

/// The four provider families Convortex knows how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    GoogleDrive,
    Dropbox,
    OneDrive,
    Box,
}

impl ProviderKind {
    /// All supported kinds, in display order
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::GoogleDrive,
        ProviderKind::Dropbox,
        ProviderKind::OneDrive,
        ProviderKind::Box,
    ];

    /// The well-known provider id for this kind
    pub fn default_id(self) -> &'static str {
        match self {
            ProviderKind::GoogleDrive => ProviderId::GOOGLE_DRIVE,
            ProviderKind::Dropbox => ProviderId::DROPBOX,
            ProviderKind::OneDrive => ProviderId::ONEDRIVE,
            ProviderKind::Box => ProviderId::BOX,
        }
    }

    /// Human readable provider name
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::GoogleDrive => "Google Drive",
            ProviderKind::Dropbox => "Dropbox",
            ProviderKind::OneDrive => "OneDrive",
            ProviderKind::Box => "Box",
        }
    }

    /// Environment variable conventionally holding this provider's client secret
    pub fn secret_env_var(self) -> &'static str {
        match self {
            ProviderKind::GoogleDrive => "CONVORTEX_GOOGLE_DRIVE_CLIENT_SECRET",
            ProviderKind::Dropbox => "CONVORTEX_DROPBOX_CLIENT_SECRET",
            ProviderKind::OneDrive => "CONVORTEX_ONEDRIVE_CLIENT_SECRET",
            ProviderKind::Box => "CONVORTEX_BOX_CLIENT_SECRET",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Static description of a configured cloud provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub kind: ProviderKind,
    pub display_name: String,
    /// OAuth authorization endpoint (consent screen)
    pub auth_url: String,
    /// OAuth token endpoint, used only by the relay
    pub token_url: String,
    /// Base URL for metadata/list API calls
    pub api_base_url: String,
    /// Base URL for content upload/download calls
    pub upload_base_url: String,
    pub scopes: Vec<String>,
    /// Public OAuth client id. `None` puts the provider in sandbox mode.
    pub client_id: Option<String>,
    /// Remote folder Convortex reads and writes: a folder id for Google
    /// Drive and Box, a path for Dropbox and OneDrive
    pub folder: String,
    /// Provider-specific authorization URL parameters
    pub extra_auth_params: Vec<(String, String)>,
}

impl ProviderConfig {
    /// Builds the default descriptor for a provider kind
    pub fn for_kind(kind: ProviderKind, client_id: Option<String>) -> Self {
        let id = ProviderId::well_known(kind.default_id());
        let s = |v: &str| v.to_string();

        let (auth_url, token_url, api_base_url, upload_base_url, scopes, folder, extra) =
            match kind {
                ProviderKind::GoogleDrive => (
                    "https://accounts.google.com/o/oauth2/v2/auth",
                    "https://oauth2.googleapis.com/token",
                    "https://www.googleapis.com/drive/v3",
                    "https://www.googleapis.com/upload/drive/v3",
                    vec![s("https://www.googleapis.com/auth/drive.file")],
                    "root",
                    vec![(s("access_type"), s("offline")), (s("prompt"), s("consent"))],
                ),
                ProviderKind::Dropbox => (
                    "https://www.dropbox.com/oauth2/authorize",
                    "https://api.dropboxapi.com/oauth2/token",
                    "https://api.dropboxapi.com/2",
                    "https://content.dropboxapi.com/2",
                    vec![
                        s("files.content.read"),
                        s("files.content.write"),
                        s("files.metadata.read"),
                    ],
                    "/Convortex",
                    vec![(s("token_access_type"), s("offline"))],
                ),
                ProviderKind::OneDrive => (
                    "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
                    "https://login.microsoftonline.com/common/oauth2/v2.0/token",
                    "https://graph.microsoft.com/v1.0",
                    "https://graph.microsoft.com/v1.0",
                    vec![s("Files.ReadWrite"), s("offline_access")],
                    "/Convortex",
                    vec![],
                ),
                ProviderKind::Box => (
                    "https://account.box.com/api/oauth2/authorize",
                    "https://api.box.com/oauth2/token",
                    "https://api.box.com/2.0",
                    "https://upload.box.com/api/2.0",
                    vec![s("root_readwrite")],
                    "0",
                    vec![],
                ),
            };

        Self {
            id,
            kind,
            display_name: kind.display_name().to_string(),
            auth_url: auth_url.to_string(),
            token_url: token_url.to_string(),
            api_base_url: api_base_url.to_string(),
            upload_base_url: upload_base_url.to_string(),
            scopes,
            client_id,
            folder: folder.to_string(),
            extra_auth_params: extra,
        }
    }

    /// Points both API hosts at a single base URL (useful for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        self.api_base_url = base.clone();
        self.upload_base_url = base;
        self
    }

    /// Overrides the remote folder
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// True when no client id is configured and flows must be simulated
    pub fn is_sandboxed(&self) -> bool {
        self.client_id.as_deref().map_or(true, str::is_empty)
    }
}
