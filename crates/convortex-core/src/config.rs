//! Configuration module for Convortex.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{ProviderConfig, ProviderKind};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Convortex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub oauth: OAuthConfig,
    pub providers: ProvidersConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

/// OAuth flow settings shared by all providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Redirect URI registered with every provider; the callback path.
    pub redirect_uri: String,
    /// Base URL of the token exchange relay.
    pub relay_url: String,
    /// Simulate every OAuth flow locally, without contacting providers.
    pub demo_mode: bool,
}

/// Per-provider settings, one entry per supported provider family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub google_drive: ProviderSettings,
    pub dropbox: ProviderSettings,
    pub onedrive: ProviderSettings,
    #[serde(rename = "box")]
    pub box_: ProviderSettings,
}

/// Settings for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub enabled: bool,
    /// Public OAuth client id. `None` runs the provider in sandbox mode.
    pub client_id: Option<String>,
    /// Remote folder override (folder id or path, depending on provider).
    pub folder: Option<String>,
    /// API base URL override.
    pub api_base_url: Option<String>,
    /// Upload/content base URL override.
    pub upload_base_url: Option<String>,
    /// OAuth token endpoint override.
    pub token_url: Option<String>,
    /// Relay only: environment variable holding the client secret.
    pub client_secret_env: Option<String>,
}

/// Token persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Token back-end: `file`, `keyring`, or `memory`.
    pub token_backend: String,
    /// JSON token file used by the `file` back-end.
    pub token_file: PathBuf,
}

/// Outgoing HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Token relay server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the relay binds to.
    pub bind: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(path, &content)
    }

    /// Load from `path`, using [`Config::default`] only when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to read config file {}", path.display()))),
        }
    }

    fn parse(path: &Path, content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content)
            .with_context(|| format!("Invalid YAML in config file {}", path.display()))
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/convortex/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("convortex")
            .join("config.yaml")
    }

    /// Serialize to YAML, e.g. for `config init`.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Settings for one provider family.
    pub fn provider_settings(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::GoogleDrive => &self.providers.google_drive,
            ProviderKind::Dropbox => &self.providers.dropbox,
            ProviderKind::OneDrive => &self.providers.onedrive,
            ProviderKind::Box => &self.providers.box_,
        }
    }

    fn provider_settings_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        match kind {
            ProviderKind::GoogleDrive => &mut self.providers.google_drive,
            ProviderKind::Dropbox => &mut self.providers.dropbox,
            ProviderKind::OneDrive => &mut self.providers.onedrive,
            ProviderKind::Box => &mut self.providers.box_,
        }
    }

    /// Builds the immutable provider catalogue for all enabled providers.
    ///
    /// In demo mode client ids are dropped so every provider is sandboxed.
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.provider_settings(*kind).enabled)
            .map(|kind| {
                let settings = self.provider_settings(kind);
                let client_id = if self.oauth.demo_mode {
                    None
                } else {
                    settings.client_id.clone()
                };

                let mut provider = ProviderConfig::for_kind(kind, client_id);
                if let Some(folder) = &settings.folder {
                    provider.folder = folder.clone();
                }
                if let Some(api) = &settings.api_base_url {
                    provider.api_base_url = api.clone();
                }
                if let Some(upload) = &settings.upload_base_url {
                    provider.upload_base_url = upload.clone();
                }
                if let Some(token_url) = &settings.token_url {
                    provider.token_url = token_url.clone();
                }
                provider
            })
            .collect()
    }

    /// Name of the environment variable holding `kind`'s client secret.
    pub fn client_secret_env(&self, kind: ProviderKind) -> String {
        self.provider_settings(kind)
            .client_secret_env
            .clone()
            .unwrap_or_else(|| kind.secret_env_var().to_string())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default redirect URI served by the local callback server.
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8400/callback";

/// Default address of the token relay.
pub const DEFAULT_RELAY_BIND: &str = "127.0.0.1:8787";

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            relay_url: format!("http://{DEFAULT_RELAY_BIND}"),
            demo_mode: false,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            client_id: None,
            folder: None,
            api_base_url: None,
            upload_base_url: None,
            token_url: None,
            client_secret_env: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("convortex");
        Self {
            token_backend: "file".to_string(),
            token_file: data_dir.join("tokens.json"),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_RELAY_BIND.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"http.timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `storage.token_backend`.
pub const VALID_TOKEN_BACKENDS: &[&str] = &["file", "keyring", "memory"];

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- oauth ---
        if !is_http_url(&self.oauth.redirect_uri) {
            errors.push(ValidationError {
                field: "oauth.redirect_uri".into(),
                message: format!("not an http(s) URL: '{}'", self.oauth.redirect_uri),
            });
        }
        if !self.oauth.demo_mode && !is_http_url(&self.oauth.relay_url) {
            errors.push(ValidationError {
                field: "oauth.relay_url".into(),
                message: format!("not an http(s) URL: '{}'", self.oauth.relay_url),
            });
        }

        // --- providers ---
        if !ProviderKind::ALL
            .iter()
            .any(|kind| self.provider_settings(*kind).enabled)
        {
            errors.push(ValidationError {
                field: "providers".into(),
                message: "at least one provider must be enabled".into(),
            });
        }
        for kind in ProviderKind::ALL {
            let settings = self.provider_settings(kind);
            let key = serde_key(kind);
            for (name, value) in [
                ("api_base_url", &settings.api_base_url),
                ("upload_base_url", &settings.upload_base_url),
                ("token_url", &settings.token_url),
            ] {
                if let Some(url) = value {
                    if !is_http_url(url) {
                        errors.push(ValidationError {
                            field: format!("providers.{key}.{name}"),
                            message: format!("not an http(s) URL: '{url}'"),
                        });
                    }
                }
            }
            if let Some(folder) = &settings.folder {
                if folder.is_empty() {
                    errors.push(ValidationError {
                        field: format!("providers.{key}.folder"),
                        message: "must not be empty".into(),
                    });
                }
            }
        }

        // --- storage ---
        if !VALID_TOKEN_BACKENDS.contains(&self.storage.token_backend.as_str()) {
            errors.push(ValidationError {
                field: "storage.token_backend".into(),
                message: format!(
                    "invalid backend '{}'; valid options: {}",
                    self.storage.token_backend,
                    VALID_TOKEN_BACKENDS.join(", ")
                ),
            });
        }

        // --- http ---
        if self.http.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "http.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- relay ---
        if self.relay.bind.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError {
                field: "relay.bind".into(),
                message: format!("not a socket address: '{}'", self.relay.bind),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

/// YAML key of a provider section.
fn serde_key(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::GoogleDrive => "google_drive",
        ProviderKind::Dropbox => "dropbox",
        ProviderKind::OneDrive => "onedrive",
        ProviderKind::Box => "box",
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use convortex_core::config::ConfigBuilder;
/// use convortex_core::domain::ProviderKind;
///
/// let config = ConfigBuilder::new()
///     .relay_url("https://relay.convortex.app")
///     .provider_client_id(ProviderKind::Dropbox, "abc123")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- oauth ---

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.oauth.redirect_uri = uri.into();
        self
    }

    pub fn relay_url(mut self, url: impl Into<String>) -> Self {
        self.config.oauth.relay_url = url.into();
        self
    }

    pub fn demo_mode(mut self, enabled: bool) -> Self {
        self.config.oauth.demo_mode = enabled;
        self
    }

    // --- providers ---

    pub fn provider_enabled(mut self, kind: ProviderKind, enabled: bool) -> Self {
        self.config.provider_settings_mut(kind).enabled = enabled;
        self
    }

    pub fn provider_client_id(mut self, kind: ProviderKind, client_id: impl Into<String>) -> Self {
        self.config.provider_settings_mut(kind).client_id = Some(client_id.into());
        self
    }

    pub fn provider_folder(mut self, kind: ProviderKind, folder: impl Into<String>) -> Self {
        self.config.provider_settings_mut(kind).folder = Some(folder.into());
        self
    }

    pub fn provider_base_url(mut self, kind: ProviderKind, url: impl Into<String>) -> Self {
        let url = url.into();
        let settings = self.config.provider_settings_mut(kind);
        settings.api_base_url = Some(url.clone());
        settings.upload_base_url = Some(url);
        self
    }

    pub fn provider_token_url(mut self, kind: ProviderKind, url: impl Into<String>) -> Self {
        self.config.provider_settings_mut(kind).token_url = Some(url.into());
        self
    }

    pub fn provider_secret_env(mut self, kind: ProviderKind, var: impl Into<String>) -> Self {
        self.config.provider_settings_mut(kind).client_secret_env = Some(var.into());
        self
    }

    // --- storage ---

    pub fn token_backend(mut self, backend: impl Into<String>) -> Self {
        self.config.storage.token_backend = backend.into();
        self
    }

    pub fn token_file(mut self, path: PathBuf) -> Self {
        self.config.storage.token_file = path;
        self
    }

    // --- http / relay / logging ---

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.timeout_secs = secs;
        self
    }

    pub fn relay_bind(mut self, bind: impl Into<String>) -> Self {
        self.config.relay.bind = bind.into();
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
