//! Token persistence back-ends
//!
//! ## Components
//!
//! - [`JsonFileTokenPersistence`] - A JSON object keyed by provider id, on disk
//! - [`KeyringTokenPersistence`] - One system keyring entry per provider
//! - [`MemoryTokenPersistence`] - Process-local map for tests and demo sessions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use convortex_core::domain::{CloudError, ProviderId, TokenRecord};
use convortex_core::ports::ITokenPersistence;
use dashmap::DashMap;
use tracing::{debug, info};

/// Keyring service name for storing tokens
pub const KEYRING_SERVICE: &str = "convortex";

fn storage_error(context: &str, err: impl std::fmt::Display) -> CloudError {
    CloudError::Storage(format!("{context}: {err}"))
}

// ============================================================================
// JsonFileTokenPersistence
// ============================================================================

/// Stores all token records in one JSON file
///
/// The file holds a single object mapping provider ids to records:
///
/// ```json
/// { "dropbox": { "access_token": "...", "refresh_token": "...", "expires_at": "..." } }
/// ```
///
/// Every write replaces the file through a temporary sibling and a rename.
/// On Unix the file is created with mode `0600`.
pub struct JsonFileTokenPersistence {
    path: PathBuf,
    lock: Mutex<()>,
}

type RecordMap = BTreeMap<ProviderId, TokenRecord>;

impl JsonFileTokenPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<RecordMap, CloudError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(RecordMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| storage_error("Failed to parse token file", e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RecordMap::new()),
            Err(e) => Err(storage_error("Failed to read token file", e)),
        }
    }

    fn write_all(&self, records: &RecordMap) -> Result<(), CloudError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| storage_error("Failed to create token directory", e))?;
            }
        }

        let json = serde_json::to_string_pretty(records)
            .map_err(|e| storage_error("Failed to serialize tokens", e))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| storage_error("Failed to write token file", e))?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| storage_error("Failed to replace token file", e))?;
        Ok(())
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T, CloudError>) -> Result<T, CloudError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), CloudError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| storage_error("Failed to set token file permissions", e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), CloudError> {
    Ok(())
}

impl ITokenPersistence for JsonFileTokenPersistence {
    fn load(&self, provider: &ProviderId) -> Result<Option<TokenRecord>, CloudError> {
        self.with_lock(|| Ok(self.read_all()?.remove(provider)))
    }

    fn save(&self, provider: &ProviderId, record: &TokenRecord) -> Result<(), CloudError> {
        self.with_lock(|| {
            let mut records = self.read_all()?;
            records.insert(provider.clone(), record.clone());
            self.write_all(&records)?;
            debug!(provider = %provider, path = %self.path.display(), "Stored token record");
            Ok(())
        })
    }

    fn delete(&self, provider: &ProviderId) -> Result<(), CloudError> {
        self.with_lock(|| {
            let mut records = self.read_all()?;
            if records.remove(provider).is_some() {
                self.write_all(&records)?;
                debug!(provider = %provider, "Removed token record");
            }
            Ok(())
        })
    }

    fn providers(&self) -> Result<Vec<ProviderId>, CloudError> {
        self.with_lock(|| Ok(self.read_all()?.into_keys().collect()))
    }
}

// ============================================================================
// KeyringTokenPersistence
// ============================================================================

/// Stores token records in the system keyring
///
/// Uses the `keyring` crate to store records in the OS credential store
/// (e.g., GNOME Keyring, KDE Wallet, macOS Keychain). Each record is
/// serialized as JSON under the service name and the provider id.
///
/// Keyrings cannot enumerate entries, so [`providers`](ITokenPersistence::providers)
/// probes the ids this back-end was created with.
pub struct KeyringTokenPersistence {
    service: String,
    known_providers: Vec<ProviderId>,
}

impl KeyringTokenPersistence {
    pub fn new(known_providers: Vec<ProviderId>) -> Self {
        Self::with_service(KEYRING_SERVICE, known_providers)
    }

    pub fn with_service(service: impl Into<String>, known_providers: Vec<ProviderId>) -> Self {
        Self {
            service: service.into(),
            known_providers,
        }
    }

    fn entry(&self, provider: &ProviderId) -> Result<keyring::Entry, CloudError> {
        keyring::Entry::new(&self.service, provider.as_str())
            .map_err(|e| storage_error("Failed to create keyring entry", e))
    }
}

impl ITokenPersistence for KeyringTokenPersistence {
    fn load(&self, provider: &ProviderId) -> Result<Option<TokenRecord>, CloudError> {
        match self.entry(provider)?.get_password() {
            Ok(json) => {
                let record = serde_json::from_str(&json)
                    .map_err(|e| storage_error("Failed to deserialize tokens from keyring", e))?;
                debug!(provider = %provider, "Loaded tokens from keyring");
                Ok(Some(record))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(storage_error("Failed to read from keyring", e)),
        }
    }

    fn save(&self, provider: &ProviderId, record: &TokenRecord) -> Result<(), CloudError> {
        let json =
            serde_json::to_string(record).map_err(|e| storage_error("Failed to serialize tokens", e))?;
        self.entry(provider)?
            .set_password(&json)
            .map_err(|e| storage_error("Failed to store tokens in keyring", e))?;
        debug!(provider = %provider, "Stored tokens in keyring");
        Ok(())
    }

    fn delete(&self, provider: &ProviderId) -> Result<(), CloudError> {
        match self.entry(provider)?.delete_credential() {
            Ok(()) => {
                info!(provider = %provider, "Cleared tokens from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(storage_error("Failed to delete from keyring", e)),
        }
    }

    fn providers(&self) -> Result<Vec<ProviderId>, CloudError> {
        let mut found = Vec::new();
        for provider in &self.known_providers {
            if self.load(provider)?.is_some() {
                found.push(provider.clone());
            }
        }
        Ok(found)
    }
}

// ============================================================================
// MemoryTokenPersistence
// ============================================================================

/// Keeps token records in process memory only
#[derive(Default)]
pub struct MemoryTokenPersistence {
    records: DashMap<ProviderId, TokenRecord>,
}

impl MemoryTokenPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ITokenPersistence for MemoryTokenPersistence {
    fn load(&self, provider: &ProviderId) -> Result<Option<TokenRecord>, CloudError> {
        Ok(self.records.get(provider).map(|r| r.value().clone()))
    }

    fn save(&self, provider: &ProviderId, record: &TokenRecord) -> Result<(), CloudError> {
        self.records.insert(provider.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, provider: &ProviderId) -> Result<(), CloudError> {
        self.records.remove(provider);
        Ok(())
    }

    fn providers(&self) -> Result<Vec<ProviderId>, CloudError> {
        let mut ids: Vec<ProviderId> = self.records.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}
