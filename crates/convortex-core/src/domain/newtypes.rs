//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for identifiers that cross module boundaries.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// ProviderId
// ============================================================================

/// Identifier of a configured cloud provider (e.g. `google-drive`)
///
/// Always a non-empty lowercase slug made of `a-z`, `0-9` and `-`, so it can
/// be used verbatim as a JSON object key, a keyring entry name and a URL path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);

impl ProviderId {
    /// Well-known id of the Google Drive provider
    pub const GOOGLE_DRIVE: &'static str = "google-drive";
    /// Well-known id of the Dropbox provider
    pub const DROPBOX: &'static str = "dropbox";
    /// Well-known id of the OneDrive provider
    pub const ONEDRIVE: &'static str = "onedrive";
    /// Well-known id of the Box provider
    pub const BOX: &'static str = "box";

    /// Create a new ProviderId
    ///
    /// # Errors
    /// Returns error if the id is empty or not a lowercase slug
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidProviderId(
                "Provider id cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DomainError::InvalidProviderId(id));
        }

        Ok(Self(id))
    }

    /// Wraps one of the `ProviderId::*` constants, which are valid slugs
    pub(crate) fn well_known(id: &'static str) -> Self {
        Self(id.to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProviderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProviderId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProviderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// RemoteId
// ============================================================================

/// Provider-native identifier of a remote file
///
/// Formats differ wildly between providers (`id:a4ayc_80_OEAAA` on Dropbox,
/// numeric strings on Box, `01BYE5RZ...` on OneDrive), so the only rules are
/// non-empty and free of whitespace/control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a new RemoteId
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidRemoteId(
                "Remote ID cannot be empty".to_string(),
            ));
        }

        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::InvalidRemoteId(format!(
                "Remote ID contains invalid characters: {id:?}"
            )));
        }

        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RemoteId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

/// Validates a file name used for uploads
///
/// # Errors
/// Returns error if the name is empty, `.`/`..`, or contains a path separator
pub fn validate_file_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(DomainError::InvalidFileName(name.to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(DomainError::InvalidFileName(format!(
            "{name} contains a path separator"
        )));
    }
    Ok(())
}
