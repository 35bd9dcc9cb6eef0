//! In-memory provider used when a provider runs without live credentials

use chrono::Utc;
use convortex_core::domain::{CloudError, ProviderId, RemoteFileDescriptor, RemoteId};
use convortex_core::ports::IProviderAdapter;
use dashmap::DashMap;
use uuid::Uuid;

use crate::client::Operation;

struct StoredFile {
    descriptor: RemoteFileDescriptor,
    data: Vec<u8>,
}

/// Keeps uploaded files in memory, keyed by name
///
/// Re-uploading a name replaces the content and keeps the id, like the
/// overwrite semantics of the real providers.
pub struct SandboxAdapter {
    id: ProviderId,
    display_name: String,
    files: DashMap<String, StoredFile>,
}

impl SandboxAdapter {
    pub fn new(id: ProviderId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            files: DashMap::new(),
        }
    }

    fn check_token(&self, access_token: &str, op: Operation) -> Result<(), CloudError> {
        if access_token.is_empty() {
            return Err(op.error(&self.display_name, "401 Unauthorized"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IProviderAdapter for SandboxAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn upload(
        &self,
        access_token: &str,
        data: Vec<u8>,
        file_name: &str,
    ) -> Result<RemoteFileDescriptor, CloudError> {
        self.check_token(access_token, Operation::Upload)?;
        let id = self
            .files
            .get(file_name)
            .map(|f| f.descriptor.id.clone())
            .unwrap_or_else(|| format!("sandbox-{}", Uuid::new_v4().simple()));

        let descriptor = RemoteFileDescriptor {
            id,
            name: file_name.to_string(),
            mime_type: None,
            size: data.len() as u64,
            modified_at: Utc::now(),
        };
        self.files.insert(
            file_name.to_string(),
            StoredFile {
                descriptor: descriptor.clone(),
                data,
            },
        );
        Ok(descriptor)
    }

    async fn download(&self, access_token: &str, remote_id: &RemoteId) -> Result<Vec<u8>, CloudError> {
        self.check_token(access_token, Operation::Download)?;
        self.files
            .iter()
            .find(|f| f.descriptor.id == remote_id.as_str())
            .map(|f| f.data.clone())
            .ok_or_else(|| Operation::Download.error(&self.display_name, "404 Not Found"))
    }

    async fn list(&self, access_token: &str) -> Result<Vec<RemoteFileDescriptor>, CloudError> {
        self.check_token(access_token, Operation::List)?;
        let mut files: Vec<_> = self.files.iter().map(|f| f.descriptor.clone()).collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}
