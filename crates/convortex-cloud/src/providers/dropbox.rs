//! Dropbox API v2 adapter
//!
//! Content endpoints take their arguments as JSON in the `Dropbox-API-Arg`
//! header; RPC endpoints take a JSON body.
//!
//! - Upload: `POST {upload}/files/upload` (mode `overwrite`)
//! - Download: `POST {upload}/files/download`
//! - List: `POST {api}/files/list_folder`, then `/files/list_folder/continue`
//!   while `has_more`

use convortex_core::domain::{CloudError, ProviderConfig, ProviderId, RemoteFileDescriptor, RemoteId};
use convortex_core::ports::IProviderAdapter;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::parse_timestamp;
use crate::client::{ensure_success, read_json, ApiClient, Operation};

const API_ARG_HEADER: &str = "Dropbox-API-Arg";

#[derive(Debug, Deserialize)]
struct FileMetadata {
    #[serde(rename = ".tag", default)]
    tag: Option<String>,
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    size: u64,
    server_modified: Option<String>,
}

impl From<FileMetadata> for RemoteFileDescriptor {
    fn from(meta: FileMetadata) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            mime_type: None,
            size: meta.size,
            modified_at: parse_timestamp(meta.server_modified.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    #[serde(default)]
    entries: Vec<FileMetadata>,
    cursor: String,
    #[serde(default)]
    has_more: bool,
}

pub struct DropboxAdapter {
    config: ProviderConfig,
    client: ApiClient,
}

impl DropboxAdapter {
    pub fn new(config: ProviderConfig, client: ApiClient) -> Self {
        Self { config, client }
    }

    fn name(&self) -> &str {
        &self.config.display_name
    }

    /// Dropbox addresses the root folder as the empty string
    fn folder_path(&self) -> String {
        let folder = self.config.folder.trim_end_matches('/');
        if folder.is_empty() {
            String::new()
        } else if folder.starts_with('/') {
            folder.to_string()
        } else {
            format!("/{folder}")
        }
    }
}

/// Serializes header JSON with every non-ASCII character `\u`-escaped,
/// since HTTP header values must be ASCII
fn header_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[async_trait::async_trait]
impl IProviderAdapter for DropboxAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.config.id
    }

    fn display_name(&self) -> &str {
        self.name()
    }

    async fn upload(
        &self,
        access_token: &str,
        data: Vec<u8>,
        file_name: &str,
    ) -> Result<RemoteFileDescriptor, CloudError> {
        let arg = json!({
            "path": format!("{}/{}", self.folder_path(), file_name),
            "mode": "overwrite",
            "autorename": false,
            "mute": true,
        });
        let url = format!("{}/files/upload", self.config.upload_base_url);
        debug!(file = file_name, bytes = data.len(), "Uploading to Dropbox");

        let request = self
            .client
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .header(API_ARG_HEADER, header_json(&arg))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data);

        let meta: FileMetadata = self
            .client
            .send_json(request, self.name(), Operation::Upload)
            .await?;
        Ok(meta.into())
    }

    async fn download(&self, access_token: &str, remote_id: &RemoteId) -> Result<Vec<u8>, CloudError> {
        let arg = json!({ "path": remote_id.as_str() });
        let url = format!("{}/files/download", self.config.upload_base_url);
        let request = self
            .client
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .header(API_ARG_HEADER, header_json(&arg));

        let response = self
            .client
            .send(request, self.name(), Operation::Download)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Operation::Download.error(self.name(), e.to_string()))?;
        debug!(id = %remote_id, bytes = bytes.len(), "Downloaded from Dropbox");
        Ok(bytes.to_vec())
    }

    async fn list(&self, access_token: &str) -> Result<Vec<RemoteFileDescriptor>, CloudError> {
        let url = format!("{}/files/list_folder", self.config.api_base_url);
        let request = self
            .client
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .json(&json!({ "path": self.folder_path(), "recursive": false }));

        let response = self
            .client
            .send_raw(request, self.name(), Operation::List)
            .await?;

        // A folder that was never created has no files yet.
        if response.status() == StatusCode::CONFLICT {
            let body = response.text().await.unwrap_or_default();
            if body.contains("not_found") {
                debug!(folder = %self.folder_path(), "Dropbox folder does not exist yet");
                return Ok(Vec::new());
            }
            return Err(Operation::List.error(self.name(), format!("409 Conflict: {body}")));
        }

        let response = ensure_success(response, self.name(), Operation::List).await?;
        let mut page: ListFolderResult = read_json(response, self.name(), Operation::List).await?;

        let mut files = Vec::new();
        loop {
            files.extend(
                page.entries
                    .into_iter()
                    .filter(|e| e.tag.as_deref().map_or(true, |t| t == "file"))
                    .map(RemoteFileDescriptor::from),
            );
            if !page.has_more {
                break;
            }

            let request = self
                .client
                .http()
                .post(format!("{}/files/list_folder/continue", self.config.api_base_url))
                .bearer_auth(access_token)
                .json(&json!({ "cursor": page.cursor }));
            page = self
                .client
                .send_json(request, self.name(), Operation::List)
                .await?;
        }

        debug!(count = files.len(), "Listed Dropbox folder");
        Ok(files)
    }
}
