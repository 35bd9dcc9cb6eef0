//! Box Content API 2.0 adapter
//!
//! - Upload: multipart/form-data `POST {upload}/files/content`; a 409 name
//!   conflict uploads a new version of the existing file instead
//! - Download: `GET {api}/files/{id}/content`
//! - List: `GET {api}/folders/{folder}/items`, paging by `offset`/`limit`

use convortex_core::domain::{CloudError, ProviderConfig, ProviderId, RemoteFileDescriptor, RemoteId};
use convortex_core::ports::IProviderAdapter;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::parse_timestamp;
use crate::client::{ensure_success, failure_message, read_json, ApiClient, Operation};

const PAGE_LIMIT: usize = 1000;
const ITEM_FIELDS: &str = "id,type,name,size,modified_at";

#[derive(Debug, Deserialize)]
struct BoxItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    id: String,
    name: String,
    #[serde(default)]
    size: u64,
    modified_at: Option<String>,
}

impl From<BoxItem> for RemoteFileDescriptor {
    fn from(item: BoxItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            mime_type: None,
            size: item.size,
            modified_at: parse_timestamp(item.modified_at.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemCollection {
    #[serde(default)]
    total_count: usize,
    #[serde(default)]
    entries: Vec<BoxItem>,
}

pub struct BoxAdapter {
    config: ProviderConfig,
    client: ApiClient,
}

impl BoxAdapter {
    pub fn new(config: ProviderConfig, client: ApiClient) -> Self {
        Self { config, client }
    }

    fn name(&self) -> &str {
        &self.config.display_name
    }

    fn form(attributes: serde_json::Value, data: Vec<u8>, file_name: &str) -> Form {
        Form::new()
            .text("attributes", attributes.to_string())
            .part("file", Part::bytes(data).file_name(file_name.to_string()))
    }

    async fn upload_new_version(
        &self,
        access_token: &str,
        file_id: &str,
        data: Vec<u8>,
        file_name: &str,
    ) -> Result<RemoteFileDescriptor, CloudError> {
        info!(file = file_name, id = file_id, "Box name conflict, uploading new version");
        let url = format!("{}/files/{}/content", self.config.upload_base_url, file_id);
        let request = self
            .client
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .multipart(Self::form(json!({ "name": file_name }), data, file_name));

        let collection: ItemCollection = self
            .client
            .send_json(request, self.name(), Operation::Upload)
            .await?;
        self.first_entry(collection)
    }

    fn first_entry(&self, collection: ItemCollection) -> Result<RemoteFileDescriptor, CloudError> {
        collection
            .entries
            .into_iter()
            .next()
            .map(RemoteFileDescriptor::from)
            .ok_or_else(|| Operation::Upload.error(self.name(), "upload response has no entries"))
    }
}

/// Extracts the id of the conflicting file from a 409 error body
///
/// Box reports `context_info.conflicts` as an object or as an array.
fn conflict_id(body: &serde_json::Value) -> Option<String> {
    let conflicts = body.get("context_info")?.get("conflicts")?;
    let conflict = match conflicts {
        serde_json::Value::Array(items) => items.first()?,
        other => other,
    };
    conflict.get("id")?.as_str().map(String::from)
}

#[async_trait::async_trait]
impl IProviderAdapter for BoxAdapter {
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
        let attributes = json!({ "name": file_name, "parent": { "id": self.config.folder } });
        let url = format!("{}/files/content", self.config.upload_base_url);
        debug!(file = file_name, bytes = data.len(), "Uploading to Box");

        // The form consumes the bytes; keep a copy for a possible version upload.
        let request = self
            .client
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .multipart(Self::form(attributes, data.clone(), file_name));
        let response = self
            .client
            .send_raw(request, self.name(), Operation::Upload)
            .await?;

        if response.status() == StatusCode::CONFLICT {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            return match conflict_id(&body) {
                Some(id) => self.upload_new_version(access_token, &id, data, file_name).await,
                None => Err(Operation::Upload.error(
                    self.name(),
                    "409 Conflict: no conflicting file id in response",
                )),
            };
        }

        let response = ensure_success(response, self.name(), Operation::Upload).await?;
        let collection: ItemCollection = read_json(response, self.name(), Operation::Upload).await?;
        self.first_entry(collection)
    }

    async fn download(&self, access_token: &str, remote_id: &RemoteId) -> Result<Vec<u8>, CloudError> {
        let url = format!("{}/files/{}/content", self.config.api_base_url, remote_id);
        let request = self.client.http().get(&url).bearer_auth(access_token);

        let response = self
            .client
            .send_raw(request, self.name(), Operation::Download)
            .await?;
        // 202 means the file is not yet downloadable (e.g. still being scanned).
        if response.status() == StatusCode::ACCEPTED {
            let message = failure_message(response).await;
            return Err(Operation::Download.error(self.name(), message));
        }
        let response = ensure_success(response, self.name(), Operation::Download).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Operation::Download.error(self.name(), e.to_string()))?;
        debug!(id = %remote_id, bytes = bytes.len(), "Downloaded from Box");
        Ok(bytes.to_vec())
    }

    async fn list(&self, access_token: &str) -> Result<Vec<RemoteFileDescriptor>, CloudError> {
        let url = format!("{}/folders/{}/items", self.config.api_base_url, self.config.folder);
        let limit = PAGE_LIMIT.to_string();

        let mut files = Vec::new();
        let mut offset = 0usize;
        loop {
            let request = self
                .client
                .http()
                .get(&url)
                .bearer_auth(access_token)
                .query(&[
                    ("fields", ITEM_FIELDS),
                    ("limit", limit.as_str()),
                    ("offset", offset.to_string().as_str()),
                ]);
            let page: ItemCollection = self
                .client
                .send_json(request, self.name(), Operation::List)
                .await?;

            let received = page.entries.len();
            files.extend(
                page.entries
                    .into_iter()
                    .filter(|item| item.kind.as_deref().map_or(true, |k| k == "file"))
                    .map(RemoteFileDescriptor::from),
            );

            offset += received;
            if received == 0 || offset >= page.total_count {
                break;
            }
        }

        debug!(count = files.len(), "Listed Box folder");
        Ok(files)
    }
}
