//! OneDrive adapter (Microsoft Graph v1.0)
//!
//! - Upload: `PUT {api}/me/drive/root:/<folder>/<name>:/content`
//! - Download: `GET {api}/me/drive/items/{id}/content`
//! - List: children of the folder, following `@odata.nextLink`

use convortex_core::domain::{CloudError, ProviderConfig, ProviderId, RemoteFileDescriptor, RemoteId};
use convortex_core::ports::IProviderAdapter;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::parse_timestamp;
use crate::client::{ensure_success, read_json, ApiClient, Operation};

/// Characters escaped inside one path segment of a Graph item path
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Deserialize)]
struct FileFacet {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItem {
    id: String,
    name: String,
    #[serde(default)]
    size: u64,
    last_modified_date_time: Option<String>,
    file: Option<FileFacet>,
    folder: Option<serde_json::Value>,
}

impl From<DriveItem> for RemoteFileDescriptor {
    fn from(item: DriveItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            mime_type: item.file.and_then(|f| f.mime_type),
            size: item.size,
            modified_at: parse_timestamp(item.last_modified_date_time.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChildrenPage {
    #[serde(default)]
    value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

pub struct OneDriveAdapter {
    config: ProviderConfig,
    client: ApiClient,
}

impl OneDriveAdapter {
    pub fn new(config: ProviderConfig, client: ApiClient) -> Self {
        Self { config, client }
    }

    fn name(&self) -> &str {
        &self.config.display_name
    }

    /// The folder as percent-encoded segments, empty for the drive root
    fn encoded_folder(&self) -> String {
        encode_path(&self.config.folder)
    }

    fn item_path(&self, file_name: &str) -> String {
        let folder = self.encoded_folder();
        let name = utf8_percent_encode(file_name, SEGMENT).to_string();
        if folder.is_empty() {
            name
        } else {
            format!("{folder}/{name}")
        }
    }

    fn children_url(&self) -> String {
        let folder = self.encoded_folder();
        if folder.is_empty() {
            format!("{}/me/drive/root/children", self.config.api_base_url)
        } else {
            format!("{}/me/drive/root:/{}:/children", self.config.api_base_url, folder)
        }
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait::async_trait]
impl IProviderAdapter for OneDriveAdapter {
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
        let url = format!(
            "{}/me/drive/root:/{}:/content",
            self.config.upload_base_url,
            self.item_path(file_name)
        );
        debug!(file = file_name, bytes = data.len(), "Uploading to OneDrive");

        let request = self
            .client
            .http()
            .put(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data);

        let item: DriveItem = self
            .client
            .send_json(request, self.name(), Operation::Upload)
            .await?;
        Ok(item.into())
    }

    async fn download(&self, access_token: &str, remote_id: &RemoteId) -> Result<Vec<u8>, CloudError> {
        let url = format!(
            "{}/me/drive/items/{}/content",
            self.config.api_base_url,
            utf8_percent_encode(remote_id.as_str(), SEGMENT)
        );
        let request = self.client.http().get(&url).bearer_auth(access_token);

        // Graph answers with a redirect to the content URL, which reqwest follows.
        let response = self
            .client
            .send(request, self.name(), Operation::Download)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Operation::Download.error(self.name(), e.to_string()))?;
        debug!(id = %remote_id, bytes = bytes.len(), "Downloaded from OneDrive");
        Ok(bytes.to_vec())
    }

    async fn list(&self, access_token: &str) -> Result<Vec<RemoteFileDescriptor>, CloudError> {
        let request = self
            .client
            .http()
            .get(self.children_url())
            .bearer_auth(access_token);
        let response = self
            .client
            .send_raw(request, self.name(), Operation::List)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(folder = %self.config.folder, "OneDrive folder does not exist yet");
            return Ok(Vec::new());
        }
        let response = ensure_success(response, self.name(), Operation::List).await?;
        let mut page: ChildrenPage = read_json(response, self.name(), Operation::List).await?;

        let mut files = Vec::new();
        loop {
            files.extend(
                page.value
                    .into_iter()
                    .filter(|item| item.folder.is_none())
                    .map(RemoteFileDescriptor::from),
            );

            let Some(next) = page.next_link else {
                break;
            };
            let request = self.client.http().get(&next).bearer_auth(access_token);
            page = self
                .client
                .send_json(request, self.name(), Operation::List)
                .await?;
        }

        debug!(count = files.len(), "Listed OneDrive folder");
        Ok(files)
    }
}
