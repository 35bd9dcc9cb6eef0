//! Google Drive v3 adapter
//!
//! - Upload: multipart/related `POST {upload}/files?uploadType=multipart`;
//!   media over 5 MiB goes through a resumable session instead
//! - Download: `GET {api}/files/{id}?alt=media`
//! - List: `GET {api}/files?q='<folder>' in parents and trashed=false`,
//!   following `nextPageToken`

use convortex_core::domain::{CloudError, ProviderConfig, ProviderId, RemoteFileDescriptor, RemoteId};
use convortex_core::ports::IProviderAdapter;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::parse_timestamp;
use crate::client::{ApiClient, Operation};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const FILE_FIELDS: &str = "id,name,mimeType,size,modifiedTime";
const PAGE_SIZE: &str = "1000";

/// Largest media Drive accepts with `uploadType=multipart`
const MULTIPART_UPLOAD_LIMIT: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: Option<String>,
    /// Drive reports sizes as decimal strings
    size: Option<String>,
    modified_time: Option<String>,
}

impl From<DriveFile> for RemoteFileDescriptor {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size.and_then(|s| s.parse().ok()).unwrap_or(0),
            modified_at: parse_timestamp(file.modified_time.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

pub struct GoogleDriveAdapter {
    config: ProviderConfig,
    client: ApiClient,
}

impl GoogleDriveAdapter {
    pub fn new(config: ProviderConfig, client: ApiClient) -> Self {
        Self { config, client }
    }

    fn name(&self) -> &str {
        &self.config.display_name
    }

    /// Opens a resumable upload session and returns its URL
    async fn create_upload_session(
        &self,
        access_token: &str,
        metadata: &serde_json::Value,
        size: usize,
    ) -> Result<String, CloudError> {
        let url = format!("{}/files", self.config.upload_base_url);
        let request = self
            .client
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("uploadType", "resumable"), ("fields", FILE_FIELDS)])
            .header("X-Upload-Content-Type", "application/octet-stream")
            .header("X-Upload-Content-Length", size.to_string())
            .json(metadata);

        let response = self
            .client
            .send(request, self.name(), Operation::Upload)
            .await?;
        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                Operation::Upload.error(self.name(), "upload session response has no Location header")
            })
    }

    /// Sends the whole media in one request to a fresh resumable session
    async fn upload_resumable(
        &self,
        access_token: &str,
        metadata: &serde_json::Value,
        data: Vec<u8>,
        file_name: &str,
    ) -> Result<RemoteFileDescriptor, CloudError> {
        let session_url = self
            .create_upload_session(access_token, metadata, data.len())
            .await?;
        debug!(file = file_name, bytes = data.len(), "Uploading to Google Drive session");

        let request = self
            .client
            .http()
            .put(&session_url)
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data);
        let file: DriveFile = self
            .client
            .send_json(request, self.name(), Operation::Upload)
            .await?;
        Ok(file.into())
    }
}

/// Quotes `value` as a string literal for a Drive `q` expression
fn query_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Builds a multipart/related body: JSON metadata part, then the media part
fn multipart_related(metadata: &serde_json::Value, data: &[u8], boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/octet-stream\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait::async_trait]
impl IProviderAdapter for GoogleDriveAdapter {
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
        let metadata = json!({ "name": file_name, "parents": [self.config.folder] });
        if data.len() > MULTIPART_UPLOAD_LIMIT {
            return self.upload_resumable(access_token, &metadata, data, file_name).await;
        }

        let boundary = format!("convortex-{}", Uuid::new_v4().simple());
        let body = multipart_related(&metadata, &data, &boundary);
        let url = format!("{}/files", self.config.upload_base_url);
        debug!(file = file_name, bytes = data.len(), "Uploading to Google Drive");

        let request = self
            .client
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);

        let file: DriveFile = self
            .client
            .send_json(request, self.name(), Operation::Upload)
            .await?;
        Ok(file.into())
    }

    async fn download(&self, access_token: &str, remote_id: &RemoteId) -> Result<Vec<u8>, CloudError> {
        let url = format!("{}/files/{}", self.config.api_base_url, remote_id);
        let request = self
            .client
            .http()
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("alt", "media")]);

        let response = self
            .client
            .send(request, self.name(), Operation::Download)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Operation::Download.error(self.name(), e.to_string()))?;
        debug!(id = %remote_id, bytes = bytes.len(), "Downloaded from Google Drive");
        Ok(bytes.to_vec())
    }

    async fn list(&self, access_token: &str) -> Result<Vec<RemoteFileDescriptor>, CloudError> {
        let url = format!("{}/files", self.config.api_base_url);
        let query = format!(
            "{} in parents and trashed=false",
            query_literal(&self.config.folder)
        );
        let fields = format!("nextPageToken,files({FILE_FIELDS})");

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .http()
                .get(&url)
                .bearer_auth(access_token)
                .query(&[
                    ("q", query.as_str()),
                    ("fields", fields.as_str()),
                    ("pageSize", PAGE_SIZE),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: FileList = self
                .client
                .send_json(request, self.name(), Operation::List)
                .await?;
            files.extend(
                page.files
                    .into_iter()
                    .filter(|f| f.mime_type.as_deref() != Some(FOLDER_MIME_TYPE))
                    .map(RemoteFileDescriptor::from),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = files.len(), "Listed Google Drive folder");
        Ok(files)
    }
}
