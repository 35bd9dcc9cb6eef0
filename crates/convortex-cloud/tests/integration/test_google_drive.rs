//! Google Drive adapter against a mocked Drive v3 API

use convortex_core::domain::{CloudError, RemoteId};
use convortex_core::ports::IProviderAdapter;
use serde_json::json;
use wiremock::matchers::{
    bearer_token, body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, ResponseTemplate};

use convortex_cloud::client::ApiClient;
use convortex_cloud::providers::GoogleDriveAdapter;
use convortex_core::domain::ProviderKind;
use wiremock::MockServer;

use crate::common::{config_for, setup_google_drive, TOKEN};

#[tokio::test]
async fn test_upload_sends_multipart_related() {
    let (server, drive) = setup_google_drive().await;

    Mock::given(method("POST"))
        .and(path("/files"))
        .and(query_param("uploadType", "multipart"))
        .and(bearer_token(TOKEN))
        .and(header_regex("content-type", "^multipart/related; boundary=convortex-"))
        .and(body_string_contains(r#""parents":["folder-1"]"#))
        .and(body_string_contains("hello drive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "drv-1",
            "name": "notes.txt",
            "mimeType": "text/plain",
            "size": "11",
            "modifiedTime": "2026-01-15T10:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = drive
        .upload(TOKEN, b"hello drive".to_vec(), "notes.txt")
        .await
        .unwrap();
    assert_eq!(file.id, "drv-1");
    assert_eq!(file.size, 11);
}

#[tokio::test]
async fn test_upload_failure_carries_status_and_body() {
    let (server, drive) = setup_google_drive().await;

    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(403).set_body_string("storageQuotaExceeded"))
        .mount(&server)
        .await;

    let err = drive.upload(TOKEN, vec![1], "a.bin").await.unwrap_err();
    assert_eq!(
        err,
        CloudError::UploadError {
            provider: "Google Drive".to_string(),
            message: "403 Forbidden: storageQuotaExceeded".to_string(),
        }
    );
}

#[tokio::test]
async fn test_download_uses_alt_media() {
    let (server, drive) = setup_google_drive().await;

    Mock::given(method("GET"))
        .and(path("/files/drv-1"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"content".to_vec()))
        .mount(&server)
        .await;

    let bytes = drive
        .download(TOKEN, &RemoteId::new("drv-1").unwrap())
        .await
        .unwrap();
    assert_eq!(bytes, b"content");
}

#[tokio::test]
async fn test_download_not_found() {
    let (_server, drive) = setup_google_drive().await;
    let err = drive
        .download(TOKEN, &RemoteId::new("missing").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::DownloadError { ref message, .. } if message.starts_with("404")));
}

#[tokio::test]
async fn test_list_follows_page_token_and_skips_folders() {
    let (server, drive) = setup_google_drive().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", "'folder-1' in parents and trashed=false"))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "3", "name": "c.txt", "size": "3", "modifiedTime": "2026-01-03T00:00:00Z"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", "'folder-1' in parents and trashed=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nextPageToken": "p2",
            "files": [
                {"id": "1", "name": "a.txt", "size": "1", "modifiedTime": "2026-01-01T00:00:00Z"},
                {"id": "2", "name": "sub", "mimeType": "application/vnd.google-apps.folder"}
            ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let files = drive.list(TOKEN).await.unwrap();
    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "c.txt"]);
}

#[tokio::test]
async fn test_list_error_is_list_error() {
    let (server, drive) = setup_google_drive().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = drive.list(TOKEN).await.unwrap_err();
    assert_eq!(
        err,
        CloudError::ListError {
            provider: "Google Drive".to_string(),
            message: "500 Internal Server Error".to_string(),
        }
    );
}

#[tokio::test]
async fn test_large_upload_uses_resumable_session() {
    let (server, drive) = setup_google_drive().await;
    let data = vec![7u8; 5 * 1024 * 1024 + 1];
    let session_url = format!("{}/upload/session-1", server.uri());

    Mock::given(method("POST"))
        .and(path("/files"))
        .and(query_param("uploadType", "multipart"))
        .respond_with(ResponseTemplate::new(413))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .and(query_param("uploadType", "resumable"))
        .and(bearer_token(TOKEN))
        .and(header("X-Upload-Content-Length", data.len().to_string().as_str()))
        .and(body_string_contains(r#""name":"video.mp4""#))
        .respond_with(ResponseTemplate::new(200).insert_header("Location", session_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/session-1"))
        .and(bearer_token(TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "drv-big",
            "name": "video.mp4",
            "size": data.len().to_string(),
            "modifiedTime": "2026-01-15T10:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = drive.upload(TOKEN, data.clone(), "video.mp4").await.unwrap();
    assert_eq!(file.id, "drv-big");
    assert_eq!(file.size, data.len() as u64);
}

#[tokio::test]
async fn test_resumable_session_without_location_is_upload_error() {
    let (server, drive) = setup_google_drive().await;

    Mock::given(method("POST"))
        .and(path("/files"))
        .and(query_param("uploadType", "resumable"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = drive
        .upload(TOKEN, vec![0u8; 6 * 1024 * 1024], "big.bin")
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::UploadError { ref message, .. } if message.contains("Location")));
}

#[tokio::test]
async fn test_list_escapes_folder_in_query() {
    let server = MockServer::start().await;
    let drive = GoogleDriveAdapter::new(
        config_for(ProviderKind::GoogleDrive, &server).with_folder("Bob's"),
        ApiClient::default(),
    );

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", r"'Bob\'s' in parents and trashed=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(drive.list(TOKEN).await.unwrap().is_empty());
}
