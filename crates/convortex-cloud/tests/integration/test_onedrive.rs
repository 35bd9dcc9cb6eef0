//! OneDrive adapter against a mocked Microsoft Graph API

use convortex_core::domain::{CloudError, RemoteId};
use convortex_core::ports::IProviderAdapter;
use serde_json::json;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{setup_onedrive, TOKEN};

#[tokio::test]
async fn test_upload_puts_content_by_path() {
    let (server, onedrive) = setup_onedrive().await;

    Mock::given(method("PUT"))
        .and(path("/me/drive/root:/Convortex/my%20notes.txt:/content"))
        .and(bearer_token(TOKEN))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "item-1",
            "name": "my notes.txt",
            "size": 5,
            "lastModifiedDateTime": "2026-01-15T10:00:00Z",
            "file": {"mimeType": "text/plain"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = onedrive
        .upload(TOKEN, b"notes".to_vec(), "my notes.txt")
        .await
        .unwrap();
    assert_eq!(file.id, "item-1");
    assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_download_item_content() {
    let (server, onedrive) = setup_onedrive().await;

    Mock::given(method("GET"))
        .and(path("/me/drive/items/item-1/content"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"bytes".to_vec())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let bytes = onedrive
        .download(TOKEN, &RemoteId::new("item-1").unwrap())
        .await
        .unwrap();
    assert_eq!(bytes, b"bytes");
}

#[tokio::test]
async fn test_list_follows_next_link() {
    let (server, onedrive) = setup_onedrive().await;

    Mock::given(method("GET"))
        .and(path("/me/drive/root:/Convortex:/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "1", "name": "a.txt", "size": 1, "file": {}},
                {"id": "d", "name": "sub", "folder": {"childCount": 2}}
            ],
            "@odata.nextLink": format!("{}/next-page", server.uri())
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next-page"))
        .and(bearer_token(TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "2", "name": "b.txt", "size": 2, "file": {}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = onedrive.list(TOKEN).await.unwrap();
    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

#[tokio::test]
async fn test_list_missing_folder_is_empty() {
    let (_server, onedrive) = setup_onedrive().await;
    // wiremock answers 404 for unmatched requests
    assert!(onedrive.list(TOKEN).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_server_error() {
    let (server, onedrive) = setup_onedrive().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = onedrive.upload(TOKEN, vec![0], "x.bin").await.unwrap_err();
    assert_eq!(
        err,
        CloudError::UploadError {
            provider: "OneDrive".to_string(),
            message: "503 Service Unavailable".to_string(),
        }
    );
}
