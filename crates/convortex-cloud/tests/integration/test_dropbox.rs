//! Dropbox adapter against a mocked Dropbox API v2

use convortex_core::domain::{CloudError, RemoteId};
use convortex_core::ports::IProviderAdapter;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{setup_dropbox, TOKEN};

#[tokio::test]
async fn test_upload_overwrites_in_folder() {
    let (server, dropbox) = setup_dropbox().await;

    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(bearer_token(TOKEN))
        .and(header(
            "Dropbox-API-Arg",
            r#"{"autorename":false,"mode":"overwrite","mute":true,"path":"/Convortex/report.pdf"}"#,
        ))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "id:abc",
            "name": "report.pdf",
            "size": 4,
            "server_modified": "2026-01-15T10:00:00Z",
            "path_display": "/Convortex/report.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = dropbox
        .upload(TOKEN, b"%PDF".to_vec(), "report.pdf")
        .await
        .unwrap();
    assert_eq!(file.id, "id:abc");
    assert_eq!(file.size, 4);
}

#[tokio::test]
async fn test_download_passes_id_in_header() {
    let (server, dropbox) = setup_dropbox().await;

    Mock::given(method("POST"))
        .and(path("/files/download"))
        .and(header("Dropbox-API-Arg", r#"{"path":"id:abc"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
        .mount(&server)
        .await;

    let bytes = dropbox
        .download(TOKEN, &RemoteId::new("id:abc").unwrap())
        .await
        .unwrap();
    assert_eq!(bytes, b"data");
}

#[tokio::test]
async fn test_list_continues_while_has_more() {
    let (server, dropbox) = setup_dropbox().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .and(body_json(json!({"path": "/Convortex", "recursive": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [
                {".tag": "file", "id": "id:1", "name": "a.txt", "size": 1,
                 "server_modified": "2026-01-01T00:00:00Z"},
                {".tag": "folder", "id": "id:f", "name": "nested"}
            ],
            "cursor": "cur-1",
            "has_more": true
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder/continue"))
        .and(body_json(json!({"cursor": "cur-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [
                {".tag": "file", "id": "id:2", "name": "b.txt", "size": 2,
                 "server_modified": "2026-01-02T00:00:00Z"}
            ],
            "cursor": "cur-2",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = dropbox.list(TOKEN).await.unwrap();
    let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["id:1", "id:2"]);
}

#[tokio::test]
async fn test_list_missing_folder_is_empty() {
    let (server, dropbox) = setup_dropbox().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error_summary": "path/not_found/..",
            "error": {".tag": "path", "path": {".tag": "not_found"}}
        })))
        .mount(&server)
        .await;

    assert!(dropbox.list(TOKEN).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_unauthorized() {
    let (server, dropbox) = setup_dropbox().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired_access_token"))
        .mount(&server)
        .await;

    let err = dropbox.list(TOKEN).await.unwrap_err();
    assert_eq!(
        err,
        CloudError::ListError {
            provider: "Dropbox".to_string(),
            message: "401 Unauthorized: expired_access_token".to_string(),
        }
    );
}
