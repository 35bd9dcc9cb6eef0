//! Box adapter against a mocked Box Content API

use convortex_core::domain::{CloudError, RemoteId};
use convortex_core::ports::IProviderAdapter;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{setup_box, TOKEN};

fn entry(id: &str, name: &str) -> serde_json::Value {
    json!({
        "type": "file",
        "id": id,
        "name": name,
        "size": 3,
        "modified_at": "2026-01-15T02:00:00-08:00"
    })
}

#[tokio::test]
async fn test_upload_new_file() {
    let (server, boxp) = setup_box().await;

    Mock::given(method("POST"))
        .and(path("/files/content"))
        .and(body_string_contains(r#"{"name":"a.txt","parent":{"id":"0"}}"#))
        .and(body_string_contains("abc"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"total_count": 1, "entries": [entry("11", "a.txt")]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = boxp.upload(TOKEN, b"abc".to_vec(), "a.txt").await.unwrap();
    assert_eq!(file.id, "11");
    assert_eq!(file.modified_at.to_rfc3339(), "2026-01-15T10:00:00+00:00");
}

#[tokio::test]
async fn test_upload_conflict_uploads_new_version() {
    let (server, boxp) = setup_box().await;

    Mock::given(method("POST"))
        .and(path("/files/content"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "type": "error",
            "status": 409,
            "code": "item_name_in_use",
            "context_info": {"conflicts": {"type": "file", "id": "77", "name": "a.txt"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/files/77/content"))
        .and(body_string_contains("v2"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"total_count": 1, "entries": [entry("77", "a.txt")]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = boxp.upload(TOKEN, b"v2".to_vec(), "a.txt").await.unwrap();
    assert_eq!(file.id, "77");
}

#[tokio::test]
async fn test_upload_conflict_without_id_fails() {
    let (server, boxp) = setup_box().await;

    Mock::given(method("POST"))
        .and(path("/files/content"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"code": "conflict"})))
        .mount(&server)
        .await;

    let err = boxp.upload(TOKEN, vec![1], "a.txt").await.unwrap_err();
    assert!(matches!(err, CloudError::UploadError { .. }));
}

#[tokio::test]
async fn test_download_content() {
    let (server, boxp) = setup_box().await;

    Mock::given(method("GET"))
        .and(path("/files/11/content"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"abc".to_vec()))
        .mount(&server)
        .await;

    let bytes = boxp
        .download(TOKEN, &RemoteId::new("11").unwrap())
        .await
        .unwrap();
    assert_eq!(bytes, b"abc");
}

#[tokio::test]
async fn test_list_pages_by_offset() {
    let (server, boxp) = setup_box().await;

    Mock::given(method("GET"))
        .and(path("/folders/0/items"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "entries": [entry("1", "a.txt"), {"type": "folder", "id": "2", "name": "sub"}],
            "offset": 0,
            "limit": 2
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/folders/0/items"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "entries": [entry("3", "c.txt")],
            "offset": 2,
            "limit": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = boxp.list(TOKEN).await.unwrap();
    let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[tokio::test]
async fn test_list_failure() {
    let (server, boxp) = setup_box().await;

    Mock::given(method("GET"))
        .and(path("/folders/0/items"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"code": "internal"})))
        .mount(&server)
        .await;

    let err = boxp.list(TOKEN).await.unwrap_err();
    assert!(matches!(err, CloudError::ListError { ref provider, .. } if provider == "Box"));
}
