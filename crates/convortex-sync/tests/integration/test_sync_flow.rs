//! Directory scan + sync against a mocked Dropbox folder

use convortex_core::domain::{CloudError, RemoteId};
use convortex_core::ports::ITokenPersistence;
use convortex_sync::scan_directory;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_string, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{dropbox, local_file, setup, JAN_1, TOKEN};

fn upload_arg(name: &str) -> String {
    format!(r#"{{"autorename":false,"mode":"overwrite","mute":true,"path":"/Convortex/{name}"}}"#)
}

fn uploaded(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": format!("id:{name}"),
        "name": name,
        "size": 1,
        "server_modified": "2026-02-01T00:00:00Z"
    }))
}

fn listing(entries: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "entries": entries,
        "cursor": "c",
        "has_more": false
    }))
}

#[tokio::test]
async fn test_empty_remote_uploads_everything() {
    let env = setup().await;
    local_file(env.dir.path(), "a.txt", b"A", JAN_1);
    local_file(env.dir.path(), "b.txt", b"B", JAN_1);

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(listing(json!([])))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(bearer_token(TOKEN))
        .and(header("Dropbox-API-Arg", upload_arg("a.txt").as_str()))
        .and(body_string("A"))
        .respond_with(uploaded("a.txt"))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(header("Dropbox-API-Arg", upload_arg("b.txt").as_str()))
        .and(body_string("B"))
        .respond_with(uploaded("b.txt"))
        .expect(1)
        .mount(&env.server)
        .await;

    let files = scan_directory(env.dir.path()).await.unwrap();
    let mut progress = Vec::new();
    let result = env
        .orchestrator
        .sync_files(&dropbox(), &files, |p| progress.push(p.percent))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.uploaded_count, 2);
    assert_eq!(result.skipped_count, 0);
    assert_eq!(progress, vec![50, 100]);
}

#[tokio::test]
async fn test_only_newer_local_files_are_uploaded() {
    let env = setup().await;
    local_file(env.dir.path(), "fresh.txt", b"F", JAN_1 + 3600);
    local_file(env.dir.path(), "old.txt", b"O", JAN_1 - 3600);

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(listing(json!([
            {".tag": "file", "id": "id:1", "name": "fresh.txt", "size": 1,
             "server_modified": "2026-01-01T00:00:00Z"},
            {".tag": "file", "id": "id:2", "name": "old.txt", "size": 1,
             "server_modified": "2026-01-01T00:00:00Z"}
        ])))
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(header("Dropbox-API-Arg", upload_arg("fresh.txt").as_str()))
        .respond_with(uploaded("fresh.txt"))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(header("Dropbox-API-Arg", upload_arg("old.txt").as_str()))
        .respond_with(uploaded("old.txt"))
        .expect(0)
        .mount(&env.server)
        .await;

    let files = scan_directory(env.dir.path()).await.unwrap();
    let result = env
        .orchestrator
        .sync_files(&dropbox(), &files, |_| {})
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.uploaded_count, 1);
    assert_eq!(result.skipped_count, 1);
}

#[tokio::test]
async fn test_upload_failure_is_recorded_per_file() {
    let env = setup().await;
    local_file(env.dir.path(), "bad.txt", b"X", JAN_1);
    local_file(env.dir.path(), "good.txt", b"G", JAN_1);

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(listing(json!([])))
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(header("Dropbox-API-Arg", upload_arg("bad.txt").as_str()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(header("Dropbox-API-Arg", upload_arg("good.txt").as_str()))
        .respond_with(uploaded("good.txt"))
        .mount(&env.server)
        .await;

    let files = scan_directory(env.dir.path()).await.unwrap();
    let result = env
        .orchestrator
        .sync_files(&dropbox(), &files, |_| {})
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.uploaded_count, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("bad.txt: "));
    assert!(result.errors[0].contains("500 Internal Server Error"));
}

#[tokio::test]
async fn test_listing_failure_aborts_sync() {
    let env = setup().await;
    local_file(env.dir.path(), "a.txt", b"A", JAN_1);

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_access_token"))
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .respond_with(uploaded("a.txt"))
        .expect(0)
        .mount(&env.server)
        .await;

    let files = scan_directory(env.dir.path()).await.unwrap();
    let err = env
        .orchestrator
        .sync_files(&dropbox(), &files, |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::ListError { .. }));
}

#[tokio::test]
async fn test_disconnected_provider_is_rejected_before_listing() {
    let env = setup().await;
    env.persistence.delete(&dropbox()).unwrap();

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(listing(json!([])))
        .expect(0)
        .mount(&env.server)
        .await;

    let err = env
        .orchestrator
        .sync_files(&dropbox(), &[], |_| {})
        .await
        .unwrap_err();
    assert_eq!(err, CloudError::NotConnected("dropbox".to_string()));
    assert!(err.requires_reauthorization());
}

#[tokio::test]
async fn test_download_writes_local_file() {
    let env = setup().await;

    Mock::given(method("POST"))
        .and(path("/files/download"))
        .and(header("Dropbox-API-Arg", r#"{"path":"id:9"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote bytes".to_vec()))
        .mount(&env.server)
        .await;

    let dest = env.dir.path().join("downloads").join("file.bin");
    let written = env
        .orchestrator
        .download_file(&dropbox(), &RemoteId::new("id:9").unwrap(), &dest)
        .await
        .unwrap();

    assert_eq!(written, 12);
    assert_eq!(std::fs::read(&dest).unwrap(), b"remote bytes");
}
