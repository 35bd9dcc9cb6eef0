//! Relay HTTP API against a mocked provider token endpoint

use std::sync::Arc;

use convortex_cloud::relay::RelayTokenExchange;
use convortex_cloud::storage::MemoryTokenPersistence;
use convortex_cloud::{ApiClient, TokenStore};
use convortex_core::domain::{CloudError, ProviderId};
use convortex_core::ports::ITokenExchange;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{start_relay, TOKEN_PATH};

const REDIRECT: &str = "http://127.0.0.1:8400/callback";

fn provider_token(access: &str, refresh: Option<&str>) -> ResponseTemplate {
    let mut body = json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 14400
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    ResponseTemplate::new(200).set_body_json(body)
}

#[tokio::test]
async fn test_health() {
    let env = start_relay().await;
    let resp = env.http.get(env.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_exchange_sends_secret_in_body() {
    let env = start_relay().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains("client_id=db-id"))
        .and(body_string_contains("client_secret=db-secret"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8400%2Fcallback"))
        .respond_with(provider_token("acc-1", Some("ref-1")))
        .expect(1)
        .mount(&env.provider)
        .await;

    let resp = env
        .http
        .post(env.url("/oauth/exchange"))
        .json(&json!({"serviceId": "dropbox", "code": "auth-code", "redirectUri": REDIRECT}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["access_token"], "acc-1");
    assert_eq!(body["refresh_token"], "ref-1");
    assert_eq!(body["expires_in"], 14400);
    assert!(!body.to_string().contains("db-secret"));
}

#[tokio::test]
async fn test_refresh_grant() {
    let env = start_relay().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=ref-1"))
        .respond_with(provider_token("acc-2", None))
        .expect(1)
        .mount(&env.provider)
        .await;

    let resp = env
        .http
        .post(env.url("/oauth/refresh"))
        .json(&json!({"serviceId": "dropbox", "refreshToken": "ref-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["access_token"], "acc-2");
    assert!(body.get("refresh_token").is_none());
}

#[tokio::test]
async fn test_provider_rejection_is_bad_gateway() {
    let env = start_relay().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "code has expired"
        })))
        .mount(&env.provider)
        .await;

    let resp = env
        .http
        .post(env.url("/oauth/exchange"))
        .json(&json!({"serviceId": "dropbox", "code": "stale", "redirectUri": REDIRECT}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "exchange_failed");
    assert_eq!(body["message"], "invalid_grant: code has expired");
}

#[tokio::test]
async fn test_missing_secret_is_server_error() {
    let env = start_relay().await;
    let resp = env
        .http
        .post(env.url("/oauth/exchange"))
        .json(&json!({"serviceId": "box", "code": "c", "redirectUri": REDIRECT}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "missing_credentials");
}

#[tokio::test]
async fn test_unknown_provider_and_bad_body() {
    let env = start_relay().await;

    let resp = env
        .http
        .post(env.url("/oauth/refresh"))
        .json(&json!({"serviceId": "icloud", "refreshToken": "r"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unknown_provider");

    let resp = env
        .http
        .post(env.url("/oauth/exchange"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let resp = env.http.get(env.url("/oauth/exchange")).send().await.unwrap();
    assert_eq!(resp.status(), 405);
}

#[tokio::test]
async fn test_client_round_trip_through_relay() {
    let env = start_relay().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(provider_token("acc-1", Some("ref-1")))
        .mount(&env.provider)
        .await;

    let relay: Arc<dyn ITokenExchange> = Arc::new(RelayTokenExchange::new(
        format!("http://{}", env.addr),
        &ApiClient::default(),
    ));
    let store = TokenStore::new(Arc::new(MemoryTokenPersistence::new()), relay.clone());
    let dropbox = ProviderId::new("dropbox").unwrap();

    let response = relay.exchange_code(&dropbox, "c", REDIRECT).await.unwrap();
    store.store(&dropbox, response).unwrap();
    assert_eq!(store.get_valid_access_token(&dropbox).await.unwrap(), "acc-1");

    let boxp = ProviderId::new("box").unwrap();
    let err = relay.exchange_code(&boxp, "c", REDIRECT).await.unwrap_err();
    assert_eq!(err, CloudError::MissingCredentials("box".to_string()));
}
