//! RelayTokenExchange against a mocked token relay

use convortex_core::domain::{CloudError, ProviderId};
use convortex_core::ports::ITokenExchange;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{setup_relay, token_json};

fn dropbox() -> ProviderId {
    ProviderId::new("dropbox").unwrap()
}

#[tokio::test]
async fn test_exchange_posts_camel_case_body() {
    let (server, relay) = setup_relay().await;

    Mock::given(method("POST"))
        .and(path("/oauth/exchange"))
        .and(body_json(json!({
            "serviceId": "dropbox",
            "code": "auth-code",
            "redirectUri": "http://127.0.0.1:8400/callback"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("acc", Some("ref"))))
        .expect(1)
        .mount(&server)
        .await;

    let token = relay
        .exchange_code(&dropbox(), "auth-code", "http://127.0.0.1:8400/callback")
        .await
        .unwrap();
    assert_eq!(token.access_token, "acc");
    assert_eq!(token.refresh_token.as_deref(), Some("ref"));
    assert_eq!(token.expires_in, Some(3600));
}

#[tokio::test]
async fn test_exchange_missing_credentials() {
    let (server, relay) = setup_relay().await;

    Mock::given(method("POST"))
        .and(path("/oauth/exchange"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "missing_credentials",
            "message": "no client secret configured"
        })))
        .mount(&server)
        .await;

    let err = relay
        .exchange_code(&dropbox(), "c", "http://127.0.0.1:8400/callback")
        .await
        .unwrap_err();
    assert_eq!(err, CloudError::MissingCredentials("dropbox".to_string()));
}

#[tokio::test]
async fn test_exchange_rejected_code() {
    let (server, relay) = setup_relay().await;

    Mock::given(method("POST"))
        .and(path("/oauth/exchange"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "error": "exchange_failed",
            "message": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let err = relay
        .exchange_code(&dropbox(), "stale", "http://127.0.0.1:8400/callback")
        .await
        .unwrap_err();
    match err {
        CloudError::TokenExchangeFailed(message) => {
            assert!(message.contains("502"));
            assert!(message.contains("exchange_failed: invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_posts_refresh_token() {
    let (server, relay) = setup_relay().await;

    Mock::given(method("POST"))
        .and(path("/oauth/refresh"))
        .and(body_json(json!({"serviceId": "dropbox", "refreshToken": "ref-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("acc-2", None)))
        .mount(&server)
        .await;

    let token = relay.refresh(&dropbox(), "ref-1").await.unwrap();
    assert_eq!(token.access_token, "acc-2");
    assert!(token.refresh_token.is_none());
}

#[tokio::test]
async fn test_refresh_failure_is_refresh_failed() {
    let (server, relay) = setup_relay().await;

    Mock::given(method("POST"))
        .and(path("/oauth/refresh"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = relay.refresh(&dropbox(), "ref-1").await.unwrap_err();
    assert!(matches!(err, CloudError::RefreshFailed { ref provider, .. } if provider == "dropbox"));
}

#[tokio::test]
async fn test_relay_unreachable() {
    let relay = convortex_cloud::relay::RelayTokenExchange::new(
        "http://127.0.0.1:9",
        &convortex_cloud::ApiClient::default(),
    );
    let err = relay
        .exchange_code(&dropbox(), "c", "http://127.0.0.1:8400/callback")
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::TokenExchangeFailed(ref m) if m.starts_with("relay unreachable")));
}
