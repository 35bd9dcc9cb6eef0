//! HTTP server for the token exchange relay
//!
//! Routes:
//! - `POST /oauth/exchange` with `{serviceId, code, redirectUri}`
//! - `POST /oauth/refresh` with `{serviceId, refreshToken}`
//! - `GET /health`
//!
//! Successful grants answer 200 with the token JSON. Failures answer with
//! `{"error": <code>, "message": <text>}`: 400 for a malformed body, 404 for
//! an unknown provider, 500 when credentials are missing and 502 when the
//! provider rejects the grant.

use std::net::SocketAddr;
use std::sync::Arc;

use convortex_core::domain::relay::{
    ExchangeRequest, RefreshRequest, RelayErrorBody, ERROR_EXCHANGE_FAILED,
    ERROR_INVALID_REQUEST, ERROR_MISSING_CREDENTIALS, ERROR_REFRESH_FAILED,
    ERROR_UNKNOWN_PROVIDER,
};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::credentials::{ProviderCredentials, RelayCredentials};
use crate::exchange::{ExchangeFailure, ProviderTokenClient};

/// Request bodies larger than this are rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

struct RelayState {
    credentials: RelayCredentials,
    tokens: ProviderTokenClient,
}

/// HTTP server that performs token exchanges on behalf of clients.
pub struct RelayServer {
    state: Arc<RelayState>,
    addr: SocketAddr,
}

impl RelayServer {
    /// Creates a new `RelayServer`.
    ///
    /// # Arguments
    /// * `credentials` - Per-provider client credentials
    /// * `tokens` - Client for provider token endpoints
    /// * `bind` - Address to bind, e.g. `"127.0.0.1:8787"`
    pub fn new(
        credentials: RelayCredentials,
        tokens: ProviderTokenClient,
        bind: &str,
    ) -> anyhow::Result<Self> {
        let addr: SocketAddr = bind.parse()?;
        Ok(Self {
            state: Arc::new(RelayState {
                credentials,
                tokens,
            }),
            addr,
        })
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run(&self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` fires.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: tokio_util::sync::CancellationToken,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        info!(addr = %addr, providers = self.state.credentials.len(), "Token relay listening");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept relay connection");
                            continue;
                        }
                    };
                    let io = TokioIo::new(stream);
                    let state = Arc::clone(&self.state);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { Ok::<_, hyper::Error>(handle_request(req, &state).await) }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            error!(error = %e, peer = %peer, "Relay HTTP connection error");
                        }
                    });
                }
                _ = shutdown.cancelled() => {
                    info!("Token relay shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: &RelayState,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/health") => json_response(StatusCode::OK, &json!({"status": "ok"})),
        (Method::POST, "/oauth/exchange") => match read_body::<ExchangeRequest>(req).await {
            Ok(body) => exchange(state, body).await,
            Err(resp) => resp,
        },
        (Method::POST, "/oauth/refresh") => match read_body::<RefreshRequest>(req).await {
            Ok(body) => refresh(state, body).await,
            Err(resp) => resp,
        },
        (_, "/health" | "/oauth/exchange" | "/oauth/refresh") => error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            ERROR_INVALID_REQUEST,
            "method not allowed",
        ),
        _ => error_response(StatusCode::NOT_FOUND, "not_found", "no such route"),
    }
}

async fn exchange(state: &RelayState, body: ExchangeRequest) -> Response<Full<Bytes>> {
    let credentials = match lookup(state, &body.service_id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if body.code.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, ERROR_INVALID_REQUEST, "code is empty");
    }

    let result = state
        .tokens
        .exchange_code(credentials, &body.code, &body.redirect_uri)
        .await;
    match result {
        Ok(token) => {
            info!(provider = %body.service_id, "Authorization code exchanged");
            json_response(StatusCode::OK, &token)
        }
        Err(failure) => failure_response(&body.service_id, failure, ERROR_EXCHANGE_FAILED),
    }
}

async fn refresh(state: &RelayState, body: RefreshRequest) -> Response<Full<Bytes>> {
    let credentials = match lookup(state, &body.service_id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if body.refresh_token.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            ERROR_INVALID_REQUEST,
            "refreshToken is empty",
        );
    }

    match state.tokens.refresh(credentials, &body.refresh_token).await {
        Ok(token) => {
            info!(provider = %body.service_id, "Access token refreshed");
            json_response(StatusCode::OK, &token)
        }
        Err(failure) => failure_response(&body.service_id, failure, ERROR_REFRESH_FAILED),
    }
}

fn lookup<'a>(
    state: &'a RelayState,
    service_id: &str,
) -> Result<&'a ProviderCredentials, Response<Full<Bytes>>> {
    state.credentials.get(service_id).ok_or_else(|| {
        warn!(provider = %service_id, "Request for unknown provider");
        error_response(
            StatusCode::NOT_FOUND,
            ERROR_UNKNOWN_PROVIDER,
            format!("unknown serviceId '{service_id}'"),
        )
    })
}

fn failure_response(
    service_id: &str,
    failure: ExchangeFailure,
    rejected_code: &str,
) -> Response<Full<Bytes>> {
    match failure {
        ExchangeFailure::MissingCredentials => {
            error!(provider = %service_id, "No client credentials configured");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ERROR_MISSING_CREDENTIALS,
                format!("no client credentials configured for '{service_id}'"),
            )
        }
        ExchangeFailure::InvalidRequest(message) => {
            error_response(StatusCode::BAD_REQUEST, ERROR_INVALID_REQUEST, message)
        }
        ExchangeFailure::Rejected(message) => {
            warn!(provider = %service_id, reason = %message, "Provider rejected grant");
            error_response(StatusCode::BAD_GATEWAY, rejected_code, message)
        }
    }
}

async fn read_body<T>(req: Request<hyper::body::Incoming>) -> Result<T, Response<Full<Bytes>>>
where
    T: serde::de::DeserializeOwned,
{
    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            error_response(
                StatusCode::BAD_REQUEST,
                ERROR_INVALID_REQUEST,
                format!("unreadable body: {e}"),
            )
        })?
        .to_bytes();

    serde_json::from_slice(&bytes).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            ERROR_INVALID_REQUEST,
            format!("malformed body: {e}"),
        )
    })
}

fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> Response<Full<Bytes>> {
    json_response(status, &RelayErrorBody::new(code, message))
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
