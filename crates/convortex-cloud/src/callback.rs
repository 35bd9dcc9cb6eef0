//! Local OAuth redirect intake
//!
//! [`LocalCallbackServer`] is a minimal HTTP server bound to the host and port
//! of the configured redirect URI. It answers requests on the redirect path,
//! extracts the callback parameters and returns them to the caller once.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use convortex_core::domain::CloudError;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Parameters extracted from the OAuth2 redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// The authorization code, absent when the provider reports an error
    pub code: Option<String>,
    /// The anti-forgery state parameter (empty if missing)
    pub state: String,
    /// Provider error code, e.g. `access_denied`
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parses the callback parameters from a request target or full URL
    ///
    /// Returns `None` when the query carries neither `code` nor `error`.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let url = if uri.starts_with('/') {
            url::Url::parse(&format!("http://localhost{uri}")).ok()?
        } else {
            url::Url::parse(uri).ok()?
        };

        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut error_description = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                "error_description" => error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        if code.is_none() && error.is_none() {
            return None;
        }
        Some(Self {
            code,
            state: state.unwrap_or_default(),
            error,
            error_description,
        })
    }

    /// Human-readable description of a provider-reported error
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(match &self.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error.clone(),
        })
    }
}

/// Minimal HTTP server that listens for the OAuth2 redirect callback
pub struct LocalCallbackServer {
    listener: TcpListener,
    path: String,
}

impl LocalCallbackServer {
    /// Binds to the host and port of `redirect_uri`
    pub async fn bind(redirect_uri: &str) -> Result<Self, CloudError> {
        let url = url::Url::parse(redirect_uri)
            .map_err(|e| CloudError::Launch(format!("invalid redirect URI '{redirect_uri}': {e}")))?;
        let host = url.host_str().unwrap_or("127.0.0.1");
        let port = url.port_or_known_default().unwrap_or(80);
        let addr = format!("{host}:{port}");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| CloudError::Launch(format!("failed to bind callback server to {addr}: {e}")))?;
        info!(%addr, path = url.path(), "OAuth callback server listening");

        Ok(Self {
            listener,
            path: url.path().to_string(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, CloudError> {
        self.listener
            .local_addr()
            .map_err(|e| CloudError::Launch(e.to_string()))
    }

    /// Serves requests until a callback arrives or `timeout` elapses
    pub async fn wait_for_callback(self, timeout: Duration) -> Result<CallbackParams, CloudError> {
        let (tx, mut rx) = mpsc::channel::<CallbackParams>(1);
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                Some(params) = rx.recv() => {
                    info!("Received OAuth callback");
                    return Ok(params);
                }
                _ = &mut deadline => {
                    return Err(CloudError::Launch(format!(
                        "no OAuth callback received within {}s",
                        timeout.as_secs()
                    )));
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted
                        .map_err(|e| CloudError::Launch(format!("callback accept failed: {e}")))?;
                    debug!(%peer, "Callback server accepted connection");

                    let io = TokioIo::new(stream);
                    let tx = tx.clone();
                    let path = self.path.clone();
                    let service = service_fn(move |req: Request<Incoming>| {
                        let tx = tx.clone();
                        let path = path.clone();
                        async move { Ok::<_, Infallible>(handle_request(&req, &path, &tx)) }
                    });

                    tokio::spawn(async move {
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            debug!(error = %e, "Callback server connection error");
                        }
                    });
                }
            }
        }
    }
}

fn handle_request(
    req: &Request<Incoming>,
    path: &str,
    tx: &mpsc::Sender<CallbackParams>,
) -> Response<Full<Bytes>> {
    if req.uri().path() != path {
        return html_response(StatusCode::NOT_FOUND, error_html("Not found"));
    }

    match CallbackParams::from_uri(&req.uri().to_string()) {
        Some(params) => {
            let page = match params.error_message() {
                Some(message) => error_html(&message),
                None => success_html(),
            };
            // Only the first callback is delivered; later ones are ignored.
            let _ = tx.try_send(params);
            html_response(StatusCode::OK, page)
        }
        None => html_response(
            StatusCode::BAD_REQUEST,
            error_html("Missing authorization code in callback"),
        ),
    }
}

fn html_response(status: StatusCode, html: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(html)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// Returns the HTML for a successful authorization page
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Convortex - Connected</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Account connected</h1>
    <p>You can close this window and return to Convortex.</p>
    <script>setTimeout(function() { window.close(); }, 3000);</script>
</body>
</html>"#
        .to_string()
}

/// Returns the HTML for an authorization error page
fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Convortex - Authorization Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authorization Error</h1>
    <p>{}</p>
    <p>Please close this window and try again.</p>
</body>
</html>"#,
        escape_html(message)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
