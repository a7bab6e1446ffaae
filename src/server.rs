//! HTTP listener: adapts hyper requests into [`IncomingRequest`] values,
//! routes admin traffic, and serializes dispatch outcomes back to the wire.
//!
//! Every accepted connection gets its own task, and every request runs in a
//! further task so a panic in one handler is converted into a 500 diagnostic
//! instead of tearing anything else down.

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::history::CallHistory;
use crate::index::RuntimeIndex;
use crate::loader;
use crate::mapping::IncomingRequest;
use crate::registry::MappingRegistry;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Shared server state, injected rather than global.
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub index: Arc<RuntimeIndex>,
    pub registry: Arc<MappingRegistry>,
    pub history: Arc<CallHistory>,
    pub mappings_dir: PathBuf,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl MockServer {
    pub fn new(addr: SocketAddr, state: Arc<AppState>) -> Self {
        Self { addr, state }
    }

    /// Accept loop; runs until ctrl-c.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("mock server listening on http://{}", self.addr);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, _) = accepted?;
                    let io = TokioIo::new(stream);
                    let state = Arc::clone(&self.state);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { serve_request(req, state).await }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("connection error: {}", err);
                        }
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    return Ok(());
                }
            }
        }
    }
}

/// One task per request; a panicking handler becomes a 500 response.
async fn serve_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match tokio::spawn(handle_request(req, state)).await {
        Ok(response) => Ok(response),
        Err(err) => {
            error!(panicked = err.is_panic(), "request handler aborted");
            Ok(json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({"error": "internal server error"}),
            ))
        }
    }
}

async fn handle_request(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if let Some(admin_path) = path.strip_prefix("/__admin") {
        return route_admin(&method, admin_path, &state).await;
    }

    let query = parse_query_string(req.uri().query().unwrap_or(""));
    let body_bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            return json_response(
                StatusCode::BAD_REQUEST,
                &json!({"error": "failed to read body"}),
            );
        }
    };

    let incoming = IncomingRequest {
        method: method.to_string(),
        url: path,
        query,
        body: decode_body(&body_bytes),
    };

    let outcome = state.dispatcher.dispatch(incoming).await;
    outcome_response(outcome)
}

/// Admin introspection endpoints, under a prefix stubs cannot shadow.
async fn route_admin(method: &Method, path: &str, state: &AppState) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/health") => json_response(
            StatusCode::OK,
            &json!({
                "status": "ok",
                "mappings": state.index.count(),
                "index": state.index.stats(),
            }),
        ),
        (&Method::GET, "/mappings") => json_response(StatusCode::OK, &state.registry.snapshot()),
        (&Method::GET, "/requests") => json_response(StatusCode::OK, &state.history.snapshot()),
        (&Method::DELETE, "/requests") => {
            state.history.clear();
            json_response(StatusCode::OK, &json!({"cleared": true}))
        }
        (&Method::POST, "/reload") => {
            match loader::reload_dir(&state.mappings_dir, &state.index, &state.registry) {
                Ok(summary) => {
                    info!(loaded = summary.loaded, skipped = summary.skipped, "reloaded mappings");
                    json_response(StatusCode::OK, &summary)
                }
                Err(err) => {
                    error!(error = %err, "reload failed");
                    json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        &json!({"error": err.to_string()}),
                    )
                }
            }
        }
        _ => json_response(
            StatusCode::NOT_FOUND,
            &json!({"error": "unknown admin endpoint"}),
        ),
    }
}

fn outcome_response(outcome: DispatchOutcome) -> Response<Full<Bytes>> {
    let payload = serde_json::to_vec(&outcome.body).unwrap_or_else(|_| b"null".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(payload)));
    *response.status_mut() = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::OK);

    for (name, value) in &outcome.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "skipping invalid response header"),
        }
    }

    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let payload = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(payload)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Decode the request body: JSON when it parses, otherwise the raw text as a
/// JSON string, `None` when empty.
fn decode_body(bytes: &[u8]) -> Option<serde_json::Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(serde_json::Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
    }
}

/// Parse a query string into a multi-valued map; HTTP allows repeated keys.
fn parse_query_string(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        let (key, value) = match part.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(part), String::new()),
        };
        params.entry(key).or_default().push(value);
    }
    params
}

/// Minimal percent decoding, with `+` as space.
fn percent_decode(s: &str) -> String {
    let mut out = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();

    while let Some(b) = bytes.next() {
        match b {
            b'%' => match (bytes.next(), bytes.next()) {
                (Some(hi), Some(lo)) => {
                    let hex = [hi, lo];
                    match std::str::from_utf8(&hex)
                        .ok()
                        .and_then(|h| u8::from_str_radix(h, 16).ok())
                    {
                        Some(byte) => out.push(byte),
                        None => {
                            out.push(b'%');
                            out.extend_from_slice(&hex);
                        }
                    }
                }
                (Some(hi), None) => {
                    out.push(b'%');
                    out.push(hi);
                }
                _ => out.push(b'%'),
            },
            b'+' => out.push(b' '),
            other => out.push(other),
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}
