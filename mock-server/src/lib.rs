//! Programmable HTTP server for exercising `simplehttp-core` over real sockets.
//!
//! # Design
//! Tests register `Expectation`s (method + path -> canned response) and the
//! server answers every other route through a single fallback handler. Each
//! request is recorded verbatim so tests can assert on what the client
//! actually put on the wire (headers in order, body bytes, transfer encoding).
//!
//! Admin routes allow driving a standalone instance over HTTP:
//! - `PUT /__expectations` registers one expectation (JSON body)
//! - `DELETE /__expectations` clears expectations and recorded requests
//! - `GET /__requests` lists recorded requests

use std::{sync::Arc, time::Duration};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::put,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

/// A canned response served for a matching method and path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub method: String,
    pub path: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Delay before the response head is written.
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_status() -> u16 {
    200
}

impl Expectation {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            status: default_status(),
            body: String::new(),
            headers: Vec::new(),
            delay_ms: 0,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.eq_ignore_ascii_case(method.as_str()) && self.path == path
    }
}

/// A request as observed by the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Lower-cased names, in arrival order, duplicates preserved.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// First value of `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).into_iter().next()
    }

    /// Every value of `name` in the order they were received.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Default)]
struct Inner {
    expectations: Vec<Expectation>,
    received: Vec<RecordedRequest>,
}

/// Shared server state. Cloning yields another handle to the same state.
///
/// The `*_blocking` variants are for synchronous test threads and must not
/// be called from inside a tokio runtime.
#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<RwLock<Inner>>,
}

impl MockState {
    pub async fn expect(&self, expectation: Expectation) {
        self.inner.write().await.expectations.push(expectation);
    }

    pub async fn received(&self) -> Vec<RecordedRequest> {
        self.inner.read().await.received.clone()
    }

    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.expectations.clear();
        inner.received.clear();
    }

    pub fn expect_blocking(&self, expectation: Expectation) {
        self.inner.blocking_write().expectations.push(expectation);
    }

    pub fn received_blocking(&self) -> Vec<RecordedRequest> {
        self.inner.blocking_read().received.clone()
    }

    pub fn reset_blocking(&self) {
        let mut inner = self.inner.blocking_write();
        inner.expectations.clear();
        inner.received.clear();
    }
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route(
            "/__expectations",
            put(add_expectation).delete(reset_expectations),
        )
        .route("/__requests", axum::routing::get(list_requests))
        .fallback(dispatch)
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app(state)).await
}

async fn add_expectation(
    State(state): State<MockState>,
    Json(expectation): Json<Expectation>,
) -> StatusCode {
    debug!(method = %expectation.method, path = %expectation.path, "expectation registered");
    state.expect(expectation).await;
    StatusCode::CREATED
}

async fn reset_expectations(State(state): State<MockState>) -> StatusCode {
    state.reset().await;
    StatusCode::NO_CONTENT
}

async fn list_requests(State(state): State<MockState>) -> Json<Vec<RecordedRequest>> {
    Json(state.received().await)
}

async fn dispatch(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    let matched = {
        let mut inner = state.inner.write().await;
        inner.received.push(recorded);
        inner
            .expectations
            .iter()
            .rev()
            .find(|e| e.matches(&method, &path))
            .cloned()
    };

    let Some(expectation) = matched else {
        debug!(%method, %path, "no expectation matched");
        return StatusCode::NOT_FOUND.into_response();
    };

    if expectation.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(expectation.delay_ms)).await;
    }

    let mut builder = Response::builder().status(expectation.status);
    for (name, value) in &expectation.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Body::from(expectation.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expectation_defaults_to_empty_200() {
        let e: Expectation = serde_json::from_str(r#"{"method":"GET","path":"/"}"#).unwrap();
        assert_eq!(e.status, 200);
        assert!(e.body.is_empty());
        assert!(e.headers.is_empty());
        assert_eq!(e.delay_ms, 0);
    }

    #[test]
    fn expectation_builder_uppercases_method() {
        let e = Expectation::new("get", "/a").status(404).body("missing");
        assert_eq!(e.method, "GET");
        assert_eq!(e.status, 404);
        assert_eq!(e.body, "missing");
    }

    #[test]
    fn delay_saturates_instead_of_truncating() {
        assert_eq!(Expectation::new("GET", "/").delay(Duration::from_millis(1500)).delay_ms, 1500);
        assert_eq!(Expectation::new("GET", "/").delay(Duration::MAX).delay_ms, u64::MAX);
    }

    #[test]
    fn expectation_matches_method_case_insensitively() {
        let e = Expectation::new("POST", "/upload");
        assert!(e.matches(&Method::POST, "/upload"));
        assert!(!e.matches(&Method::GET, "/upload"));
        assert!(!e.matches(&Method::POST, "/other"));
    }

    #[test]
    fn recorded_request_header_lookup_keeps_order() {
        let r = RecordedRequest {
            method: "GET".to_string(),
            path: "/".to_string(),
            headers: vec![
                ("x-trace".to_string(), "a".to_string()),
                ("accept".to_string(), "*/*".to_string()),
                ("x-trace".to_string(), "b".to_string()),
            ],
            body: String::new(),
        };
        assert_eq!(r.header("X-Trace"), Some("a"));
        assert_eq!(r.header_values("x-trace"), vec!["a", "b"]);
        assert_eq!(r.header("missing"), None);
    }
}
