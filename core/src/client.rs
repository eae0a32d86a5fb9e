//! Blocking HTTP client with pluggable credentials and a status-code gate.
//!
//! # Design
//! `SimpleHttpClient` owns one agent built from its `Transport` and
//! `TimeoutPolicy`, plus the `Validation` policy applied to its calls. Every
//! call goes through `execute`, which:
//! 1. stages a string body into a scoped temp file,
//! 2. sends the request with credentials and caller headers,
//! 3. copies the response head into a `ResponseSnapshot`,
//! 4. runs the validator before touching the entity,
//! 5. reads the entity into the snapshot and drops the connection.
//!
//! `get`, `head`, `post` and `put` are best-effort: a request that never got
//! a response is logged and reported as an empty result. `get_response`,
//! `get_json` and `get_document` need a usable response and fail instead.

use std::fmt;
use std::fs::File;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, error};
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder, SendBody};

use crate::body::StagedBody;
use crate::error::{HttpError, ParseError};
use crate::http::{HttpMethod, HttpRequest, RequestBody, ResponseSnapshot};
use crate::timeouts::TimeoutPolicy;
use crate::transport::Transport;
use crate::validation::{consume, validate, Validation};
use crate::xml::Document;

/// Synchronous HTTP client. Cheap to clone; clones share the connection
/// pool.
#[derive(Clone)]
pub struct SimpleHttpClient {
    agent: Agent,
    transport: Transport,
    timeouts: TimeoutPolicy,
    validation: Validation,
}

impl fmt::Debug for SimpleHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleHttpClient")
            .field("transport", &self.transport)
            .field("timeouts", &self.timeouts)
            .field("validation", &self.validation)
            .finish()
    }
}

impl SimpleHttpClient {
    pub(crate) fn new(transport: Transport, timeouts: TimeoutPolicy, validation: Validation) -> Self {
        Self {
            agent: transport.agent(&timeouts),
            transport,
            timeouts,
            validation,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn timeouts(&self) -> &TimeoutPolicy {
        &self.timeouts
    }

    pub fn validation(&self) -> Validation {
        self.validation
    }

    /// A handle sharing this client's pool but applying `validation`.
    pub fn with_validation(&self, validation: Validation) -> Self {
        Self {
            validation,
            ..self.clone()
        }
    }

    /// Run `block` against a handle whose calls never fail on status codes.
    ///
    /// `self` is left untouched, so calls made concurrently through it keep
    /// their own policy, and validation is back in force once `block`
    /// returns.
    pub fn with_validation_suspended<R>(&self, block: impl FnOnce(&SimpleHttpClient) -> R) -> R {
        let suspended = self.with_validation(Validation::Suspended);
        block(&suspended)
    }

    /// Execute one request and return its snapshot.
    pub fn execute(&self, request: &HttpRequest) -> Result<ResponseSnapshot, HttpError> {
        let url = request.url.as_str();

        // Lives until the response has been consumed.
        let staged;
        let body_path: Option<&Path> = match &request.body {
            RequestBody::Empty => None,
            RequestBody::Text(text) => {
                staged = StagedBody::write(text).map_err(|source| io_error(url, source))?;
                Some(staged.path())
            }
            RequestBody::File(path) => Some(path.as_path()),
        };

        let response = match request.method {
            HttpMethod::Head => self.decorate(self.agent.head(url), request).call(),
            HttpMethod::Get => self.decorate(self.agent.get(url), request).call(),
            HttpMethod::Post => {
                let builder = self.decorate(self.agent.post(url), request);
                match body_path {
                    Some(path) => {
                        let mut file = File::open(path).map_err(|source| io_error(url, source))?;
                        builder.send(SendBody::from_reader(&mut file))
                    }
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = self.decorate(self.agent.put(url), request);
                match body_path {
                    Some(path) => {
                        let bytes = std::fs::read(path).map_err(|source| io_error(url, source))?;
                        builder.send(&bytes[..])
                    }
                    None => builder.send_empty(),
                }
            }
        }
        .map_err(|source| HttpError::Network {
            url: url.to_string(),
            source,
        })?;

        let mut snapshot = head_of(&response);
        let status_line = snapshot.status_line();
        match (request.method, body_path) {
            (HttpMethod::Post, Some(path)) => {
                debug!("POSTing \"{}\" to {url}: {status_line}", path.display())
            }
            (HttpMethod::Put, Some(path)) => {
                debug!("PUTing \"{}\" to {url}: {status_line}", path.display())
            }
            (method, _) => debug!("{method} {url}: {status_line}"),
        }

        validate(self.validation, snapshot.status, &status_line, url)?;
        snapshot.body = read_entity(response, url)?;
        Ok(snapshot)
    }

    fn decorate<B>(&self, mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        if let Some(store) = self.transport.credentials() {
            builder = builder.header("Authorization", store.authorization_header());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn best_effort(&self, request: &HttpRequest) -> Result<ResponseSnapshot, HttpError> {
        match self.execute(request) {
            Err(e @ (HttpError::Network { .. } | HttpError::Io { .. })) => {
                error!(url = %request.url, error = %e, "{} failed", request.method);
                Ok(ResponseSnapshot::empty())
            }
            other => other,
        }
    }

    /// GET `url` and return the body as trimmed UTF-8 text.
    ///
    /// Returns an empty string when no response was received or the body
    /// could not be decoded.
    pub fn get(&self, url: impl AsRef<str>, headers: &[(&str, &str)]) -> Result<String, HttpError> {
        let request = HttpRequest::new(HttpMethod::Get, url.as_ref()).headers(headers);
        let snapshot = self.best_effort(&request)?;
        Ok(snapshot.body_text().trim().to_string())
    }

    /// GET `url` and return the full snapshot; fails if no response arrives.
    pub fn get_response(&self, url: impl AsRef<str>) -> Result<ResponseSnapshot, HttpError> {
        self.execute(&HttpRequest::new(HttpMethod::Get, url.as_ref()))
    }

    /// HEAD `url`; an empty snapshot when no response was received.
    pub fn head(&self, url: impl AsRef<str>) -> Result<ResponseSnapshot, HttpError> {
        self.best_effort(&HttpRequest::new(HttpMethod::Head, url.as_ref()))
    }

    /// POST a string body, sent with chunked transfer encoding.
    pub fn post(
        &self,
        url: impl AsRef<str>,
        body: &str,
        headers: &[(&str, &str)],
    ) -> Result<ResponseSnapshot, HttpError> {
        let request = HttpRequest::new(HttpMethod::Post, url.as_ref())
            .headers(headers)
            .body(RequestBody::Text(body.to_string()));
        self.best_effort(&request)
    }

    /// POST with an empty entity.
    pub fn post_empty(
        &self,
        url: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> Result<ResponseSnapshot, HttpError> {
        self.post(url, "", headers)
    }

    pub fn post_file(
        &self,
        url: impl AsRef<str>,
        file: &Path,
        headers: &[(&str, &str)],
    ) -> Result<ResponseSnapshot, HttpError> {
        let request = HttpRequest::new(HttpMethod::Post, url.as_ref())
            .headers(headers)
            .body(RequestBody::File(file.to_path_buf()));
        self.best_effort(&request)
    }

    /// PUT a string body with a known content length.
    pub fn put(
        &self,
        url: impl AsRef<str>,
        body: &str,
        headers: &[(&str, &str)],
    ) -> Result<ResponseSnapshot, HttpError> {
        let request = HttpRequest::new(HttpMethod::Put, url.as_ref())
            .headers(headers)
            .body(RequestBody::Text(body.to_string()));
        self.best_effort(&request)
    }

    pub fn put_file(
        &self,
        url: impl AsRef<str>,
        file: &Path,
        headers: &[(&str, &str)],
    ) -> Result<ResponseSnapshot, HttpError> {
        let request = HttpRequest::new(HttpMethod::Put, url.as_ref())
            .headers(headers)
            .body(RequestBody::File(file.to_path_buf()));
        self.best_effort(&request)
    }

    /// GET `url` and parse the body as a JSON object.
    pub fn get_json(&self, url: impl AsRef<str>) -> Result<Map<String, Value>, HttpError> {
        let url = url.as_ref();
        let body = self.get(url, &[])?;
        if body.is_empty() {
            return Err(ParseError::EmptyBody { url: url.to_string() }.into());
        }
        match serde_json::from_str(&body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ParseError::NotAnObject { url: url.to_string() }.into()),
            Err(source) => Err(ParseError::Json {
                url: url.to_string(),
                source,
            }
            .into()),
        }
    }

    /// GET `url` and parse the body as an XML document.
    pub fn get_document(&self, url: impl AsRef<str>) -> Result<Document, HttpError> {
        let url = url.as_ref();
        let body = self.get(url, &[])?;
        Document::parse(&body).map_err(|e| {
            ParseError::Xml {
                url: url.to_string(),
                cause: e.to_string(),
            }
            .into()
        })
    }
}

fn io_error(url: &str, source: std::io::Error) -> HttpError {
    HttpError::Io {
        url: url.to_string(),
        source,
    }
}

/// Status, reason and headers of a live response.
fn head_of(response: &Response<Body>) -> ResponseSnapshot {
    let status = response.status();
    ResponseSnapshot {
        status: status.as_u16(),
        reason: status.canonical_reason().map(str::to_string),
        headers: response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: None,
    }
}

/// Consume the entity; the connection is released when `response` drops.
fn read_entity(mut response: Response<Body>, url: &str) -> Result<Option<String>, HttpError> {
    consume(response.body_mut().as_reader(), url)
}
