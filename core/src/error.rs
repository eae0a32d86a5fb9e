//! Error types for the HTTP client.
//!
//! # Design
//! Variants follow how callers react rather than where the failure came
//! from. `Network` is the only variant the best-effort accessors (`get`,
//! `head`, `post`, `put`) swallow; everything else reaches the caller.
//! `Unauthorized` is kept apart from `Validation` because it is raised while
//! the entity is being consumed, after the status gate has already passed.

use thiserror::Error;

/// Errors produced by `SimpleHttpClient` and its builders.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Invalid method, credential scheme or configuration value.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// TLS trust material could not be assembled.
    #[error("could not build transport: {0}")]
    TransportBuild(String),

    /// The request could not be executed (connect, timeout, I/O).
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// A request body could not be staged on local disk.
    #[error("could not stage request body for {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Status >= 400 while validation was enforced.
    #[error("Got {status_line} for {url}")]
    Validation {
        status: u16,
        status_line: String,
        url: String,
    },

    /// The server refused the credentials while the entity was consumed.
    #[error("Request was not authorized by server. See: {0}")]
    Unauthorized(String),

    /// The response body could not be decoded into the requested shape.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl HttpError {
    /// Status code carried by a `Validation` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by the JSON and XML convenience decoders.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{url} returned an empty or null response")]
    EmptyBody { url: String },

    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url} did not return a JSON object")]
    NotAnObject { url: String },

    #[error("Error creating document of {url}. See: {cause}")]
    Xml { url: String, cause: String },
}
