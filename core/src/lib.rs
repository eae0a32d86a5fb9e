//! Blocking HTTP client with pluggable credentials, TLS trust selection and
//! a togglable status-code gate.
//!
//! # Overview
//! `ClientBuilder` assembles a `SimpleHttpClient` from an optional
//! `CredentialStore` and an optional `TimeoutPolicy`. Each call builds an
//! `HttpRequest`, executes it through a `Transport`-configured agent, runs
//! the validator and returns either trimmed body text, an owned
//! `ResponseSnapshot`, or a decoded JSON object / XML document.
//!
//! # Design
//! - A transport authenticates with system trust, or is unauthenticated with
//!   permissive trust; never anything in between.
//! - Validation is a value carried by the client handle, not shared mutable
//!   state; `with_validation_suspended` hands out a suspended clone.
//! - Responses are copied out before the connection is released.
//! - String bodies go through a temp file that is deleted when the call
//!   returns.

pub mod body;
pub mod builder;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod timeouts;
pub mod transport;
pub mod validation;
pub mod xml;

pub use builder::ClientBuilder;
pub use client::SimpleHttpClient;
pub use config::ClientConfig;
pub use credentials::{build_credentials, CredentialScheme, CredentialStore, Credentials};
pub use error::{HttpError, ParseError};
pub use http::{HttpMethod, HttpRequest, RequestBody, ResponseSnapshot};
pub use timeouts::TimeoutPolicy;
pub use transport::{build_transport, TlsTrust, Transport};
pub use validation::Validation;
pub use xml::Document;
