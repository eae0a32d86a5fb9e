//! Fluent assembly of a `SimpleHttpClient`.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::client::SimpleHttpClient;
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::HttpError;
use crate::timeouts::TimeoutPolicy;
use crate::transport::{build_transport, TlsTrust};
use crate::validation::Validation;

/// Collects optional credentials and timeouts, defaulting both on `build`.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    credentials: Option<CredentialStore>,
    timeouts: Option<TimeoutPolicy>,
    validate_response: Option<bool>,
    trust_anchor: Option<PathBuf>,
}

impl ClientBuilder {
    pub fn create() -> Self {
        Self::default()
    }

    /// Builder pre-filled from a loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpError> {
        let mut builder = Self::create()
            .timeout_policy(config.timeout_policy())
            .validate_response(config.validate_response);
        if let Some(store) = config.credential_store()? {
            builder = builder.credential_store(store);
        }
        if let Some(path) = &config.trust_anchor {
            builder = builder.trust_anchor(path);
        }
        Ok(builder)
    }

    pub fn credential_store(mut self, store: CredentialStore) -> Self {
        self.credentials = Some(store);
        self
    }

    pub fn timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeouts = Some(policy);
        self
    }

    /// Default validation policy of the built client. Enforced unless set.
    pub fn validate_response(mut self, enabled: bool) -> Self {
        self.validate_response = Some(enabled);
        self
    }

    /// PEM bundle replacing the platform roots on the authenticated path.
    pub fn trust_anchor(mut self, path: &Path) -> Self {
        self.trust_anchor = Some(path.to_path_buf());
        self
    }

    pub fn build(self) -> Result<SimpleHttpClient, HttpError> {
        let mut transport = build_transport(self.credentials);
        if let Some(path) = &self.trust_anchor {
            match transport.trust() {
                TlsTrust::System => transport = transport.with_trust_anchor_file(path)?,
                TlsTrust::Permissive => {
                    warn!(path = %path.display(), "trust anchor ignored without credentials")
                }
            }
        }
        let timeouts = self
            .timeouts
            .unwrap_or_else(|| *TimeoutPolicy::default_policy());
        let validation = Validation::from_flag(self.validate_response.unwrap_or(true));
        Ok(SimpleHttpClient::new(transport, timeouts, validation))
    }
}
