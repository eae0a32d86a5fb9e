//! Builds the connection-capable agent a client executes requests through.
//!
//! # Design
//! A transport is exactly one of two shapes, picked from whether a
//! `CredentialStore` exists:
//! - credentials present: system trust store, credentials on every request;
//! - credentials absent: permissive trust that accepts self-signed chains.
//!
//! The permissive branch still carries the (empty) credential slot so both
//! branches install credentials the same way.

use std::fmt;
use std::path::Path;

use tracing::debug;
use ureq::tls::{parse_pem, Certificate, PemItem, RootCerts, TlsConfig};
use ureq::Agent;

use crate::credentials::CredentialStore;
use crate::error::HttpError;
use crate::timeouts::TimeoutPolicy;

/// Certificate-chain policy of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsTrust {
    /// Chains must verify against the platform trust store (or an explicit
    /// trust anchor).
    System,
    /// Any certificate, self-signed included, is accepted.
    Permissive,
}

impl TlsTrust {
    pub fn accepts_self_signed(&self) -> bool {
        matches!(self, TlsTrust::Permissive)
    }
}

/// Trust policy plus credentials, turned into an `Agent` once timeouts are
/// known.
#[derive(Clone)]
pub struct Transport {
    trust: TlsTrust,
    credentials: Option<CredentialStore>,
    anchors: Option<Vec<Certificate<'static>>>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("trust", &self.trust)
            .field("credentials", &self.credentials)
            .field("anchors", &self.anchors.as_ref().map(Vec::len))
            .finish()
    }
}

/// Pick the transport shape for an optional credential store.
pub fn build_transport(credentials: Option<CredentialStore>) -> Transport {
    match credentials {
        Some(store) => Transport {
            trust: TlsTrust::System,
            credentials: Some(store),
            anchors: None,
        },
        None => Transport {
            trust: TlsTrust::Permissive,
            // Always empty on this branch.
            credentials,
            anchors: None,
        },
    }
}

impl Transport {
    pub fn trust(&self) -> TlsTrust {
        self.trust
    }

    pub fn credentials(&self) -> Option<&CredentialStore> {
        self.credentials.as_ref()
    }

    /// Replace the platform roots with the certificates in a PEM bundle.
    ///
    /// Only meaningful for `TlsTrust::System`; a permissive transport keeps
    /// accepting everything.
    pub fn with_trust_anchor_pem(mut self, pem: &[u8]) -> Result<Self, HttpError> {
        let certs = parse_pem(pem)
            .filter_map(|item| match item {
                Ok(PemItem::Certificate(cert)) => Some(Ok(cert)),
                Ok(_) => None,
                Err(e) => Some(Err(HttpError::TransportBuild(e.to_string()))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if certs.is_empty() {
            return Err(HttpError::TransportBuild(
                "trust anchor contains no certificates".to_string(),
            ));
        }
        self.anchors = Some(certs);
        Ok(self)
    }

    pub fn with_trust_anchor_file(self, path: &Path) -> Result<Self, HttpError> {
        let pem = std::fs::read(path).map_err(|e| {
            HttpError::TransportBuild(format!("reading {}: {e}", path.display()))
        })?;
        self.with_trust_anchor_pem(&pem)
    }

    fn tls_config(&self) -> TlsConfig {
        match self.trust {
            TlsTrust::Permissive => TlsConfig::builder().disable_verification(true).build(),
            TlsTrust::System => {
                let roots = match &self.anchors {
                    Some(certs) => RootCerts::new_with_certs(certs),
                    None => RootCerts::PlatformVerifier,
                };
                TlsConfig::builder().root_certs(roots).build()
            }
        }
    }

    /// Agent with this transport's trust and `timeouts` on every phase.
    ///
    /// Status codes never turn into transport errors; the validator decides.
    pub(crate) fn agent(&self, timeouts: &TimeoutPolicy) -> Agent {
        debug!(trust = ?self.trust, authenticated = self.credentials.is_some(), "building agent");
        let socket = Some(timeouts.socket_timeout());
        Agent::config_builder()
            .tls_config(self.tls_config())
            .http_status_as_error(false)
            .timeout_resolve(Some(timeouts.acquisition_timeout()))
            .timeout_connect(Some(timeouts.connect_timeout()))
            .timeout_send_request(socket)
            .timeout_send_body(socket)
            .timeout_recv_response(socket)
            .timeout_recv_body(socket)
            .build()
            .new_agent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_credentials_means_permissive_trust() {
        let transport = build_transport(None);
        assert_eq!(transport.trust(), TlsTrust::Permissive);
        assert!(transport.trust().accepts_self_signed());
        assert!(transport.credentials().is_none());
    }

    #[test]
    fn credentials_mean_system_trust() {
        let transport = build_transport(Some(CredentialStore::basic("user", "pass")));
        assert_eq!(transport.trust(), TlsTrust::System);
        assert!(!transport.trust().accepts_self_signed());
        assert_eq!(
            transport.credentials().map(|s| s.credentials().principal()),
            Some("user")
        );
    }

    #[test]
    fn trust_anchor_without_certificates_fails() {
        let err = build_transport(Some(CredentialStore::basic("u", "p")))
            .with_trust_anchor_pem(b"not a pem bundle")
            .unwrap_err();
        assert!(matches!(err, HttpError::TransportBuild(_)));
    }

    #[test]
    fn missing_trust_anchor_file_fails() {
        let err = build_transport(None)
            .with_trust_anchor_file(Path::new("/definitely/not/here.pem"))
            .unwrap_err();
        assert!(matches!(err, HttpError::TransportBuild(_)));
    }
}
