//! Credentials presented to every host the client talks to.
//!
//! # Design
//! Both schemes reduce to the same opaque `principal:secret` token. For NT
//! credentials the principal may carry a `DOMAIN\user` prefix, which is
//! exposed through `domain()`/`user()` but does not change the token sent on
//! the wire. There is no per-host scoping: a store applies to any host and
//! port.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::HttpError;

/// How the credential token is meant to be interpreted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    UsernamePassword,
    Nt,
}

impl FromStr for CredentialScheme {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" | "username_password" => Ok(CredentialScheme::UsernamePassword),
            "nt" | "ntlm" => Ok(CredentialScheme::Nt),
            other => Err(HttpError::Configuration(format!(
                "{other} was an invalid authentication method"
            ))),
        }
    }
}

/// A single credential: scheme, principal and the colon-joined wire token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    scheme: CredentialScheme,
    principal: String,
    token: String,
}

/// Join `principal` and `secret` into one credential for `scheme`.
pub fn build_credentials(principal: &str, secret: &str, scheme: CredentialScheme) -> Credentials {
    Credentials {
        scheme,
        principal: principal.to_string(),
        token: format!("{principal}:{secret}"),
    }
}

impl Credentials {
    pub fn scheme(&self) -> CredentialScheme {
        self.scheme
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Domain part of a `DOMAIN\user` principal. Always `None` for basic
    /// credentials.
    pub fn domain(&self) -> Option<&str> {
        match self.scheme {
            CredentialScheme::Nt => self.principal().split_once('\\').map(|(d, _)| d),
            CredentialScheme::UsernamePassword => None,
        }
    }

    pub fn user(&self) -> &str {
        match self.scheme {
            CredentialScheme::Nt => self
                .principal()
                .split_once('\\')
                .map_or(self.principal(), |(_, u)| u),
            CredentialScheme::UsernamePassword => self.principal(),
        }
    }

    fn authorization(&self) -> String {
        format!("Basic {}", STANDARD.encode(self.token.as_bytes()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("scheme", &self.scheme)
            .field("principal", &self.principal())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Holder of the credential applied to every request of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    credentials: Credentials,
}

impl CredentialStore {
    pub fn new(principal: &str, secret: &str, scheme: CredentialScheme) -> Self {
        Self {
            credentials: build_credentials(principal, secret, scheme),
        }
    }

    pub fn basic(user: &str, password: &str) -> Self {
        Self::new(user, password, CredentialScheme::UsernamePassword)
    }

    pub fn nt(user: &str, password: &str) -> Self {
        Self::new(user, password, CredentialScheme::Nt)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// `Authorization` header value presented for any host.
    pub(crate) fn authorization_header(&self) -> String {
        self.credentials.authorization()
    }
}
