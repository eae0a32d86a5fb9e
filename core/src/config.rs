//! Layered client configuration: optional TOML file, then environment.
//!
//! Environment keys use the `SIMPLEHTTP` prefix and `__` for nesting, e.g.
//! `SIMPLEHTTP_SOCKET_TIMEOUT_MS=2500` or
//! `SIMPLEHTTP_CREDENTIALS__PRINCIPAL=jdoe`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::credentials::{CredentialScheme, CredentialStore};
use crate::error::HttpError;
use crate::timeouts::TimeoutPolicy;

pub const ENV_PREFIX: &str = "SIMPLEHTTP";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialsConfig {
    pub principal: String,
    pub secret: String,
    /// `basic` or `nt`.
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

fn default_scheme() -> String {
    "basic".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub socket_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub acquisition_timeout_ms: u64,
    pub validate_response: bool,
    pub credentials: Option<CredentialsConfig>,
    pub trust_anchor: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let timeouts = TimeoutPolicy::default_policy();
        Self {
            socket_timeout_ms: timeouts.socket_timeout_ms(),
            connect_timeout_ms: timeouts.connect_timeout_ms(),
            acquisition_timeout_ms: timeouts.acquisition_timeout_ms(),
            validate_response: true,
            credentials: None,
            trust_anchor: None,
        }
    }
}

impl ClientConfig {
    /// Load from `path` (if given and present) overlaid with environment.
    pub fn load(path: Option<&Path>) -> Result<Self, HttpError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "loading client configuration");
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| HttpError::Configuration(e.to_string()))
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::default()
            .with_socket_timeout(self.socket_timeout_ms)
            .with_connect_timeout(self.connect_timeout_ms)
            .with_acquisition_timeout(self.acquisition_timeout_ms)
    }

    /// The configured credential store; fails on an unknown scheme.
    pub fn credential_store(&self) -> Result<Option<CredentialStore>, HttpError> {
        self.credentials
            .as_ref()
            .map(|c| -> Result<CredentialStore, HttpError> {
                let scheme: CredentialScheme = c.scheme.parse()?;
                Ok(CredentialStore::new(&c.principal, &c.secret, scheme))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;

    use super::*;

    fn clear_env() {
        for key in [
            "SIMPLEHTTP_SOCKET_TIMEOUT_MS",
            "SIMPLEHTTP_VALIDATE_RESPONSE",
            "SIMPLEHTTP_CREDENTIALS__PRINCIPAL",
            "SIMPLEHTTP_CREDENTIALS__SECRET",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_sources() {
        clear_env();
        let config = ClientConfig::load(None).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout_policy(), *TimeoutPolicy::default_policy());
        assert!(config.credential_store().unwrap().is_none());
    }

    #[test]
    #[serial]
    fn file_values_are_read() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "socket_timeout_ms = 500\nvalidate_response = false\n\n[credentials]\nprincipal = \"jdoe\"\nsecret = \"pw\"\nscheme = \"nt\""
        )
        .unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.socket_timeout_ms, 500);
        assert_eq!(config.connect_timeout_ms, 10_000);
        assert!(!config.validate_response);
        let store = config.credential_store().unwrap().unwrap();
        assert_eq!(store.credentials().scheme(), CredentialScheme::Nt);
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "socket_timeout_ms = 500").unwrap();
        std::env::set_var("SIMPLEHTTP_SOCKET_TIMEOUT_MS", "750");

        let config = ClientConfig::load(Some(file.path()));
        clear_env();
        assert_eq!(config.unwrap().socket_timeout_ms, 750);
    }

    #[test]
    #[serial]
    fn missing_file_is_not_an_error() {
        clear_env();
        let config = ClientConfig::load(Some(Path::new("/no/such/simplehttp.toml"))).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let config = ClientConfig {
            credentials: Some(CredentialsConfig {
                principal: "u".to_string(),
                secret: "p".to_string(),
                scheme: "digest".to_string(),
            }),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.credential_store(),
            Err(HttpError::Configuration(_))
        ));
    }
}
