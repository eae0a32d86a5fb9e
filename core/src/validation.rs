//! Status-code gate and entity consumption.
//!
//! The gate runs on the response head, before the body is read. A policy is
//! a plain value handed to each call, so suspending it for one caller never
//! changes what another caller observes.

use std::io::Read;

use tracing::warn;

use crate::error::HttpError;

/// Whether status codes >= 400 fail the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    #[default]
    Enforce,
    Suspended,
}

impl Validation {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Validation::Enforce
        } else {
            Validation::Suspended
        }
    }

    pub fn is_enforced(&self) -> bool {
        matches!(self, Validation::Enforce)
    }
}

/// Fail with `Validation` when enforced and `status >= 400`.
pub fn validate(
    validation: Validation,
    status: u16,
    status_line: &str,
    url: &str,
) -> Result<(), HttpError> {
    if validation.is_enforced() && status >= 400 {
        return Err(HttpError::Validation {
            status,
            status_line: status_line.to_string(),
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Read the whole entity as UTF-8.
///
/// A read failure whose message mentions "Unauthorized" becomes
/// `HttpError::Unauthorized`; any other failure is logged and yields `None`.
pub fn consume(mut entity: impl Read, url: &str) -> Result<Option<String>, HttpError> {
    let mut text = String::new();
    match entity.read_to_string(&mut text) {
        Ok(_) => Ok(Some(text)),
        Err(e) if e.to_string().contains("Unauthorized") => {
            Err(HttpError::Unauthorized(e.to_string()))
        }
        Err(e) => {
            warn!(%url, error = %e, "could not read response body");
            Ok(None)
        }
    }
}
