//! Per-request network timeouts.
//!
//! Values are plain milliseconds and are passed through to the transport
//! untouched. Zero is accepted and handed to the transport as a zero
//! duration; callers are expected to pick positive values.

use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Socket, connect and connection-acquisition timeouts in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    socket_timeout_ms: u64,
    connect_timeout_ms: u64,
    acquisition_timeout_ms: u64,
}

static DEFAULT_POLICY: TimeoutPolicy = TimeoutPolicy {
    socket_timeout_ms: DEFAULT_TIMEOUT_MS,
    connect_timeout_ms: DEFAULT_TIMEOUT_MS,
    acquisition_timeout_ms: DEFAULT_TIMEOUT_MS,
};

impl TimeoutPolicy {
    /// The shared 10000/10000/10000 ms fallback.
    pub fn default_policy() -> &'static TimeoutPolicy {
        &DEFAULT_POLICY
    }

    #[must_use]
    pub const fn with_socket_timeout(mut self, ms: u64) -> Self {
        self.socket_timeout_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_acquisition_timeout(mut self, ms: u64) -> Self {
        self.acquisition_timeout_ms = ms;
        self
    }

    pub fn socket_timeout_ms(&self) -> u64 {
        self.socket_timeout_ms
    }

    pub fn connect_timeout_ms(&self) -> u64 {
        self.connect_timeout_ms
    }

    pub fn acquisition_timeout_ms(&self) -> u64 {
        self.acquisition_timeout_ms
    }

    /// Bound on every read or write once the connection is up.
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Bound on obtaining a usable connection before the request is written.
    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_millis(self.acquisition_timeout_ms)
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        DEFAULT_POLICY
    }
}
