//! Client configuration model.
//!
//! The only environment-derived input is the runtime directory root, from
//! which the engine socket location is computed. Everything else has a
//! built-in default that the CLI may override.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Root configuration for a Podwright client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Runtime directory root holding the engine socket.
    pub runtime_dir: PathBuf,
    /// Explicit endpoint URI, taking precedence over `runtime_dir`.
    pub socket: Option<String>,
    /// Seconds allowed for a single transport round trip.
    pub request_timeout_secs: u64,
    /// Milliseconds between state queries while waiting.
    pub poll_interval_ms: u64,
    /// Default seconds to wait for a target state.
    pub wait_timeout_secs: u64,
    /// Default stop grace period in seconds.
    pub stop_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            runtime_dir: PathBuf::from(constants::SYSTEM_RUNTIME_DIR),
            socket: None,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            wait_timeout_secs: constants::DEFAULT_WAIT_TIMEOUT_SECS,
            stop_timeout_secs: constants::DEFAULT_STOP_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from the process environment.
    ///
    /// Reads `XDG_RUNTIME_DIR` for the runtime directory and
    /// `PODWRIGHT_SOCKET` for an explicit endpoint. An unset or empty
    /// runtime directory falls back to the rootful `/run`.
    #[must_use]
    pub fn from_env() -> Self {
        let runtime_dir = std::env::var_os(constants::RUNTIME_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map_or_else(
                || PathBuf::from(constants::SYSTEM_RUNTIME_DIR),
                PathBuf::from,
            );
        let socket = std::env::var(constants::SOCKET_ENV)
            .ok()
            .filter(|v| !v.is_empty());
        Self {
            runtime_dir,
            socket,
            ..Self::default()
        }
    }

    /// Returns the endpoint URI this configuration points at.
    #[must_use]
    pub fn endpoint_uri(&self) -> String {
        self.socket
            .clone()
            .unwrap_or_else(|| constants::podman_socket_uri(&self.runtime_dir))
    }

    /// Returns the poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the default wait timeout as a [`Duration`].
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Returns the default stop grace period as a [`Duration`].
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}
