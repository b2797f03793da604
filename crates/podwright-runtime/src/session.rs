//! Transport endpoints and the connection-owning session.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use podwright_common::config::ClientConfig;
use podwright_common::constants::{HTTP_SCHEME, TCP_SCHEME, UNIX_SCHEME};
use podwright_common::error::{PodwrightError, Result};

use crate::backend::ContainerBackend;
use crate::backend::podman::PodmanBackend;

/// Parsed transport endpoint URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Unix domain socket at an absolute path.
    Unix(PathBuf),
    /// TCP `host:port` address.
    Tcp(String),
}

impl Endpoint {
    /// Parses `unix:///path`, `tcp://host:port`, or `http://host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::Connection`] if the scheme is unknown or
    /// the remainder is empty or malformed.
    pub fn parse(uri: &str) -> Result<Self> {
        let malformed = |message: &str| PodwrightError::Connection {
            endpoint: uri.to_string(),
            message: message.to_string(),
        };

        if let Some(path) = uri.strip_prefix(UNIX_SCHEME) {
            if !path.starts_with('/') {
                return Err(malformed("unix socket path must be absolute"));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        let addr = uri
            .strip_prefix(TCP_SCHEME)
            .or_else(|| uri.strip_prefix(HTTP_SCHEME))
            .ok_or_else(|| malformed("expected a unix://, tcp:// or http:// URI"))?;
        let addr = addr.trim_end_matches('/');
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Self::Tcp(addr.to_string()))
            }
            _ => Err(malformed("expected host:port")),
        }
    }
}

impl FromStr for Endpoint {
    type Err = PodwrightError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "{UNIX_SCHEME}{}", path.display()),
            Self::Tcp(addr) => write!(f, "{TCP_SCHEME}{addr}"),
        }
    }
}

/// A live, reusable connection to the container engine.
///
/// Every remote call made by the image resolver and the lifecycle
/// controller goes through the one backend owned here. The backend is
/// `Send + Sync`, so a session may be shared by reference between
/// threads driving independent containers.
pub struct Session {
    endpoint: Endpoint,
    backend: Box<dyn ContainerBackend>,
}

impl Session {
    /// Connects to the engine at `uri` and verifies it answers.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::Connection`] if the URI is malformed, the
    /// socket does not exist, or the engine does not answer a ping.
    pub fn establish(uri: &str, config: &ClientConfig) -> Result<Self> {
        let endpoint = Endpoint::parse(uri)?;
        if let Endpoint::Unix(path) = &endpoint {
            if !path.exists() {
                return Err(PodwrightError::Connection {
                    endpoint: endpoint.to_string(),
                    message: format!("socket {} does not exist", path.display()),
                });
            }
        }

        let backend =
            PodmanBackend::connect(&endpoint, config.request_timeout_secs).map_err(|e| {
                PodwrightError::Connection {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
            })?;
        Self::open(endpoint, backend)
    }

    /// Wraps an already constructed backend and verifies it answers.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::Connection`] if the backend's ping fails.
    pub fn open(endpoint: Endpoint, backend: impl ContainerBackend + 'static) -> Result<Self> {
        backend.ping().map_err(|e| PodwrightError::Connection {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(endpoint = %endpoint, "session established");
        Ok(Self {
            endpoint,
            backend: Box::new(backend),
        })
    }

    /// Returns the endpoint this session is connected to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the backend every remote call goes through.
    #[must_use]
    pub fn backend(&self) -> &dyn ContainerBackend {
        self.backend.as_ref()
    }

    /// Releases the connection.
    pub fn close(self) {
        tracing::info!(endpoint = %self.endpoint, "session closed");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
