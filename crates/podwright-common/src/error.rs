//! Unified error types for the Podwright workspace.
//!
//! [`RemoteError`] classifies what the engine (or the transport in front of
//! it) reported for a single call. [`PodwrightError`] names the lifecycle
//! stage that failed and carries the remote cause as its source.

use std::time::Duration;

use thiserror::Error;

use crate::types::{ContainerId, ContainerState};

/// Failure reported by the remote service for a single API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The addressed resource does not exist on the service.
    #[error("not found: {message}")]
    NotFound {
        /// Message returned by the service.
        message: String,
    },

    /// The request had no effect because the resource was already in the
    /// requested condition.
    #[error("not modified")]
    NotModified,

    /// The request conflicts with the resource's current state.
    #[error("conflict: {message}")]
    Conflict {
        /// Message returned by the service.
        message: String,
    },

    /// The service answered with an error status.
    #[error("service error ({status}): {message}")]
    Server {
        /// HTTP status code of the response.
        status: u16,
        /// Message returned by the service.
        message: String,
    },

    /// The endpoint cannot express this request.
    #[error("unsupported by this endpoint: {message}")]
    Unsupported {
        /// What was requested.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },
}

impl RemoteError {
    /// Classifies an HTTP status code and message into a remote error.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            304 => Self::NotModified,
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            _ => Self::Server { status, message },
        }
    }

    /// Returns `true` if the service reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum PodwrightError {
    /// The transport endpoint is malformed, absent, or not answering.
    #[error("cannot connect to {endpoint}: {message}")]
    Connection {
        /// Endpoint URI that was dialed.
        endpoint: String,
        /// Description of the connection failure.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The source image could not be made available.
    #[error("failed to pull image {reference}: {source}")]
    ImagePull {
        /// Image reference that was requested.
        reference: String,
        /// Underlying remote failure.
        source: RemoteError,
    },

    /// The service refused to create the container.
    #[error("failed to create container from {origin}: {source}")]
    Creation {
        /// Image reference or rootfs path the container was created from.
        origin: String,
        /// Underlying remote failure.
        source: RemoteError,
    },

    /// No container with this identity exists on the service.
    #[error("container {id} does not exist")]
    UnknownContainer {
        /// Identity that was addressed.
        id: ContainerId,
    },

    /// The container could not be started.
    #[error("failed to start container {id}: {source}")]
    Start {
        /// Container that failed to start.
        id: ContainerId,
        /// Underlying remote failure.
        source: RemoteError,
    },

    /// The container could not be stopped.
    #[error("failed to stop container {id}: {source}")]
    Stop {
        /// Container that failed to stop.
        id: ContainerId,
        /// Underlying remote failure.
        source: RemoteError,
    },

    /// The container could not be inspected.
    #[error("failed to inspect container {id}: {source}")]
    Inspect {
        /// Container that failed inspection.
        id: ContainerId,
        /// Underlying remote failure.
        source: RemoteError,
    },

    /// Waiting ended because the service reported a failure or a terminal
    /// state other than the target.
    #[error("wait for container {id} to become {target} failed: {reason}")]
    Wait {
        /// Container being observed.
        id: ContainerId,
        /// State that was awaited.
        target: ContainerState,
        /// Why the wait ended.
        reason: String,
    },

    /// The target state was not observed before the deadline.
    #[error("container {id} did not become {target} within {waited:?} (last seen {last})")]
    Timeout {
        /// Container being observed.
        id: ContainerId,
        /// State that was awaited.
        target: ContainerState,
        /// State reported by the last successful query.
        last: ContainerState,
        /// Time spent waiting.
        waited: Duration,
    },

    /// A listing call failed.
    #[error("failed to list {kind}: {source}")]
    List {
        /// Resource kind being listed.
        kind: &'static str,
        /// Underlying remote failure.
        source: RemoteError,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PodwrightError>;
