//! Engine backend abstraction.
//!
//! A backend is the capability set a session needs from the remote
//! service: one method per API call, each returning the engine's verdict
//! as a [`RemoteError`]. Mapping those verdicts onto lifecycle errors is
//! left to the callers in [`crate::image`] and [`crate::lifecycle`].

pub mod memory;
pub mod podman;

use std::time::Duration;

use podwright_common::error::RemoteError;
use podwright_common::types::{
    ContainerId, ContainerSnapshot, ContainerSummary, ImageRef, ImageSummary,
};

use crate::spec::ContainerSpec;

/// Result of a single backend call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Remote container engine API as seen by a session.
///
/// Implementors must be safe to call from several threads at once; the
/// engine, not the client, serializes conflicting operations.
pub trait ContainerBackend: Send + Sync {
    /// Checks that the engine answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be reached.
    fn ping(&self) -> RemoteResult<()>;

    /// Returns whether the image is already stored by the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot answer the query.
    fn image_exists(&self, reference: &ImageRef) -> RemoteResult<bool>;

    /// Pulls an image, blocking until the pull completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be fetched.
    fn pull_image(&self, reference: &ImageRef, platform: Option<&str>) -> RemoteResult<()>;

    /// Lists images stored by the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot answer the query.
    fn list_images(&self) -> RemoteResult<Vec<ImageSummary>>;

    /// Creates a container and returns the identity the engine assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the spec.
    fn create(&self, spec: &ContainerSpec) -> RemoteResult<ContainerId>;

    /// Starts a created or stopped container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is unknown or cannot start.
    fn start(&self, id: &ContainerId) -> RemoteResult<()>;

    /// Returns a fresh snapshot of the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is unknown.
    fn inspect(&self, id: &ContainerId) -> RemoteResult<ContainerSnapshot>;

    /// Stops a running container, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotModified`] if it was not running, or
    /// another error if the stop fails.
    fn stop(&self, id: &ContainerId, timeout: Duration) -> RemoteResult<()>;

    /// Lists containers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot answer the query.
    fn list_containers(&self, all: bool, limit: Option<usize>)
    -> RemoteResult<Vec<ContainerSummary>>;
}
