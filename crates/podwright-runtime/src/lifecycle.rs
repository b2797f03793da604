//! Lifecycle controller for containers driven through a session.
//!
//! Every method is one remote call (or one wait) and returns the engine's
//! verdict as a stage-specific error. Nothing is retried and nothing is
//! rolled back: a container whose start failed stays created until the
//! caller removes it.

use std::time::Duration;

use podwright_common::config::ClientConfig;
use podwright_common::error::{PodwrightError, RemoteError, Result};
use podwright_common::types::{ContainerId, ContainerSnapshot, ContainerState, ContainerSummary};

use crate::observer::StateObserver;
use crate::session::Session;
use crate::spec::ContainerSpec;

/// Drives create, start, wait, inspect, and stop against one session.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleController<'s> {
    session: &'s Session,
    observer: StateObserver,
    stop_timeout: Duration,
}

impl<'s> LifecycleController<'s> {
    /// Creates a controller with default poll interval and stop timeout.
    #[must_use]
    pub fn new(session: &'s Session) -> Self {
        Self::with_config(session, &ClientConfig::default())
    }

    /// Creates a controller using the poll interval and stop timeout from
    /// `config`.
    #[must_use]
    pub fn with_config(session: &'s Session, config: &ClientConfig) -> Self {
        Self {
            session,
            observer: StateObserver::new(config.poll_interval()),
            stop_timeout: config.stop_timeout(),
        }
    }

    /// Returns the session calls go through.
    #[must_use]
    pub const fn session(&self) -> &'s Session {
        self.session
    }

    /// Creates a container from `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::Creation`] if the engine rejects the spec;
    /// no identity is allocated in that case.
    pub fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let origin = spec.strategy.origin();
        let id = self
            .session
            .backend()
            .create(spec)
            .map_err(|source| PodwrightError::Creation {
                origin: origin.clone(),
                source,
            })?;
        tracing::info!(id = %id, origin = %origin, terminal = spec.terminal, "container created");
        Ok(id)
    }

    /// Starts a created or stopped container.
    ///
    /// A container the engine already reports as started is accepted
    /// as-is; whether that had side effects is up to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::UnknownContainer`] if `id` was never
    /// created (or has been removed), or [`PodwrightError::Start`] for any
    /// other failure.
    pub fn start(&self, id: &ContainerId) -> Result<()> {
        match self.session.backend().start(id) {
            Ok(()) => {
                tracing::info!(id = %id, "container started");
                Ok(())
            }
            Err(RemoteError::NotModified) => {
                tracing::info!(id = %id, "container was already started");
                Ok(())
            }
            Err(RemoteError::NotFound { .. }) => {
                Err(PodwrightError::UnknownContainer { id: id.clone() })
            }
            Err(source) => Err(PodwrightError::Start {
                id: id.clone(),
                source,
            }),
        }
    }

    /// Blocks until `id` reports `target` or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// See [`StateObserver::await_state`].
    pub fn await_state(
        &self,
        id: &ContainerId,
        target: ContainerState,
        timeout: Option<Duration>,
    ) -> Result<ContainerSnapshot> {
        self.observer
            .await_state(self.session, id, target, timeout)
    }

    /// Returns a fresh snapshot of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::Inspect`] if the container is unknown or
    /// the engine cannot answer.
    pub fn inspect(&self, id: &ContainerId) -> Result<ContainerSnapshot> {
        self.session
            .backend()
            .inspect(id)
            .map_err(|source| PodwrightError::Inspect {
                id: id.clone(),
                source,
            })
    }

    /// Stops `id`, letting the engine kill it after `timeout` (or the
    /// configured default).
    ///
    /// A container the engine reports as already stopped is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::UnknownContainer`] if `id` does not exist,
    /// or [`PodwrightError::Stop`] for any other failure.
    pub fn stop(&self, id: &ContainerId, timeout: Option<Duration>) -> Result<()> {
        let grace = timeout.unwrap_or(self.stop_timeout);
        match self.session.backend().stop(id, grace) {
            Ok(()) => {
                tracing::info!(id = %id, grace_secs = grace.as_secs(), "container stopped");
                Ok(())
            }
            Err(RemoteError::NotModified) => {
                tracing::info!(id = %id, "container was already stopped");
                Ok(())
            }
            Err(RemoteError::NotFound { .. }) => {
                Err(PodwrightError::UnknownContainer { id: id.clone() })
            }
            Err(source) => Err(PodwrightError::Stop {
                id: id.clone(),
                source,
            }),
        }
    }

    /// Lists containers, newest first. `limit` implies `all`.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::List`] if the engine cannot answer.
    pub fn list(&self, all: bool, limit: Option<usize>) -> Result<Vec<ContainerSummary>> {
        self.session
            .backend()
            .list_containers(all, limit)
            .map_err(|source| PodwrightError::List {
                kind: "containers",
                source,
            })
    }

    /// Returns the most recently created container, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PodwrightError::List`] if the engine cannot answer.
    pub fn latest(&self) -> Result<Option<ContainerSummary>> {
        Ok(self.list(true, Some(1))?.into_iter().next())
    }
}
