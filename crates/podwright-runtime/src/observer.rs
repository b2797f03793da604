//! Polling for a container to reach a target state.
//!
//! The observer only reads. It never asks the engine for a transition, so a
//! timed-out wait leaves the container exactly as the engine has it.

use std::time::{Duration, Instant};

use podwright_common::constants::DEFAULT_POLL_INTERVAL_MS;
use podwright_common::error::{PodwrightError, Result};
use podwright_common::types::{ContainerId, ContainerSnapshot, ContainerState};

use crate::session::Session;

/// Blocks until a container reports a given state.
#[derive(Debug, Clone, Copy)]
pub struct StateObserver {
    poll_interval: Duration,
}

impl StateObserver {
    /// Creates an observer that queries the engine every `poll_interval`.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Returns the interval between two queries.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Waits for `id` to report `target`.
    ///
    /// The state is queried at least once, so a zero `timeout` still
    /// succeeds for a container that is already in the target state.
    /// `None`, or a timeout too large to add to the current instant, waits
    /// without a deadline.
    ///
    /// # Errors
    ///
    /// - [`PodwrightError::Wait`] if a query fails or the container settles
    ///   in a terminal state other than `target`.
    /// - [`PodwrightError::Timeout`] if `timeout` elapses first.
    pub fn await_state(
        &self,
        session: &Session,
        id: &ContainerId,
        target: ContainerState,
        timeout: Option<Duration>,
    ) -> Result<ContainerSnapshot> {
        let started = Instant::now();
        let deadline = timeout.and_then(|t| started.checked_add(t));
        let mut polls = 0_u32;

        loop {
            polls += 1;
            let snapshot = session
                .backend()
                .inspect(id)
                .map_err(|e| PodwrightError::Wait {
                    id: id.clone(),
                    target,
                    reason: e.to_string(),
                })?;

            if snapshot.state == target {
                tracing::debug!(id = %id, %target, polls, "target state reached");
                return Ok(snapshot);
            }

            if snapshot.state.is_terminal() {
                let exit = snapshot
                    .exit_code
                    .map_or_else(String::new, |code| format!(" with code {code}"));
                return Err(PodwrightError::Wait {
                    id: id.clone(),
                    target,
                    reason: format!("container is {}{exit}", snapshot.state),
                });
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(PodwrightError::Timeout {
                        id: id.clone(),
                        target,
                        last: snapshot.state,
                        waited: now.duration_since(started),
                    });
                }
                Some(deadline) => self.poll_interval.min(deadline - now),
                None => self.poll_interval,
            };
            tracing::trace!(id = %id, state = %snapshot.state, %target, "waiting");
            std::thread::sleep(pause);
        }
    }
}

impl Default for StateObserver {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ContainerBackend;
    use crate::backend::memory::InMemoryBackend;
    use crate::session::Endpoint;
    use crate::spec::ContainerSpec;

    const IMAGE: &str = "example/base:latest";

    fn started(backend: &InMemoryBackend) -> (Session, ContainerId) {
        let session =
            Session::open(Endpoint::Tcp("memory:0".into()), backend.clone()).expect("open");
        let id = backend
            .create(&ContainerSpec::from_image(IMAGE))
            .expect("create");
        backend.start(&id).expect("start");
        (session, id)
    }

    fn fast() -> StateObserver {
        StateObserver::new(Duration::from_millis(1))
    }

    #[test]
    fn returns_once_target_is_reported() {
        let backend = InMemoryBackend::new()
            .with_local_image(IMAGE)
            .with_startup_polls(3);
        let (session, id) = started(&backend);
        let snap = fast()
            .await_state(&session, &id, ContainerState::Running, Some(Duration::from_secs(5)))
            .expect("running");
        assert_eq!(snap.state, ContainerState::Running);
    }

    #[test]
    fn zero_deadline_times_out_on_pending_container() {
        let backend = InMemoryBackend::new()
            .with_local_image(IMAGE)
            .with_startup_polls(10);
        let (session, id) = started(&backend);
        let err = fast()
            .await_state(&session, &id, ContainerState::Running, Some(Duration::ZERO))
            .expect_err("deadline is zero");
        assert!(matches!(
            err,
            PodwrightError::Timeout {
                last: ContainerState::Created,
                target: ContainerState::Running,
                ..
            }
        ));
    }

    #[test]
    fn zero_deadline_succeeds_when_already_there() {
        let backend = InMemoryBackend::new().with_local_image(IMAGE);
        let (session, id) = started(&backend);
        let snap = fast()
            .await_state(&session, &id, ContainerState::Running, Some(Duration::ZERO))
            .expect("already running");
        assert_eq!(snap.state, ContainerState::Running);
    }

    #[test]
    fn unbounded_timeout_waits_without_deadline() {
        let backend = InMemoryBackend::new()
            .with_local_image(IMAGE)
            .with_startup_polls(3);
        let (session, id) = started(&backend);
        let snap = fast()
            .await_state(&session, &id, ContainerState::Running, Some(Duration::MAX))
            .expect("running");
        assert_eq!(snap.state, ContainerState::Running);

        let snap = fast()
            .await_state(
                &session,
                &id,
                ContainerState::Running,
                Some(Duration::from_secs(u64::MAX)),
            )
            .expect("still running");
        assert_eq!(snap.state, ContainerState::Running);
    }

    #[test]
    fn terminal_mismatch_ends_wait() {
        let backend = InMemoryBackend::new()
            .with_local_image(IMAGE)
            .with_crashing_image(IMAGE);
        let (session, id) = started(&backend);
        let err = fast()
            .await_state(&session, &id, ContainerState::Running, None)
            .expect_err("container exited");
        assert!(matches!(err, PodwrightError::Wait { .. }));
        assert!(err.to_string().contains("exited with code 1"));
    }

    #[test]
    fn unknown_container_fails_wait() {
        let backend = InMemoryBackend::new();
        let session =
            Session::open(Endpoint::Tcp("memory:0".into()), backend).expect("open");
        let err = fast()
            .await_state(
                &session,
                &ContainerId::new("missing"),
                ContainerState::Running,
                Some(Duration::from_secs(1)),
            )
            .expect_err("unknown");
        assert!(matches!(err, PodwrightError::Wait { .. }));
    }

    #[test]
    fn timeout_leaves_state_untouched() {
        let backend = InMemoryBackend::new()
            .with_local_image(IMAGE)
            .with_startup_polls(1000);
        let (session, id) = started(&backend);
        let _ = fast()
            .await_state(&session, &id, ContainerState::Running, Some(Duration::from_millis(5)))
            .expect_err("too slow");
        // Still pending startup: neither stopped nor removed.
        assert_eq!(backend.container_count(), 1);
        assert_eq!(
            backend.inspect(&id).expect("inspect").state,
            ContainerState::Created
        );
    }
}
