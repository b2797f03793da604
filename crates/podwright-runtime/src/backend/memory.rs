//! In-process stand-in for the container engine.
//!
//! Keeps images and containers in memory and mimics the engine's
//! verdicts: 404 for unknown identities, 304 for no-op start and stop.
//! Started containers pass through a configurable number of
//! `created` inspections before reporting `running`, which exercises the
//! state observer's polling. Clones share state, so a test can keep a
//! handle after moving one into a [`Session`](crate::session::Session).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use podwright_common::error::RemoteError;
use podwright_common::types::{
    ContainerId, ContainerSnapshot, ContainerState, ContainerSummary, ImageRef, ImageSummary,
};

use super::{ContainerBackend, RemoteResult};
use crate::spec::ContainerSpec;

#[derive(Debug)]
struct Record {
    id: ContainerId,
    name: String,
    origin: String,
    state: ContainerState,
    pending_polls: u32,
    crashes: bool,
    exit_code: Option<i64>,
    created: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    reachable: bool,
    registry_reachable: bool,
    open_registry: bool,
    startup_polls: u32,
    upstream: HashSet<String>,
    crashing: HashSet<String>,
    images: HashMap<String, ImageSummary>,
    containers: HashMap<ContainerId, Record>,
    pings: usize,
    pulls: usize,
    next_seq: u64,
    next_image: u64,
}

/// In-memory engine implementing [`ContainerBackend`].
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryBackend {
    /// Creates a reachable engine with an empty store and an upstream
    /// registry that serves no images.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                reachable: true,
                registry_reachable: true,
                ..MemoryState::default()
            })),
        }
    }

    /// Makes an image pullable from the upstream registry.
    #[must_use]
    pub fn with_upstream_image(self, reference: &str) -> Self {
        let _ = self.lock().upstream.insert(normalize(reference));
        self
    }

    /// Stores an image locally as if it had been pulled earlier.
    #[must_use]
    pub fn with_local_image(self, reference: &str) -> Self {
        self.lock().store_image(&normalize(reference));
        self
    }

    /// Makes containers created from this image exit right after start.
    #[must_use]
    pub fn with_crashing_image(self, reference: &str) -> Self {
        let _ = self.lock().crashing.insert(normalize(reference));
        self
    }

    /// Sets how many inspections a started container reports `created`
    /// before it reports `running`.
    #[must_use]
    pub fn with_startup_polls(self, polls: u32) -> Self {
        self.lock().startup_polls = polls;
        self
    }

    /// Makes every reference pullable from the upstream registry.
    #[must_use]
    pub fn with_open_registry(self) -> Self {
        self.lock().open_registry = true;
        self
    }

    /// Makes every call fail with a transport error.
    #[must_use]
    pub fn unreachable(self) -> Self {
        self.lock().reachable = false;
        self
    }

    /// Makes pulls of images not stored locally fail with a transport
    /// error from the registry.
    #[must_use]
    pub fn with_unreachable_registry(self) -> Self {
        self.lock().registry_reachable = false;
        self
    }

    /// Returns how many pings the engine has answered.
    #[must_use]
    pub fn ping_count(&self) -> usize {
        self.lock().pings
    }

    /// Returns how many pulls actually fetched an image.
    #[must_use]
    pub fn pull_count(&self) -> usize {
        self.lock().pulls
    }

    /// Returns how many containers exist.
    #[must_use]
    pub fn container_count(&self) -> usize {
        self.lock().containers.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(&self) -> RemoteResult<MutexGuard<'_, MemoryState>> {
        let guard = self.lock();
        if guard.reachable {
            Ok(guard)
        } else {
            Err(RemoteError::Transport {
                message: "connection refused".into(),
            })
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn store_image(&mut self, reference: &str) {
        if self.images.contains_key(reference) {
            return;
        }
        self.next_image += 1;
        let id = format!("sha256:{:064x}", self.next_image);
        let _ = self.images.insert(
            reference.to_string(),
            ImageSummary {
                id,
                repo_tags: vec![reference.to_string()],
                size_bytes: 0,
            },
        );
    }

    fn record(&mut self, id: &ContainerId) -> RemoteResult<&mut Record> {
        self.containers
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound {
                message: format!("no such container: {id}"),
            })
    }
}

fn normalize(reference: &str) -> String {
    ImageRef::new(reference).normalized()
}

fn not_found(message: String) -> RemoteError {
    RemoteError::NotFound { message }
}

impl ContainerBackend for InMemoryBackend {
    fn ping(&self) -> RemoteResult<()> {
        self.checked()?.pings += 1;
        Ok(())
    }

    fn image_exists(&self, reference: &ImageRef) -> RemoteResult<bool> {
        Ok(self
            .checked()?
            .images
            .contains_key(&reference.normalized()))
    }

    fn pull_image(&self, reference: &ImageRef, _platform: Option<&str>) -> RemoteResult<()> {
        let mut state = self.checked()?;
        let key = reference.normalized();
        if !state.registry_reachable {
            return Err(RemoteError::Transport {
                message: "registry unreachable".into(),
            });
        }
        if !state.open_registry && !state.upstream.contains(&key) {
            return Err(not_found(format!("{reference}: manifest unknown")));
        }
        state.store_image(&key);
        state.pulls += 1;
        Ok(())
    }

    fn list_images(&self) -> RemoteResult<Vec<ImageSummary>> {
        let state = self.checked()?;
        let mut images: Vec<_> = state.images.values().cloned().collect();
        images.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(images)
    }

    fn create(&self, spec: &ContainerSpec) -> RemoteResult<ContainerId> {
        let mut state = self.checked()?;
        let crashes = match spec.image() {
            Some(image) => {
                let key = image.normalized();
                if !state.images.contains_key(&key) {
                    return Err(not_found(format!("{image}: image not known")));
                }
                state.crashing.contains(&key)
            }
            None => false,
        };
        if let Some(name) = &spec.name {
            if state.containers.values().any(|r| &r.name == name) {
                return Err(RemoteError::Conflict {
                    message: format!("name {name} is already in use"),
                });
            }
        }

        let id = ContainerId::generate();
        let seq = state.next_seq;
        state.next_seq += 1;
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("unit_{}", id.short()));
        let _ = state.containers.insert(
            id.clone(),
            Record {
                id: id.clone(),
                name,
                origin: spec.strategy.origin(),
                state: ContainerState::Created,
                pending_polls: 0,
                crashes,
                exit_code: None,
                created: Utc::now(),
                seq,
            },
        );
        Ok(id)
    }

    fn start(&self, id: &ContainerId) -> RemoteResult<()> {
        let mut state = self.checked()?;
        let startup_polls = state.startup_polls;
        let record = state.record(id)?;
        let current = record.state;
        match current {
            ContainerState::Running => Err(RemoteError::NotModified),
            ContainerState::Paused => Err(RemoteError::Conflict {
                message: format!("container {id} is paused"),
            }),
            _ if record.crashes => {
                record.state = ContainerState::Exited;
                record.exit_code = Some(1);
                Ok(())
            }
            _ => {
                record.state = ContainerState::Running;
                record.pending_polls = startup_polls;
                record.exit_code = None;
                Ok(())
            }
        }
    }

    fn inspect(&self, id: &ContainerId) -> RemoteResult<ContainerSnapshot> {
        let mut state = self.checked()?;
        let record = state.record(id)?;
        // A started container reports `created` until its startup polls run out.
        let reported = if record.state == ContainerState::Running && record.pending_polls > 0 {
            record.pending_polls -= 1;
            ContainerState::Created
        } else {
            record.state
        };
        Ok(ContainerSnapshot {
            id: record.id.clone(),
            name: record.name.clone(),
            image_name: record.origin.clone(),
            state: reported,
            status: reported.to_string(),
            exit_code: record.exit_code,
            created: Some(record.created),
        })
    }

    fn stop(&self, id: &ContainerId, _timeout: Duration) -> RemoteResult<()> {
        let mut state = self.checked()?;
        let record = state.record(id)?;
        let current = record.state;
        match current {
            ContainerState::Running | ContainerState::Paused => {
                record.state = ContainerState::Exited;
                record.pending_polls = 0;
                record.exit_code = Some(0);
                Ok(())
            }
            _ => Err(RemoteError::NotModified),
        }
    }

    fn list_containers(
        &self,
        all: bool,
        limit: Option<usize>,
    ) -> RemoteResult<Vec<ContainerSummary>> {
        let state = self.checked()?;
        let mut records: Vec<&Record> = state
            .containers
            .values()
            .filter(|r| all || limit.is_some() || r.state == ContainerState::Running)
            .collect();
        records.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(records
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|r| ContainerSummary {
                id: r.id.clone(),
                names: vec![r.name.clone()],
                image: r.origin.clone(),
                state: r.state,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: &str = "example/base:latest";

    #[test]
    fn pull_stores_upstream_image() {
        let backend = InMemoryBackend::new().with_upstream_image(IMAGE);
        let image = ImageRef::new(IMAGE);
        assert!(!backend.image_exists(&image).expect("exists"));
        backend.pull_image(&image, None).expect("pull");
        assert!(backend.image_exists(&image).expect("exists"));
        assert_eq!(backend.pull_count(), 1);
    }

    #[test]
    fn open_registry_serves_any_reference() {
        let backend = InMemoryBackend::new().with_open_registry();
        backend
            .pull_image(&ImageRef::new("quay.io/any/thing:v1"), None)
            .expect("pull");
        assert_eq!(backend.list_images().expect("list").len(), 1);
    }

    #[test]
    fn repull_keeps_image_id_unique() {
        let backend = InMemoryBackend::new().with_open_registry();
        let first = ImageRef::new(IMAGE);
        backend.pull_image(&first, None).expect("first pull");
        backend.pull_image(&first, None).expect("repull");
        backend
            .pull_image(&ImageRef::new("example/other:1"), None)
            .expect("second image");

        let images = backend.list_images().expect("list");
        assert_eq!(images.len(), 2);
        assert_ne!(images[0].id, images[1].id);
        assert_eq!(backend.pull_count(), 3);
    }

    #[test]
    fn untagged_reference_matches_latest() {
        let backend = InMemoryBackend::new().with_local_image("example/base");
        assert!(
            backend
                .image_exists(&ImageRef::new(IMAGE))
                .expect("exists")
        );
    }

    #[test]
    fn pull_of_unknown_image_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend
            .pull_image(&ImageRef::new("missing/image"), None)
            .expect_err("unknown upstream");
        assert!(err.is_not_found());
    }

    #[test]
    fn create_requires_local_image() {
        let backend = InMemoryBackend::new();
        let err = backend
            .create(&ContainerSpec::from_image(IMAGE))
            .expect_err("image missing");
        assert!(err.is_not_found());
        assert_eq!(backend.container_count(), 0);
    }

    #[test]
    fn duplicate_name_conflicts() {
        let backend = InMemoryBackend::new().with_local_image(IMAGE);
        let spec = ContainerSpec::from_image(IMAGE).name("one");
        let _ = backend.create(&spec).expect("first");
        assert!(matches!(
            backend.create(&spec),
            Err(RemoteError::Conflict { .. })
        ));
    }

    #[test]
    fn started_container_reports_created_during_startup() {
        let backend = InMemoryBackend::new()
            .with_local_image(IMAGE)
            .with_startup_polls(2);
        let id = backend.create(&ContainerSpec::from_image(IMAGE)).expect("create");
        backend.start(&id).expect("start");
        assert_eq!(backend.inspect(&id).expect("1").state, ContainerState::Created);
        assert_eq!(backend.inspect(&id).expect("2").state, ContainerState::Created);
        assert_eq!(backend.inspect(&id).expect("3").state, ContainerState::Running);
    }

    #[test]
    fn second_start_and_stop_are_not_modified() {
        let backend = InMemoryBackend::new().with_local_image(IMAGE);
        let id = backend.create(&ContainerSpec::from_image(IMAGE)).expect("create");
        backend.start(&id).expect("start");
        assert_eq!(backend.start(&id), Err(RemoteError::NotModified));
        backend.stop(&id, Duration::ZERO).expect("stop");
        assert_eq!(
            backend.stop(&id, Duration::ZERO),
            Err(RemoteError::NotModified)
        );
    }

    #[test]
    fn listing_is_newest_first() {
        let backend = InMemoryBackend::new().with_local_image(IMAGE);
        let first = backend
            .create(&ContainerSpec::from_image(IMAGE).name("first"))
            .expect("first");
        let second = backend
            .create(&ContainerSpec::from_image(IMAGE).name("second"))
            .expect("second");
        let all = backend.list_containers(true, None).expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second);
        assert_eq!(all[1].id, first);

        let latest = backend.list_containers(false, Some(1)).expect("latest");
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].names, vec!["second"]);

        assert!(backend.list_containers(false, None).expect("running").is_empty());
    }

    #[test]
    fn unreachable_engine_fails_every_call() {
        let backend = InMemoryBackend::new().unreachable();
        assert!(matches!(backend.ping(), Err(RemoteError::Transport { .. })));
        assert!(backend.list_images().is_err());
    }
}
