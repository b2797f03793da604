//! End-to-end workflow tests against the in-memory engine.
//!
//! These walk the full pipeline the way a caller drives it:
//! 1. Establish a session
//! 2. Ensure the image is present
//! 3. Build a spec and create the container
//! 4. Start it and wait for `running`
//! 5. Inspect, stop, and inspect again

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use podwright_common::config::ClientConfig;
use podwright_common::error::PodwrightError;
use podwright_common::types::{ContainerId, ContainerState, ImageRef};
use podwright_runtime::backend::memory::InMemoryBackend;
use podwright_runtime::image::{self, PullOptions, PullOutcome};
use podwright_runtime::lifecycle::LifecycleController;
use podwright_runtime::session::{Endpoint, Session};
use podwright_runtime::spec::ContainerSpec;

const IMAGE: &str = "example/base:latest";

fn endpoint() -> Endpoint {
    Endpoint::parse("unix:///run/user/1000/podman/podman.sock").expect("endpoint")
}

fn config() -> ClientConfig {
    ClientConfig {
        poll_interval_ms: 1,
        ..ClientConfig::default()
    }
}

// ── Full Workflow ────────────────────────────────────────────────────

#[test]
fn workflow_pull_create_start_wait_inspect_stop() {
    let backend = InMemoryBackend::new()
        .with_upstream_image(IMAGE)
        .with_startup_polls(3);
    let session = Session::open(endpoint(), backend.clone()).expect("establish");
    let cfg = config();

    let image = ImageRef::new(IMAGE);
    let outcome = image::ensure_image(&session, &image, &PullOptions::default()).expect("pull");
    assert_eq!(outcome, PullOutcome::Pulled);

    let mut spec = ContainerSpec::from_image(image.clone());
    spec.terminal = true;

    let lifecycle = LifecycleController::with_config(&session, &cfg);
    let id = lifecycle.create(&spec).expect("create");
    lifecycle.start(&id).expect("start");

    let running = lifecycle
        .await_state(&id, ContainerState::Running, Some(Duration::from_secs(5)))
        .expect("reaches running");
    assert_eq!(running.state, ContainerState::Running);

    let snap = lifecycle.inspect(&id).expect("inspect");
    assert_eq!(snap.image_name, IMAGE);
    assert_eq!(snap.state, ContainerState::Running);
    assert_eq!(snap.status, "running");

    lifecycle.stop(&id, None).expect("stop");
    let after = lifecycle.inspect(&id).expect("inspect after stop");
    assert_eq!(after.state, ContainerState::Exited);
    assert_ne!(after.state, snap.state);

    assert_eq!(backend.ping_count(), 1, "session must not reconnect");
    session.close();
}

#[test]
fn workflow_lists_pulled_image_tags() {
    let backend = InMemoryBackend::new().with_upstream_image(IMAGE);
    let session = Session::open(endpoint(), backend).expect("establish");
    let _ = image::ensure_image(&session, &ImageRef::new(IMAGE), &PullOptions::default())
        .expect("pull");

    let images = image::list_images(&session).expect("list");
    assert_eq!(image::repo_tags(&images), vec![IMAGE.to_string()]);
}

#[test]
fn workflow_latest_container_is_the_one_just_created() {
    let backend = InMemoryBackend::new().with_local_image(IMAGE);
    let session = Session::open(endpoint(), backend).expect("establish");
    let lifecycle = LifecycleController::with_config(&session, &config());

    let _ = lifecycle
        .create(&ContainerSpec::from_image(IMAGE).name("first"))
        .expect("first");
    let id = lifecycle
        .create(&ContainerSpec::from_image(IMAGE).name("second"))
        .expect("second");

    let latest = lifecycle.latest().expect("list").expect("some container");
    assert_eq!(latest.id, id);
    assert_eq!(latest.names.first().map(String::as_str), Some("second"));
}

// ── Failure Propagation ──────────────────────────────────────────────

#[test]
fn workflow_aborts_at_pull_for_unknown_image() {
    let backend = InMemoryBackend::new();
    let session = Session::open(endpoint(), backend.clone()).expect("establish");

    let err = image::ensure_image(
        &session,
        &ImageRef::new("example/missing:1"),
        &PullOptions::default(),
    )
    .expect_err("not upstream");
    assert!(matches!(err, PodwrightError::ImagePull { .. }));
    assert_eq!(backend.container_count(), 0);
}

#[test]
fn workflow_wait_fails_when_container_exits_instead_of_running() {
    let backend = InMemoryBackend::new()
        .with_upstream_image(IMAGE)
        .with_crashing_image(IMAGE);
    let session = Session::open(endpoint(), backend.clone()).expect("establish");
    let lifecycle = LifecycleController::with_config(&session, &config());

    let _ = image::ensure_image(&session, &ImageRef::new(IMAGE), &PullOptions::default())
        .expect("pull");
    let id = lifecycle
        .create(&ContainerSpec::from_image(IMAGE).terminal(true))
        .expect("create");
    lifecycle.start(&id).expect("start");

    let err = lifecycle
        .await_state(&id, ContainerState::Running, Some(Duration::from_secs(5)))
        .expect_err("exits");
    assert!(matches!(err, PodwrightError::Wait { .. }));

    // No rollback: the exited container is still there for the caller.
    assert_eq!(backend.container_count(), 1);
    assert_eq!(
        lifecycle.inspect(&id).expect("inspect").state,
        ContainerState::Exited
    );
}

#[test]
fn workflow_zero_deadline_times_out_before_running() {
    let backend = InMemoryBackend::new()
        .with_local_image(IMAGE)
        .with_startup_polls(50);
    let session = Session::open(endpoint(), backend).expect("establish");
    let lifecycle = LifecycleController::with_config(&session, &config());

    let id = lifecycle
        .create(&ContainerSpec::from_image(IMAGE))
        .expect("create");
    lifecycle.start(&id).expect("start");
    let err = lifecycle
        .await_state(&id, ContainerState::Running, Some(Duration::ZERO))
        .expect_err("zero deadline");
    assert!(matches!(err, PodwrightError::Timeout { .. }));
}

#[test]
fn workflow_start_without_create_is_rejected() {
    let backend = InMemoryBackend::new();
    let session = Session::open(endpoint(), backend).expect("establish");
    let lifecycle = LifecycleController::new(&session);

    let err = lifecycle
        .start(&ContainerId::generate())
        .expect_err("fresh identity");
    assert!(matches!(err, PodwrightError::UnknownContainer { .. }));
}

#[test]
fn workflow_cannot_establish_against_down_engine() {
    let backend = InMemoryBackend::new().unreachable();
    let err = Session::open(endpoint(), backend).expect_err("down");
    assert!(matches!(err, PodwrightError::Connection { .. }));
}

// ── Concurrency ──────────────────────────────────────────────────────

#[test]
fn workflows_share_one_session_across_threads() {
    let backend = InMemoryBackend::new()
        .with_local_image(IMAGE)
        .with_startup_polls(2);
    let session = Session::open(endpoint(), backend.clone()).expect("establish");
    let cfg = config();

    std::thread::scope(|scope| {
        for n in 0..4 {
            let session = &session;
            let cfg = &cfg;
            let _ = scope.spawn(move || {
                let lifecycle = LifecycleController::with_config(session, cfg);
                let id = lifecycle
                    .create(&ContainerSpec::from_image(IMAGE).name(format!("worker-{n}")))
                    .expect("create");
                lifecycle.start(&id).expect("start");
                let _ = lifecycle
                    .await_state(&id, ContainerState::Running, Some(Duration::from_secs(5)))
                    .expect("running");
                lifecycle.stop(&id, None).expect("stop");
            });
        }
    });

    assert_eq!(backend.container_count(), 4);
    assert_eq!(backend.ping_count(), 1);
}
