//! Backend speaking the Docker-compatible REST API that Podman serves on
//! its API socket.
//!
//! `bollard` is asynchronous; the backend owns a single-worker tokio
//! runtime and blocks on each call so the lifecycle API stays synchronous.

use std::time::Duration;

use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::models::{ContainerInspectResponse, HostConfig};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use podwright_common::constants::DEFAULT_TAG;
use podwright_common::error::RemoteError;
use podwright_common::types::{
    ContainerId, ContainerSnapshot, ContainerState, ContainerSummary, ImageRef, ImageSummary,
};
use tokio::runtime::Runtime;

use super::{ContainerBackend, RemoteResult};
use crate::session::Endpoint;
use crate::spec::{ContainerSpec, CreationStrategy};

/// Backend for a Podman (or Docker) API socket.
pub struct PodmanBackend {
    docker: Docker,
    runtime: Runtime,
}

impl PodmanBackend {
    /// Builds a client for `endpoint`. No request is sent yet.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the I/O runtime or the client
    /// cannot be created.
    pub fn connect(endpoint: &Endpoint, request_timeout_secs: u64) -> RemoteResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("podwright-io")
            .enable_all()
            .build()
            .map_err(|e| RemoteError::Transport {
                message: format!("failed to start I/O runtime: {e}"),
            })?;

        let docker = {
            let _guard = runtime.enter();
            match endpoint {
                Endpoint::Unix(path) => Docker::connect_with_unix(
                    &path.to_string_lossy(),
                    request_timeout_secs,
                    bollard::API_DEFAULT_VERSION,
                ),
                Endpoint::Tcp(addr) => Docker::connect_with_http(
                    &format!("tcp://{addr}"),
                    request_timeout_secs,
                    bollard::API_DEFAULT_VERSION,
                ),
            }
            .map_err(classify)?
        };

        tracing::debug!(endpoint = %endpoint, "engine client ready");
        Ok(Self { docker, runtime })
    }
}

impl ContainerBackend for PodmanBackend {
    fn ping(&self) -> RemoteResult<()> {
        let reply = self.runtime.block_on(self.docker.ping()).map_err(classify)?;
        tracing::debug!(%reply, "engine ping");
        Ok(())
    }

    fn image_exists(&self, reference: &ImageRef) -> RemoteResult<bool> {
        match self
            .runtime
            .block_on(self.docker.inspect_image(reference.as_str()))
        {
            Ok(_) => Ok(true),
            Err(e) => match classify(e) {
                RemoteError::NotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    fn pull_image(&self, reference: &ImageRef, platform: Option<&str>) -> RemoteResult<()> {
        let tag = reference
            .tag()
            .or_else(|| reference.digest())
            .unwrap_or(DEFAULT_TAG);
        let options = CreateImageOptions {
            from_image: reference.repository().to_string(),
            tag: tag.to_string(),
            platform: platform.unwrap_or_default().to_string(),
            ..Default::default()
        };

        self.runtime.block_on(async {
            let mut progress = std::pin::pin!(self.docker.create_image(Some(options), None, None));
            while let Some(info) = progress.try_next().await.map_err(classify)? {
                if let Some(status) = info.status {
                    tracing::debug!(image = %reference, %status, "pull progress");
                }
            }
            Ok(())
        })
    }

    fn list_images(&self) -> RemoteResult<Vec<ImageSummary>> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };
        let images = self
            .runtime
            .block_on(self.docker.list_images(Some(options)))
            .map_err(classify)?;
        Ok(images
            .into_iter()
            .map(|img| ImageSummary {
                id: img.id,
                repo_tags: img.repo_tags,
                size_bytes: u64::try_from(img.size).unwrap_or(0),
            })
            .collect())
    }

    fn create(&self, spec: &ContainerSpec) -> RemoteResult<ContainerId> {
        let image = match &spec.strategy {
            CreationStrategy::Image(image) => image.to_string(),
            CreationStrategy::Rootfs(path) => {
                return Err(RemoteError::Unsupported {
                    message: format!(
                        "rootfs creation ({}) needs the libpod API",
                        path.display()
                    ),
                });
            }
        };

        let host_config = HostConfig {
            memory: spec
                .overrides
                .memory_bytes
                .and_then(|b| i64::try_from(b).ok()),
            readonly_rootfs: spec.overrides.readonly_rootfs,
            ..Default::default()
        };
        let config = Config {
            image: Some(image),
            tty: Some(spec.terminal),
            open_stdin: Some(spec.terminal),
            cmd: (!spec.command.is_empty()).then(|| spec.command.clone()),
            env: (!spec.env.is_empty()).then(|| spec.env_pairs()),
            working_dir: spec.overrides.workdir.clone(),
            user: spec.overrides.user.clone(),
            host_config: Some(host_config),
            ..Default::default()
        };
        let options = spec.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });

        let response = self
            .runtime
            .block_on(self.docker.create_container(options, config))
            .map_err(classify)?;
        for warning in &response.warnings {
            tracing::warn!(id = %response.id, %warning, "engine warning on create");
        }
        Ok(ContainerId::new(response.id))
    }

    fn start(&self, id: &ContainerId) -> RemoteResult<()> {
        self.runtime
            .block_on(
                self.docker
                    .start_container(id.as_str(), None::<StartContainerOptions<String>>),
            )
            .map_err(classify)
    }

    fn inspect(&self, id: &ContainerId) -> RemoteResult<ContainerSnapshot> {
        let response = self
            .runtime
            .block_on(
                self.docker
                    .inspect_container(id.as_str(), None::<InspectContainerOptions>),
            )
            .map_err(classify)?;
        Ok(snapshot_from(id, response))
    }

    fn stop(&self, id: &ContainerId, timeout: Duration) -> RemoteResult<()> {
        let options = StopContainerOptions {
            t: i64::try_from(timeout.as_secs()).unwrap_or(i64::MAX),
        };
        self.runtime
            .block_on(self.docker.stop_container(id.as_str(), Some(options)))
            .map_err(classify)
    }

    fn list_containers(
        &self,
        all: bool,
        limit: Option<usize>,
    ) -> RemoteResult<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all,
            limit: limit.and_then(|l| isize::try_from(l).ok()),
            ..Default::default()
        };
        let containers = self
            .runtime
            .block_on(self.docker.list_containers(Some(options)))
            .map_err(classify)?;
        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: ContainerId::new(c.id.unwrap_or_default()),
                names: c
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .collect(),
                image: c.image.unwrap_or_default(),
                state: c
                    .state
                    .as_deref()
                    .map_or(ContainerState::Unknown, ContainerState::from_status),
            })
            .collect())
    }
}

/// Converts an inspect response into a snapshot.
///
/// The image name comes from the container config, which holds the
/// reference the container was created with; the top-level `Image` field
/// is the resolved image ID.
fn snapshot_from(id: &ContainerId, response: ContainerInspectResponse) -> ContainerSnapshot {
    let state = response.state.unwrap_or_default();
    let status = state
        .status
        .map(|s| s.to_string())
        .unwrap_or_default();
    let parsed = ContainerState::from_status(&status);
    ContainerSnapshot {
        id: response.id.map_or_else(|| id.clone(), ContainerId::new),
        name: response
            .name
            .unwrap_or_default()
            .trim_start_matches('/')
            .to_string(),
        image_name: response
            .config
            .and_then(|c| c.image)
            .or(response.image)
            .unwrap_or_default(),
        state: parsed,
        status,
        exit_code: state.exit_code.filter(|_| parsed.is_terminal()),
        created: response.created.as_deref().and_then(parse_timestamp),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Maps a bollard error onto the engine's verdict.
fn classify(err: BollardError) -> RemoteError {
    match err {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => RemoteError::from_status(status_code, message),
        BollardError::DockerStreamError { error } => RemoteError::Server {
            status: 500,
            message: error,
        },
        other => RemoteError::Transport {
            message: other.to_string(),
        },
    }
}
