//! Creation requests for new containers.
//!
//! Building a spec never talks to the engine and never fails. Whether an
//! image exists or a combination of options makes sense is decided by the
//! engine when the spec is submitted.

use std::path::PathBuf;

use podwright_common::types::ImageRef;
use serde::{Deserialize, Serialize};

/// Where a container's root filesystem comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "source", rename_all = "lowercase")]
pub enum CreationStrategy {
    /// Layers of an image known to the engine.
    Image(ImageRef),
    /// An exploded root filesystem directory on the engine host.
    Rootfs(PathBuf),
}

impl CreationStrategy {
    /// Returns the image reference or rootfs path as display text.
    #[must_use]
    pub fn origin(&self) -> String {
        match self {
            Self::Image(image) => image.to_string(),
            Self::Rootfs(path) => path.display().to_string(),
        }
    }
}

/// Runtime knobs forwarded to the engine untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeOverrides {
    /// Memory limit in bytes.
    pub memory_bytes: Option<u64>,
    /// Mount the root filesystem read-only.
    pub readonly_rootfs: Option<bool>,
    /// Working directory for the main process.
    pub workdir: Option<String>,
    /// User the main process runs as.
    pub user: Option<String>,
}

/// Request to create one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Root filesystem source.
    pub strategy: CreationStrategy,
    /// Allocate a pseudo-terminal and keep stdin open.
    pub terminal: bool,
    /// Container name; the engine picks one when unset.
    pub name: Option<String>,
    /// Command overriding the image default; empty keeps the default.
    pub command: Vec<String>,
    /// Environment variables for the main process.
    pub env: Vec<(String, String)>,
    /// Optional runtime overrides.
    pub overrides: RuntimeOverrides,
}

impl ContainerSpec {
    /// Creates a spec for the given strategy with every option unset.
    #[must_use]
    pub fn new(strategy: CreationStrategy) -> Self {
        Self {
            strategy,
            terminal: false,
            name: None,
            command: Vec::new(),
            env: Vec::new(),
            overrides: RuntimeOverrides::default(),
        }
    }

    /// Creates a spec that runs the given image.
    #[must_use]
    pub fn from_image(image: impl Into<ImageRef>) -> Self {
        Self::new(CreationStrategy::Image(image.into()))
    }

    /// Creates a spec that runs an exploded root filesystem.
    #[must_use]
    pub fn from_rootfs(path: impl Into<PathBuf>) -> Self {
        Self::new(CreationStrategy::Rootfs(path.into()))
    }

    /// Sets whether a pseudo-terminal is allocated.
    #[must_use]
    pub const fn terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    /// Sets the container name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the command to run.
    #[must_use]
    pub fn command(mut self, cmd: Vec<String>) -> Self {
        self.command = cmd;
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the memory limit in bytes.
    #[must_use]
    pub const fn memory_limit(mut self, bytes: u64) -> Self {
        self.overrides.memory_bytes = Some(bytes);
        self
    }

    /// Sets whether the root filesystem is mounted read-only.
    #[must_use]
    pub const fn readonly_rootfs(mut self, readonly: bool) -> Self {
        self.overrides.readonly_rootfs = Some(readonly);
        self
    }

    /// Returns the image reference for image-mode specs.
    #[must_use]
    pub const fn image(&self) -> Option<&ImageRef> {
        match &self.strategy {
            CreationStrategy::Image(image) => Some(image),
            CreationStrategy::Rootfs(_) => None,
        }
    }

    /// Returns `KEY=value` pairs as the engine expects them.
    #[must_use]
    pub fn env_pairs(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}
