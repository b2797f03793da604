//! Domain primitive types used across the Podwright workspace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TAG;

/// Identity the engine assigned to a container at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random 64-character hex ID in the engine's format.
    #[must_use]
    pub fn generate() -> Self {
        let a = uuid::Uuid::new_v4().simple().to_string();
        let b = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{a}{b}"))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 12-character prefix engines print in listings.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an image by registry, name, and tag or digest.
///
/// Validation belongs to the engine. The client only splits a reference
/// into repository and tag when a transport asks for them separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wraps a raw image reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference exactly as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the reference without its tag or digest.
    #[must_use]
    pub fn repository(&self) -> &str {
        self.split().0
    }

    /// Returns the tag, `latest` when none is given.
    ///
    /// Digest references have no tag and return `None`.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self.split().1 {
            Suffix::Tag(tag) => Some(tag),
            Suffix::Digest(_) => None,
            Suffix::None => Some(DEFAULT_TAG),
        }
    }

    /// Returns the digest of a `name@sha256:...` reference.
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        match self.split().1 {
            Suffix::Digest(digest) => Some(digest),
            _ => None,
        }
    }

    /// Returns the reference with an explicit tag, adding `:latest` if
    /// none is present. Digest references are returned unchanged.
    #[must_use]
    pub fn normalized(&self) -> String {
        match self.split() {
            (_, Suffix::Tag(_) | Suffix::Digest(_)) => self.0.clone(),
            (repo, Suffix::None) => format!("{repo}:{DEFAULT_TAG}"),
        }
    }

    fn split(&self) -> (&str, Suffix<'_>) {
        if let Some((repo, digest)) = self.0.split_once('@') {
            return (repo, Suffix::Digest(digest));
        }
        // A colon before the last slash belongs to a registry port.
        let name_start = self.0.rfind('/').map_or(0, |i| i + 1);
        match self.0[name_start..].rfind(':') {
            Some(i) => {
                let at = name_start + i;
                (&self.0[..at], Suffix::Tag(&self.0[at + 1..]))
            }
            None => (&self.0, Suffix::None),
        }
    }
}

enum Suffix<'a> {
    Tag(&'a str),
    Digest(&'a str),
    None,
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Lifecycle state of a container as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Created but never started.
    Created,
    /// The container's process is running.
    Running,
    /// Processes are frozen.
    Paused,
    /// Stopped without having exited on its own.
    Stopped,
    /// The container's process has exited.
    Exited,
    /// The engine reported a state this client does not model.
    Unknown,
}

impl ContainerState {
    /// Maps an engine status string onto a state.
    ///
    /// `configured` and `initialized` are pre-start states in Podman;
    /// `dead` and `removing` are treated as exited. `stopping` and
    /// `restarting` are in flight and map to [`Self::Unknown`].
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "created" | "configured" | "initialized" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "stopped" => Self::Stopped,
            "exited" | "dead" | "removing" => Self::Exited,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` for states the container leaves only through a new
    /// explicit start.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Exited)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
            Self::Exited => write!(f, "exited"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Point-in-time view of a container returned by inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    /// Container identity.
    pub id: ContainerId,
    /// Container name, without the leading slash some engines add.
    pub name: String,
    /// Image reference the container was created from.
    pub image_name: String,
    /// Parsed lifecycle state.
    pub state: ContainerState,
    /// Raw status text as reported by the engine.
    pub status: String,
    /// Exit code of the main process, once it has exited.
    pub exit_code: Option<i64>,
    /// Creation time, if the engine reported a parseable one.
    pub created: Option<DateTime<Utc>>,
}

/// Image known to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    /// Engine image ID.
    pub id: String,
    /// Repository tags pointing at this image.
    pub repo_tags: Vec<String>,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Container entry returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Container identity.
    pub id: ContainerId,
    /// Names assigned to the container.
    pub names: Vec<String>,
    /// Image the container runs.
    pub image: String,
    /// Parsed lifecycle state.
    pub state: ContainerState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_hex() {
        let a = ContainerId::generate();
        let b = ContainerId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn short_id_of_short_value_is_whole_value() {
        assert_eq!(ContainerId::new("abc").short(), "abc");
    }

    #[test]
    fn image_ref_with_tag() {
        let r = ImageRef::new("registry.fedoraproject.org/fedora:39");
        assert_eq!(r.repository(), "registry.fedoraproject.org/fedora");
        assert_eq!(r.tag(), Some("39"));
        assert_eq!(r.normalized(), "registry.fedoraproject.org/fedora:39");
    }

    #[test]
    fn image_ref_without_tag_defaults_to_latest() {
        let r = ImageRef::new("example/base");
        assert_eq!(r.repository(), "example/base");
        assert_eq!(r.tag(), Some("latest"));
        assert_eq!(r.normalized(), "example/base:latest");
    }

    #[test]
    fn image_ref_registry_port_is_not_a_tag() {
        let r = ImageRef::new("localhost:5000/app");
        assert_eq!(r.repository(), "localhost:5000/app");
        assert_eq!(r.tag(), Some("latest"));

        let tagged = ImageRef::new("localhost:5000/app:v2");
        assert_eq!(tagged.repository(), "localhost:5000/app");
        assert_eq!(tagged.tag(), Some("v2"));
    }

    #[test]
    fn image_ref_with_digest() {
        let r = ImageRef::new("alpine@sha256:abcd");
        assert_eq!(r.repository(), "alpine");
        assert_eq!(r.tag(), None);
        assert_eq!(r.digest(), Some("sha256:abcd"));
        assert_eq!(r.normalized(), "alpine@sha256:abcd");
    }

    #[test]
    fn state_from_engine_status() {
        assert_eq!(ContainerState::from_status("running"), ContainerState::Running);
        assert_eq!(ContainerState::from_status("Exited"), ContainerState::Exited);
        assert_eq!(ContainerState::from_status("configured"), ContainerState::Created);
        assert_eq!(ContainerState::from_status("dead"), ContainerState::Exited);
        assert_eq!(ContainerState::from_status("weird"), ContainerState::Unknown);
    }

    #[test]
    fn transitional_statuses_are_neither_target_nor_terminal() {
        for status in ["stopping", "restarting"] {
            let state = ContainerState::from_status(status);
            assert_eq!(state, ContainerState::Unknown, "{status}");
            assert!(!state.is_terminal(), "{status}");
        }
    }

    #[test]
    fn terminal_states() {
        assert!(ContainerState::Exited.is_terminal());
        assert!(ContainerState::Stopped.is_terminal());
        assert!(!ContainerState::Running.is_terminal());
        assert!(!ContainerState::Created.is_terminal());
    }

    #[test]
    fn state_display_matches_serde() {
        for state in [
            ContainerState::Created,
            ContainerState::Running,
            ContainerState::Paused,
            ContainerState::Stopped,
            ContainerState::Exited,
            ContainerState::Unknown,
        ] {
            let json = serde_json::to_string(&state).expect("serialize");
            assert_eq!(json, format!("\"{state}\""));
        }
    }
}
