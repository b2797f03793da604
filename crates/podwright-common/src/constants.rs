//! System-wide constants and default paths.

use std::path::{Path, PathBuf};

/// Environment variable naming the per-user runtime directory.
pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";

/// Environment variable that overrides the engine socket URI.
pub const SOCKET_ENV: &str = "PODWRIGHT_SOCKET";

/// Runtime directory used by a rootful engine when no user runtime
/// directory is set.
pub const SYSTEM_RUNTIME_DIR: &str = "/run";

/// Location of the Podman API socket relative to the runtime directory.
pub const PODMAN_SOCKET_RELATIVE: &str = "podman/podman.sock";

/// URI scheme for Unix domain socket endpoints.
pub const UNIX_SCHEME: &str = "unix://";

/// URI scheme for TCP endpoints.
pub const TCP_SCHEME: &str = "tcp://";

/// Alias accepted for TCP endpoints.
pub const HTTP_SCHEME: &str = "http://";

/// Image pulled by the tutorial workflow when none is given.
pub const DEFAULT_IMAGE: &str = "registry.fedoraproject.org/fedora:latest";

/// Tag assumed when an image reference carries none.
pub const DEFAULT_TAG: &str = "latest";

/// Seconds to wait for a transport round trip before giving up.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Milliseconds between two state queries while waiting on a container.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Seconds a workflow waits for a container to reach a target state.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 30;

/// Grace period in seconds the engine gives a container before killing it.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;

/// Returns the Podman socket path under the given runtime directory.
#[must_use]
pub fn podman_socket_path(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join(PODMAN_SOCKET_RELATIVE)
}

/// Returns the `unix://` URI for the Podman socket under `runtime_dir`.
#[must_use]
pub fn podman_socket_uri(runtime_dir: &Path) -> String {
    format!("{UNIX_SCHEME}{}", podman_socket_path(runtime_dir).display())
}
