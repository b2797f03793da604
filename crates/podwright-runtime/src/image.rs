//! Image acquisition and listing.

use std::fmt;
use std::str::FromStr;

use podwright_common::error::{PodwrightError, RemoteError, Result};
use podwright_common::types::{ImageRef, ImageSummary};
use serde::{Deserialize, Serialize};

use crate::session::Session;

/// When to fetch an image from its registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullPolicy {
    /// Pull even if the image is already stored.
    Always,
    /// Pull only if the image is not stored yet.
    #[default]
    Missing,
    /// Never pull; the image must already be stored.
    Never,
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Missing => write!(f, "missing"),
            Self::Never => write!(f, "never"),
        }
    }
}

impl FromStr for PullPolicy {
    type Err = PodwrightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "missing" => Ok(Self::Missing),
            "never" => Ok(Self::Never),
            other => Err(PodwrightError::Config {
                message: format!("unknown pull policy: {other}"),
            }),
        }
    }
}

/// Options for [`ensure_image`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOptions {
    /// Pull policy.
    pub policy: PullPolicy,
    /// Platform to pull, e.g. `linux/arm64`; the engine's own when unset.
    pub platform: Option<String>,
}

/// What [`ensure_image`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The image was already stored; nothing was fetched.
    AlreadyPresent,
    /// The image was fetched from its registry.
    Pulled,
}

/// Makes sure `reference` is stored by the engine.
///
/// Blocks until the pull finishes. With the default policy an image that
/// is already present is left alone, so calling this twice is harmless.
///
/// # Errors
///
/// Returns [`PodwrightError::ImagePull`] if the image is missing upstream,
/// the registry cannot be reached, the reference is malformed, or the
/// policy forbids the pull it would need.
pub fn ensure_image(
    session: &Session,
    reference: &ImageRef,
    options: &PullOptions,
) -> Result<PullOutcome> {
    let backend = session.backend();
    let pull_error = |source: RemoteError| PodwrightError::ImagePull {
        reference: reference.to_string(),
        source,
    };

    if options.policy != PullPolicy::Always
        && backend.image_exists(reference).map_err(pull_error)?
    {
        tracing::info!(image = %reference, "image already present");
        return Ok(PullOutcome::AlreadyPresent);
    }

    if options.policy == PullPolicy::Never {
        return Err(pull_error(RemoteError::NotFound {
            message: "image is not stored and the pull policy is never".into(),
        }));
    }

    tracing::info!(image = %reference, policy = %options.policy, "pulling image");
    backend
        .pull_image(reference, options.platform.as_deref())
        .map_err(pull_error)?;
    tracing::info!(image = %reference, "image pulled");
    Ok(PullOutcome::Pulled)
}

/// Lists images stored by the engine.
///
/// # Errors
///
/// Returns [`PodwrightError::List`] if the engine cannot answer.
pub fn list_images(session: &Session) -> Result<Vec<ImageSummary>> {
    session
        .backend()
        .list_images()
        .map_err(|source| PodwrightError::List {
            kind: "images",
            source,
        })
}

/// Collects every repository tag across `images`, in listing order.
#[must_use]
pub fn repo_tags(images: &[ImageSummary]) -> Vec<String> {
    images
        .iter()
        .flat_map(|img| img.repo_tags.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::session::Endpoint;

    const IMAGE: &str = "example/base:latest";

    fn session(backend: &InMemoryBackend) -> Session {
        Session::open(Endpoint::Tcp("memory:0".into()), backend.clone()).expect("open")
    }

    #[test]
    fn ensure_image_is_idempotent() {
        let backend = InMemoryBackend::new().with_upstream_image(IMAGE);
        let session = session(&backend);
        let image = ImageRef::new(IMAGE);

        let first = ensure_image(&session, &image, &PullOptions::default()).expect("first");
        let second = ensure_image(&session, &image, &PullOptions::default()).expect("second");

        assert_eq!(first, PullOutcome::Pulled);
        assert_eq!(second, PullOutcome::AlreadyPresent);
        assert_eq!(backend.pull_count(), 1);
        assert_eq!(list_images(&session).expect("list").len(), 1);
    }

    #[test]
    fn always_policy_pulls_again() {
        let backend = InMemoryBackend::new().with_upstream_image(IMAGE);
        let session = session(&backend);
        let image = ImageRef::new(IMAGE);
        let options = PullOptions {
            policy: PullPolicy::Always,
            platform: None,
        };

        let _ = ensure_image(&session, &image, &options).expect("first");
        let again = ensure_image(&session, &image, &options).expect("second");
        assert_eq!(again, PullOutcome::Pulled);
        assert_eq!(backend.pull_count(), 2);
        assert_eq!(list_images(&session).expect("list").len(), 1);
    }

    #[test]
    fn never_policy_rejects_missing_image() {
        let backend = InMemoryBackend::new().with_upstream_image(IMAGE);
        let session = session(&backend);
        let options = PullOptions {
            policy: PullPolicy::Never,
            platform: None,
        };
        let err = ensure_image(&session, &ImageRef::new(IMAGE), &options).expect_err("never");
        assert!(matches!(err, PodwrightError::ImagePull { .. }));
        assert_eq!(backend.pull_count(), 0);
    }

    #[test]
    fn never_policy_accepts_present_image() {
        let backend = InMemoryBackend::new().with_local_image(IMAGE);
        let session = session(&backend);
        let options = PullOptions {
            policy: PullPolicy::Never,
            platform: None,
        };
        let outcome = ensure_image(&session, &ImageRef::new(IMAGE), &options).expect("present");
        assert_eq!(outcome, PullOutcome::AlreadyPresent);
    }

    #[test]
    fn missing_upstream_image_fails() {
        let backend = InMemoryBackend::new();
        let session = session(&backend);
        let err = ensure_image(
            &session,
            &ImageRef::new("nowhere/none:1"),
            &PullOptions::default(),
        )
        .expect_err("missing upstream");
        assert!(
            matches!(&err, PodwrightError::ImagePull { reference, source }
                if reference == "nowhere/none:1" && source.is_not_found()),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn unreachable_registry_fails() {
        let backend = InMemoryBackend::new()
            .with_upstream_image(IMAGE)
            .with_unreachable_registry();
        let session = session(&backend);
        let err = ensure_image(&session, &ImageRef::new(IMAGE), &PullOptions::default())
            .expect_err("registry down");
        assert!(matches!(err, PodwrightError::ImagePull { .. }));
    }

    #[test]
    fn pull_policy_parses_case_insensitively() {
        assert_eq!("Always".parse::<PullPolicy>().expect("always"), PullPolicy::Always);
        assert_eq!("never".parse::<PullPolicy>().expect("never"), PullPolicy::Never);
        assert!("sometimes".parse::<PullPolicy>().is_err());
        assert_eq!(PullPolicy::default(), PullPolicy::Missing);
    }

    #[test]
    fn repo_tags_flattens_in_order() {
        let images = vec![
            ImageSummary {
                id: "a".into(),
                repo_tags: vec!["one:1".into(), "one:latest".into()],
                size_bytes: 1,
            },
            ImageSummary {
                id: "b".into(),
                repo_tags: vec!["two:latest".into()],
                size_bytes: 2,
            },
        ];
        assert_eq!(repo_tags(&images), vec!["one:1", "one:latest", "two:latest"]);
    }
}
