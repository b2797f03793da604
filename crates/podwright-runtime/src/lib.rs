//! Container lifecycle orchestration for Podwright.
//!
//! A [`Session`](session::Session) owns one connection to the engine and is
//! passed by reference through the pipeline:
//!
//! 1. [`image::ensure_image`] makes the source image available.
//! 2. [`spec::ContainerSpec`] describes the container to create.
//! 3. [`lifecycle::LifecycleController`] creates, starts, waits on,
//!    inspects, and stops it.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use podwright_common::config::ClientConfig;
//! use podwright_common::types::{ContainerState, ImageRef};
//! use podwright_runtime::image::{self, PullOptions};
//! use podwright_runtime::lifecycle::LifecycleController;
//! use podwright_runtime::session::Session;
//! use podwright_runtime::spec::ContainerSpec;
//!
//! # fn main() -> podwright_common::error::Result<()> {
//! let config = ClientConfig::from_env();
//! let session = Session::establish(&config.endpoint_uri(), &config)?;
//!
//! let image = ImageRef::new("registry.fedoraproject.org/fedora:latest");
//! let _ = image::ensure_image(&session, &image, &PullOptions::default())?;
//!
//! let spec = ContainerSpec::from_image(image).terminal(true);
//! let lifecycle = LifecycleController::new(&session);
//! let id = lifecycle.create(&spec)?;
//! lifecycle.start(&id)?;
//! let _ = lifecycle.await_state(&id, ContainerState::Running, Some(Duration::from_secs(5)))?;
//! lifecycle.stop(&id, None)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod backend;
pub mod image;
pub mod lifecycle;
pub mod observer;
pub mod session;
pub mod spec;
