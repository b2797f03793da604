//! # podwright-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire Podwright workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and knows nothing about transports; the runtime crate
//! builds sessions and lifecycle operations on top of these primitives.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
