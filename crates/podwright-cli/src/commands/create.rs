//! `pwt create`: Create a container without starting it.

use std::path::PathBuf;

use clap::Args;
use podwright_common::constants;
use podwright_runtime::image::{self, PullOptions};
use podwright_runtime::spec::ContainerSpec;

use super::Context;

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Image to create the container from.
    #[arg(default_value = constants::DEFAULT_IMAGE, conflicts_with = "rootfs")]
    pub image: String,

    /// Use an exploded root filesystem on the engine host instead of an image.
    #[arg(long)]
    pub rootfs: Option<PathBuf>,

    /// Container name.
    #[arg(long)]
    pub name: Option<String>,

    /// Allocate a pseudo-terminal and keep stdin open.
    #[arg(short, long)]
    pub tty: bool,

    /// Environment variable in KEY=VALUE form (repeatable).
    #[arg(short, long = "env", value_parser = parse_env)]
    pub env: Vec<(String, String)>,

    /// Memory limit in bytes.
    #[arg(long)]
    pub memory: Option<u64>,

    /// Mount the root filesystem read-only.
    #[arg(long)]
    pub readonly: bool,

    /// Working directory for the main process.
    #[arg(short, long)]
    pub workdir: Option<String>,

    /// User the main process runs as.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Command overriding the image default.
    #[arg(last = true)]
    pub command: Vec<String>,
}

impl CreateArgs {
    /// Builds the creation request these arguments describe.
    pub fn into_spec(self) -> ContainerSpec {
        let mut spec = match self.rootfs {
            Some(path) => ContainerSpec::from_rootfs(path),
            None => ContainerSpec::from_image(self.image.as_str()),
        }
        .terminal(self.tty)
        .command(self.command);
        if let Some(name) = self.name {
            spec = spec.name(name);
        }
        for (key, value) in self.env {
            spec = spec.env(key, value);
        }
        if let Some(bytes) = self.memory {
            spec = spec.memory_limit(bytes);
        }
        if self.readonly {
            spec = spec.readonly_rootfs(true);
        }
        spec.overrides.workdir = self.workdir;
        spec.overrides.user = self.user;
        spec
    }
}

/// Parses a `KEY=VALUE` pair.
pub(crate) fn parse_env(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Executes the `create` command.
///
/// Prints the new container ID on stdout. Under `--dry-run` the image is
/// fetched into the in-process engine first.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or the engine
/// rejects the request.
pub fn execute(args: CreateArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let spec = args.into_spec();
    if ctx.dry_run {
        if let Some(reference) = spec.image() {
            let _ = image::ensure_image(&session, reference, &PullOptions::default())?;
        }
    }
    let id = ctx.lifecycle(&session).create(&spec)?;
    println!("{id}");
    Ok(())
}
