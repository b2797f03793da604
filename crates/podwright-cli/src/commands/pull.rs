//! `pwt pull`: Make sure an image is present on the engine.

use clap::Args;
use podwright_common::types::ImageRef;
use podwright_runtime::image::{self, PullOptions, PullOutcome, PullPolicy};

use super::Context;
use crate::output;

/// Arguments for the `pull` command.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Image reference, e.g. registry.fedoraproject.org/fedora:latest.
    pub image: String,

    /// When to fetch from the registry: always, missing, never.
    #[arg(long, default_value_t = PullPolicy::Missing)]
    pub policy: PullPolicy,

    /// Platform to pull, e.g. linux/arm64.
    #[arg(long)]
    pub platform: Option<String>,
}

impl PullArgs {
    /// Returns the pull options these arguments describe.
    pub fn options(&self) -> PullOptions {
        PullOptions {
            policy: self.policy,
            platform: self.platform.clone(),
        }
    }
}

/// Executes the `pull` command.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or the pull fails.
pub fn execute(args: &PullArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let reference = ImageRef::new(&args.image);

    output::step(&format!("Pulling {reference}..."));
    match image::ensure_image(&session, &reference, &args.options())? {
        PullOutcome::Pulled => output::done(&format!("Pulled {reference}")),
        PullOutcome::AlreadyPresent => output::done(&format!("{reference} is already present")),
    }
    Ok(())
}
