//! `pwt inspect`: Show a container's image, state, and status.

use anyhow::Context as _;
use clap::Args;
use podwright_common::types::ContainerId;

use super::Context;
use crate::output;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Container ID or name.
    pub container: String,

    /// Print the snapshot as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `inspect` command.
///
/// # Errors
///
/// Returns an error if the container does not exist or the engine cannot
/// answer.
pub fn execute(args: &InspectArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require_engine("inspect")?;
    let session = ctx.session()?;
    let snapshot = ctx
        .lifecycle(&session)
        .inspect(&ContainerId::new(&args.container))?;

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot")?;
        println!("{json}");
    } else {
        output::print_snapshot(&snapshot);
    }
    Ok(())
}
