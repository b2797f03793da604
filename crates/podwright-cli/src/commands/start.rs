//! `pwt start`: Start a created container.

use clap::Args;
use podwright_common::types::ContainerId;

use super::Context;
use crate::output;

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Container ID or name.
    pub container: String,
}

/// Executes the `start` command.
///
/// # Errors
///
/// Returns an error if the container does not exist or fails to start.
pub fn execute(args: &StartArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require_engine("start")?;
    let session = ctx.session()?;
    let id = ContainerId::new(&args.container);
    ctx.lifecycle(&session).start(&id)?;
    output::done(&format!("Started {}", id.short()));
    Ok(())
}
