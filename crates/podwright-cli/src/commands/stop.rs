//! `pwt stop`: Stop a running container.

use clap::Args;
use podwright_common::types::ContainerId;

use super::{Context, secs};
use crate::output;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Container ID or name.
    pub container: String,

    /// Seconds to wait before the engine kills the container.
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the container does not exist or fails to stop.
pub fn execute(args: &StopArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require_engine("stop")?;
    let session = ctx.session()?;
    let id = ContainerId::new(&args.container);
    ctx.lifecycle(&session).stop(&id, args.timeout.map(secs))?;
    output::done(&format!("Stopped {}", id.short()));
    Ok(())
}
