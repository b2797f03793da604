//! `pwt wait`: Block until a container reports a state.

use clap::Args;
use podwright_common::types::{ContainerId, ContainerState};

use super::{Context, secs};
use crate::output;

/// Arguments for the `wait` command.
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Container ID or name.
    pub container: String,

    /// State to wait for: created, running, paused, stopped, exited.
    #[arg(short, long, default_value = "running", value_parser = parse_state)]
    pub state: ContainerState,

    /// Seconds to wait; 0 checks once. Defaults to the configured wait timeout.
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Wait without a deadline.
    #[arg(long, conflicts_with = "timeout")]
    pub forever: bool,
}

/// Parses a target state, rejecting names the engine never reports.
pub(crate) fn parse_state(raw: &str) -> Result<ContainerState, String> {
    match ContainerState::from_status(raw) {
        ContainerState::Unknown => Err(format!("unknown container state '{raw}'")),
        state => Ok(state),
    }
}

/// Executes the `wait` command.
///
/// # Errors
///
/// Returns an error if the container settles elsewhere or the deadline passes.
pub fn execute(args: &WaitArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require_engine("wait")?;
    let session = ctx.session()?;
    let id = ContainerId::new(&args.container);
    let timeout = if args.forever {
        None
    } else {
        Some(args.timeout.map_or_else(|| ctx.config.wait_timeout(), secs))
    };

    let snapshot = ctx.lifecycle(&session).await_state(&id, args.state, timeout)?;
    output::done(&format!("{} is {}", id.short(), snapshot.state));
    Ok(())
}
