//! `pwt ps`: List containers.

use clap::Args;

use super::Context;
use crate::output::{self, RESET};

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Show all containers (including stopped).
    #[arg(short, long)]
    pub all: bool,

    /// Show only the N most recently created containers.
    #[arg(short = 'n', long)]
    pub last: Option<usize>,

    /// Show only the most recently created container.
    #[arg(short, long, conflicts_with = "last")]
    pub latest: bool,
}

/// Executes the `ps` command.
///
/// # Errors
///
/// Returns an error if the session cannot be opened or listing fails.
pub fn execute(args: &PsArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session()?;
    let limit = if args.latest { Some(1) } else { args.last };
    let containers = ctx.lifecycle(&session).list(args.all, limit)?;

    if containers.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    println!(
        "{:<14} {:<24} {:<10} {:<40}",
        "CONTAINER ID", "NAME", "STATE", "IMAGE"
    );
    for c in &containers {
        let color = output::state_color(c.state);
        println!(
            "{:<14} {:<24} {color}{:<10}{RESET} {:<40}",
            c.id.short(),
            c.names.first().map_or("-", String::as_str),
            c.state.to_string(),
            c.image
        );
    }
    Ok(())
}
