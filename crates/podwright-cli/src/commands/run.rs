//! `pwt run`: Walk one container through its whole lifecycle.
//!
//! Connect, pull, list images, create, start, wait for `running`, list the
//! latest container, inspect, stop, and inspect again. The first failing
//! stage ends the run; nothing created so far is cleaned up.

use std::time::Instant;

use clap::Args;
use podwright_common::constants;
use podwright_common::types::{ContainerState, ImageRef};
use podwright_runtime::image::{self, PullOptions, PullOutcome, PullPolicy};
use podwright_runtime::session::Session;
use podwright_runtime::spec::ContainerSpec;

use super::{Context, secs};
use crate::output::{self, BOLD, DIM, GREEN, RESET};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image to run.
    #[arg(default_value = constants::DEFAULT_IMAGE)]
    pub image: String,

    /// Container name; the engine picks one when unset.
    #[arg(long)]
    pub name: Option<String>,

    /// Do not allocate a pseudo-terminal.
    #[arg(long)]
    pub no_tty: bool,

    /// When to fetch the image: always, missing, never.
    #[arg(long, default_value_t = PullPolicy::Missing)]
    pub pull: PullPolicy,

    /// Seconds to wait for the container to be running.
    #[arg(long)]
    pub wait_timeout: Option<u64>,

    /// Seconds the engine waits before killing the container on stop.
    #[arg(long)]
    pub stop_timeout: Option<u64>,
}

/// Runs one stage, reporting its name if it fails.
fn stage<T, E>(name: &str, f: impl FnOnce() -> Result<T, E>) -> anyhow::Result<T>
where
    E: Into<anyhow::Error>,
{
    f().map_err(|e| {
        output::failed(name);
        e.into()
    })
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns the error of the first stage that fails.
pub fn execute(args: RunArgs, ctx: &Context) -> anyhow::Result<()> {
    let started = Instant::now();
    print_banner();

    let uri = ctx.config.endpoint_uri();
    output::step(&format!("Connecting to {uri}"));
    let session = stage("connect", || ctx.session())?;
    output::done("Connected");

    let reference = ImageRef::new(&args.image);
    pull_and_list(&session, &reference, args.pull)?;

    let lifecycle = ctx.lifecycle(&session);
    let mut spec = ContainerSpec::from_image(reference.clone()).terminal(!args.no_tty);
    if let Some(name) = args.name {
        spec = spec.name(name);
    }

    output::step("Creating container...");
    let id = stage("create", || lifecycle.create(&spec))?;
    output::done(&format!("Created {}", id.short()));

    output::step("Starting container...");
    stage("start", || lifecycle.start(&id))?;
    output::done("Started");

    let wait = args
        .wait_timeout
        .map_or_else(|| ctx.config.wait_timeout(), secs);
    output::step(&format!("Waiting up to {}s for running...", wait.as_secs()));
    let _ = stage("wait", || {
        lifecycle.await_state(&id, ContainerState::Running, Some(wait))
    })?;
    output::done("Container is running");

    output::step("Listing latest container...");
    let latest = stage("list", || lifecycle.latest())?;
    let latest_name = latest
        .as_ref()
        .and_then(|c| c.names.first().cloned())
        .unwrap_or_else(|| "-".to_string());
    output::done(&format!("Latest container is {latest_name}"));

    output::step("Inspecting container...");
    let running = stage("inspect", || lifecycle.inspect(&id))?;
    output::detail(&format!("image:  {}", running.image_name));
    output::detail(&format!("status: {}", running.status));
    output::done("Inspected");

    output::step("Stopping container...");
    stage("stop", || lifecycle.stop(&id, args.stop_timeout.map(secs)))?;
    output::done("Stopped");

    let after = stage("inspect", || lifecycle.inspect(&id))?;
    output::detail(&format!("status: {}", after.status));

    eprintln!();
    eprintln!(
        "  {GREEN}{BOLD}Done{RESET} in {:.1}s {DIM}[{}]{RESET}",
        started.elapsed().as_secs_f64(),
        id
    );
    session.close();
    Ok(())
}

fn print_banner() {
    eprintln!();
    eprintln!(
        "  {BOLD}Welcome to the Podwright tutorial{RESET} {DIM}v{}{RESET}",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
}

fn pull_and_list(session: &Session, reference: &ImageRef, policy: PullPolicy) -> anyhow::Result<()> {
    output::step(&format!("Pulling {reference}..."));
    let options = PullOptions {
        policy,
        platform: None,
    };
    match stage("pull", || image::ensure_image(session, reference, &options))? {
        PullOutcome::Pulled => output::done(&format!("Pulled {reference}")),
        PullOutcome::AlreadyPresent => output::done(&format!("{reference} is already present")),
    }

    output::step("Listing images...");
    let images = stage("images", || image::list_images(session))?;
    for tag in image::repo_tags(&images) {
        output::detail(&tag);
    }
    output::done(&format!("{} image(s) stored", images.len()));
    Ok(())
}
