//! CLI command definitions and dispatch.

pub mod create;
pub mod images;
pub mod inspect;
pub mod ps;
pub mod pull;
pub mod run;
pub mod start;
pub mod stop;
pub mod wait;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use podwright_common::config::ClientConfig;
use podwright_common::constants;
use podwright_runtime::backend::memory::InMemoryBackend;
use podwright_runtime::lifecycle::LifecycleController;
use podwright_runtime::session::{Endpoint, Session};

/// Podwright: drive containers through the Podman API socket.
#[derive(Parser, Debug)]
#[command(name = "pwt", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Engine endpoint URI (unix:///path or tcp://host:port).
    #[arg(long, global = true, env = constants::SOCKET_ENV)]
    pub socket: Option<String>,

    /// Runtime directory holding podman/podman.sock.
    #[arg(long, global = true, env = constants::RUNTIME_DIR_ENV)]
    pub runtime_dir: Option<PathBuf>,

    /// Seconds allowed for one request to the engine.
    #[arg(long, global = true, default_value_t = constants::DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,

    /// Milliseconds between state queries while waiting.
    #[arg(
        long,
        global = true,
        default_value_t = constants::DEFAULT_POLL_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Drive an in-process engine instead of the socket.
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full workflow: pull, create, start, wait, inspect, stop.
    Run(run::RunArgs),
    /// Make sure an image is present on the engine.
    Pull(pull::PullArgs),
    /// List images stored by the engine.
    Images(images::ImagesArgs),
    /// List containers.
    Ps(ps::PsArgs),
    /// Create a container from an image or a rootfs directory.
    Create(create::CreateArgs),
    /// Start a created container.
    Start(start::StartArgs),
    /// Wait for a container to reach a state.
    Wait(wait::WaitArgs),
    /// Show a container's image, state, and status.
    Inspect(inspect::InspectArgs),
    /// Stop a running container.
    Stop(stop::StopArgs),
}

/// Settings shared by every command.
#[derive(Debug)]
pub struct Context {
    /// Client configuration after CLI overrides.
    pub config: ClientConfig,
    /// Whether to use the in-process engine.
    pub dry_run: bool,
}

impl Context {
    /// Builds the context from parsed global arguments.
    fn from_cli(cli: &Cli) -> Self {
        let mut config = ClientConfig::from_env();
        if let Some(dir) = &cli.runtime_dir {
            config.runtime_dir.clone_from(dir);
        }
        if let Some(socket) = &cli.socket {
            config.socket = Some(socket.clone());
        }
        config.request_timeout_secs = cli.request_timeout;
        config.poll_interval_ms = cli.poll_interval_ms;
        Self {
            config,
            dry_run: cli.dry_run,
        }
    }

    /// Opens the session every command runs against.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is malformed or not answering.
    pub fn session(&self) -> anyhow::Result<Session> {
        let uri = self.config.endpoint_uri();
        if self.dry_run {
            let endpoint = Endpoint::parse(&uri)?;
            let backend = InMemoryBackend::new().with_open_registry();
            return Session::open(endpoint, backend).context("in-process engine unavailable");
        }
        Session::establish(&uri, &self.config)
            .with_context(|| format!("is the Podman API service running? (podman system service {uri})"))
    }

    /// Fails for commands that address an existing container under
    /// `--dry-run`.
    ///
    /// The in-process engine lives for one invocation, so a container ID
    /// from an earlier `pwt --dry-run create` is never known to it.
    ///
    /// # Errors
    ///
    /// Returns an error if `--dry-run` is set.
    pub fn require_engine(&self, command: &str) -> anyhow::Result<()> {
        if self.dry_run {
            anyhow::bail!(
                "`pwt {command}` needs a container from an earlier invocation, \
                 which --dry-run does not keep; try `pwt --dry-run run` instead"
            );
        }
        Ok(())
    }

    /// Returns a lifecycle controller bound to `session`.
    pub fn lifecycle<'s>(&self, session: &'s Session) -> LifecycleController<'s> {
        LifecycleController::with_config(session, &self.config)
    }
}

/// Parses a seconds argument into a [`Duration`].
pub(crate) const fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(&cli);
    tracing::debug!(endpoint = %ctx.config.endpoint_uri(), dry_run = ctx.dry_run, "resolved endpoint");
    match cli.command {
        Command::Run(args) => run::execute(args, &ctx),
        Command::Pull(args) => pull::execute(&args, &ctx),
        Command::Images(args) => images::execute(&args, &ctx),
        Command::Ps(args) => ps::execute(&args, &ctx),
        Command::Create(args) => create::execute(args, &ctx),
        Command::Start(args) => start::execute(&args, &ctx),
        Command::Wait(args) => wait::execute(&args, &ctx),
        Command::Inspect(args) => inspect::execute(&args, &ctx),
        Command::Stop(args) => stop::execute(&args, &ctx),
    }
}
