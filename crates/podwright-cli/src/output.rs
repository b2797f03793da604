//! Formatted output helpers for CLI commands.
//!
//! Progress lines go to stderr with ANSI styling; listings go to stdout.

use chrono::{DateTime, Utc};
use podwright_common::types::{ContainerSnapshot, ContainerState};

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const CYAN: &str = "\x1b[36m";
pub const YELLOW: &str = "\x1b[33m";
pub const RESET: &str = "\x1b[0m";

/// Prints one workflow step.
pub fn step(message: &str) {
    eprintln!("  {CYAN}>{RESET} {message}");
}

/// Prints a detail line under the current step.
pub fn detail(message: &str) {
    eprintln!("    {DIM}{message}{RESET}");
}

/// Prints a completed step.
pub fn done(message: &str) {
    eprintln!("  {GREEN}✓{RESET} {message}");
}

/// Prints the failing stage before the error propagates.
pub fn failed(stage: &str) {
    eprintln!("  {RED}✗{RESET} {BOLD}{stage}{RESET} failed, later stages skipped");
}

/// Returns the color used for a state.
#[must_use]
pub const fn state_color(state: ContainerState) -> &'static str {
    match state {
        ContainerState::Running => GREEN,
        ContainerState::Created | ContainerState::Paused => YELLOW,
        ContainerState::Stopped | ContainerState::Exited => DIM,
        ContainerState::Unknown => RED,
    }
}

/// Prints a snapshot as aligned `key: value` lines on stdout.
pub fn print_snapshot(snapshot: &ContainerSnapshot) {
    println!("{:<10} {}", "ID", snapshot.id);
    println!("{:<10} {}", "NAME", snapshot.name);
    println!("{:<10} {}", "IMAGE", snapshot.image_name);
    println!("{:<10} {}", "STATE", snapshot.state);
    println!("{:<10} {}", "STATUS", snapshot.status);
    if let Some(code) = snapshot.exit_code {
        println!("{:<10} {code}", "EXIT CODE");
    }
    if let Some(created) = snapshot.created {
        println!("{:<10} {}", "CREATED", format_age(created, Utc::now()));
    }
}

/// Formats a byte count into a human-readable string (e.g., "128 MiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Formats the time since `then` as a coarse age (e.g., "3 minutes ago").
#[must_use]
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let (value, unit) = match secs {
        0..=59 => (secs, "second"),
        60..=3599 => (secs / 60, "minute"),
        3600..=86_399 => (secs / 3600, "hour"),
        _ => (secs / 86_400, "day"),
    };
    let plural = if value == 1 { "" } else { "s" };
    format!("{value} {unit}{plural} ago")
}

/// Shortens an image ID for tables, dropping the `sha256:` prefix.
#[must_use]
pub fn short_image_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.get(..12).unwrap_or(id)
}
