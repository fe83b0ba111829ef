//! # CLI Behavior
//!
//! This is **one possible rendering collaborator** for `varhubapp`, not the
//! application itself. It is the only place that knows about terminal I/O, exit codes
//! and output formatting.
//!
//! ## One Shot, No Saving
//!
//! Every invocation loads the snapshot file, applies the edit flags in a fixed order
//! (`--set`, `--rename`, `--toggle-secret`, `--delete`), then sorting and filtering,
//! and prints the active view. Nothing is written back. The footer reports what a save
//! would contain and whether errors block it.
//!
//! Rejected edits (renaming a secret, touching a deleted variable) print a warning on
//! stderr and the run continues. Addressing a group or variable that does not exist is
//! an error.
//!
//! ## Logging
//!
//! Logs go to stderr through `tracing-subscriber`. `VARHUB_LOG` takes an env-filter
//! directive (`VARHUB_LOG=varhubapp=debug`); `-v` is shorthand for `debug`. The default
//! is `warn`, so a failed load is reported once as a log line and once as the error.
//!
//! ## Module Structure
//!
//! - `commands`: builds the session, applies edits, picks the renderer
//! - `render`: text grid and JSON output
//! - `setup`: argument parsing via clap
//! - `styles`: terminal styling

mod commands;
mod render;
pub mod setup;
mod styles;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use varhubapp::config::PanelConfig;
use varhubapp::ViewKind;

use setup::{parse_cli, Commands};

const LOG_ENV: &str = "VARHUB_LOG";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    let config = PanelConfig::load(cli.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Tree { view, collapsed } => commands::view(config, ViewKind::Home, &view, collapsed),
        Commands::Table { view } => commands::view(config, ViewKind::Table, &view, false),
        Commands::Matrix { view } => commands::view(config, ViewKind::Matrix, &view, false),
        Commands::Config { action } => commands::config(action),
    }
}
