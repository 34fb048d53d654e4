//! cs-location CLI
//!
//! Lists, applies, removes and reconciles Pacemaker location constraints
//! through pcs.

mod commands;
mod config;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use observability::{init_tracing, TracingConfig};
use tokio::sync::watch;
use tracing::Level;

use crate::commands::{apply, list, reconcile, remove, Context};
use crate::config::Settings;
use crate::error::CliError;

/// Exit status after Ctrl-C, as shells report SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

/// Manage Pacemaker location constraints through pcs
#[derive(Parser)]
#[command(name = "cs-location")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (default: ~/.config/cs-location/config.toml)
    #[arg(short, long, global = true, env = "CS_LOCATION_CONFIG")]
    config: Option<PathBuf>,

    /// pcs binary, overriding the settings file
    #[arg(long, global = true, env = "CS_LOCATION_PCS")]
    pcs_binary: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// List the location constraints in the cluster
    List(list::ListArgs),

    /// Apply every constraint in a manifest
    Apply(apply::ApplyArgs),

    /// Remove a location constraint
    Remove(remove::RemoveArgs),

    /// Bring the cluster in line with a manifest
    Reconcile(reconcile::ReconcileArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match Settings::resolve(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(2);
        }
    };
    if let Some(pcs_binary) = cli.pcs_binary {
        settings.pcs_binary = pcs_binary;
    }

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(
        TracingConfig::new(config::APP_NAME)
            .with_level(level)
            .with_json(settings.log_json),
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctx = Context::new(settings, cli.format, cancel_rx);
    let result = run_interruptible(cli.command, &ctx, &cancel_tx).await;

    let interrupted = *cancel_tx.borrow();
    if let Err(e) = result {
        output::error(&format!("{:#}", e));
        std::process::exit(if interrupted { EXIT_INTERRUPTED } else { 1 });
    }
    if interrupted {
        std::process::exit(EXIT_INTERRUPTED);
    }

    Ok(())
}

async fn run(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => list::execute(args, ctx).await,
        Commands::Apply(args) => apply::execute(args, ctx).await,
        Commands::Remove(args) => remove::execute(args, ctx).await,
        Commands::Reconcile(args) => reconcile::execute(args, ctx).await,
    }
}

/// Run `command`, reacting to Ctrl-C.
///
/// The first Ctrl-C raises the cancel signal: a readiness wait stops at once
/// and no further pcs write starts. A second Ctrl-C drops the command, which
/// kills the pcs child still running.
async fn run_interruptible(
    command: Commands,
    ctx: &Context,
    cancel: &watch::Sender<bool>,
) -> anyhow::Result<()> {
    let command = run(command, ctx);
    tokio::pin!(command);

    tokio::select! {
        result = &mut command => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            output::warn("Interrupted, stopping after the running pcs command (Ctrl-C again to abort)");
            let _ = cancel.send(true);
            tokio::select! {
                result = &mut command => result,
                Ok(()) = tokio::signal::ctrl_c() => Err(CliError::Interrupted.into()),
            }
        }
    }
}
