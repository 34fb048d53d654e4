//! Reconcile command - converge the cluster on a manifest.

use std::path::PathBuf;

use clap::Args;
use location_core::{ConstraintManifest, ExecutionOutcome, ReconciliationLoop};
use pcs_provider::PcsLocationProvider;

use super::Context;
use crate::error::CliError;
use crate::output::{self, print_value, section};
use crate::OutputFormat;

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Manifest file (YAML)
    #[arg(short, long)]
    file: PathBuf,

    /// Show what would change without changing it
    #[arg(long)]
    dry_run: bool,
}

/// Execute the reconcile command.
pub async fn execute(args: ReconcileArgs, ctx: &Context) -> anyhow::Result<()> {
    let manifest = ConstraintManifest::load(&args.file).map_err(CliError::from)?;

    let registry = ctx.registry(None)?;
    let reconciliation = ReconciliationLoop::from_registry(&registry, PcsLocationProvider::NAME)?
        .with_dry_run(args.dry_run);
    let outcome = reconciliation
        .run_cycle(&manifest.constraints)
        .await
        .map_err(CliError::from)?;

    if !matches!(ctx.format, OutputFormat::Table) {
        return print_value(&outcome, ctx.format);
    }

    section("Reconciliation");
    match outcome {
        ExecutionOutcome::NoActionRequired => {
            output::success("All declared constraints already in place")
        }
        ExecutionOutcome::DryRun { planned } => {
            output::info(&format!("{} action(s) planned, nothing changed (dry run)", planned))
        }
        ExecutionOutcome::Completed { applied, removed } => output::success(&format!(
            "{} constraint(s) applied, {} removed",
            applied, removed
        )),
    }
    Ok(())
}
