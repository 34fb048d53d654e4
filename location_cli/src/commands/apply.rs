//! Apply command - apply each constraint of a manifest.

use std::path::PathBuf;

use clap::Args;
use location_core::ConstraintManifest;
use location_provider_interface::StagedChange;
use location_shared_types::Ensure;

use super::Context;
use crate::output;

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// Manifest file (YAML)
    #[arg(short, long)]
    file: PathBuf,
}

/// Execute the apply command.
///
/// Every constraint is written as declared, whether or not the cluster
/// already holds it. Use `reconcile` to only touch what differs.
pub async fn execute(args: ApplyArgs, ctx: &Context) -> anyhow::Result<()> {
    let manifest = ConstraintManifest::load(&args.file)?;
    if manifest.is_empty() {
        output::warn(&format!("{} declares no constraints", args.file.display()));
        return Ok(());
    }

    let provider = ctx.provider(None)?;
    for constraint in manifest.constraints {
        let name = constraint.name.clone();
        let ensure = constraint.ensure;
        output::info(&format!("Applying {} ({})", name, ensure));

        provider.apply(&StagedChange::new(constraint)).await?;

        match ensure {
            Ensure::Present => output::success(&format!("Constraint '{}' applied", name)),
            Ensure::Absent => output::success(&format!("Constraint '{}' removed", name)),
        }
    }

    Ok(())
}
