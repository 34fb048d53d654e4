//! Remove command - delete one location constraint.

use clap::Args;

use super::Context;
use crate::error::CliError;
use crate::output;

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Constraint id
    name: String,

    /// Remove from this shadow CIB instead of the live one
    #[arg(long)]
    cib: Option<String>,
}

/// Execute the remove command.
pub async fn execute(args: RemoveArgs, ctx: &Context) -> anyhow::Result<()> {
    if args.name.trim().is_empty() {
        return Err(CliError::invalid_argument("constraint name must not be empty").into());
    }

    let provider = ctx.provider(args.cib.clone())?;
    provider
        .remove(&args.name, args.cib.as_deref())
        .await
        .map_err(CliError::from)?;

    output::success(&format!("Constraint '{}' removed", args.name));
    Ok(())
}
