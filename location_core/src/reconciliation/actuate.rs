//! Actuate phase: runs a plan against a provider, one action at a time.

use location_provider_interface::ConstraintProvider;
use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};

use super::plan::{ActionType, ReconciliationPlan};
use super::ReconciliationError;

/// Result of a reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// Declared and discovered state already agree
    NoActionRequired,
    /// Plan computed but not executed
    DryRun { planned: usize },
    /// Every planned action ran
    Completed { applied: usize, removed: usize },
}

/// Execute `plan` in order, stopping at the first failure.
///
/// Actions that ran before the failure stay applied.
pub async fn execute(
    provider: &dyn ConstraintProvider,
    plan: &ReconciliationPlan,
) -> Result<ExecutionOutcome, ReconciliationError> {
    let mut applied = 0;
    let mut removed = 0;

    for action in &plan.actions {
        let span = observability::constraint_span!(action.action_type, action.name());
        let result = async {
            info!("Executing {} {}", action.action_type, action.name());
            match action.action_type {
                ActionType::Delete => {
                    provider
                        .remove(action.name(), action.change.cib())
                        .await
                }
                ActionType::Create | ActionType::Update => provider.apply(&action.change).await,
            }
        }
        .instrument(span)
        .await;

        if let Err(e) = result {
            error!("{} {} failed: {}", action.action_type, action.name(), e);
            return Err(ReconciliationError::Actuate {
                constraint: action.name().to_string(),
                completed: applied + removed,
                message: e.to_string(),
            });
        }

        match action.action_type {
            ActionType::Delete => removed += 1,
            _ => applied += 1,
        }
    }

    Ok(ExecutionOutcome::Completed { applied, removed })
}
