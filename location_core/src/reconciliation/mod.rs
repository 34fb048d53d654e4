//! Reconciliation of declared location constraints.
//!
//! One cycle drives the cluster toward the declared constraints:
//! 1. **Sense**: discover the constraints the cluster holds
//! 2. **Compare**: diff them against the declared ones
//! 3. **Plan**: order the provider calls
//! 4. **Actuate**: run them, one at a time
//!
//! ```text
//! ┌──────────┐      ┌─────────┐      ┌──────┐      ┌─────────┐
//! │ discover │─────▶│ Compare │─────▶│ Plan │─────▶│ Actuate │
//! └──────────┘      └─────────┘      └──────┘      └─────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use location_core::reconciliation::ReconciliationLoop;
//!
//! let reconciliation = ReconciliationLoop::from_registry(&registry, "pcs")?;
//! let outcome = reconciliation.run_cycle(&manifest.constraints).await?;
//! ```

pub mod actuate;
pub mod compare;
pub mod plan;

pub use actuate::{execute, ExecutionOutcome};
pub use compare::{compare, ConstraintChange, Diff};
pub use plan::{plan, Action, ActionType, ReconciliationPlan};

use std::sync::Arc;

use location_provider_interface::{ConstraintProvider, ProviderRegistry};
use location_shared_types::{LocationConstraint, LocationError};
use thiserror::Error;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

/// Error type for reconciliation operations.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Error during the discovery phase
    #[error("Sense error: {0}")]
    Sense(#[source] LocationError),

    /// An action failed; earlier actions stay applied
    #[error("Actuate error on {constraint} after {completed} completed action(s): {message}")]
    Actuate {
        constraint: String,
        completed: usize,
        message: String,
    },
}

/// The reconciliation control loop for one provider.
pub struct ReconciliationLoop {
    provider: Arc<dyn ConstraintProvider>,
    dry_run: bool,
}

impl ReconciliationLoop {
    pub fn new(provider: Arc<dyn ConstraintProvider>) -> Self {
        Self {
            provider,
            dry_run: false,
        }
    }

    /// Use the provider registered under `name`.
    pub fn from_registry(registry: &ProviderRegistry, name: &str) -> Result<Self, LocationError> {
        Ok(Self::new(registry.get(name)?))
    }

    /// Plan only, without calling the provider's write operations.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Discover, compare and plan without executing anything.
    pub async fn plan_cycle(
        &self,
        desired: &[LocationConstraint],
    ) -> Result<(Diff, ReconciliationPlan), ReconciliationError> {
        let current = self
            .provider
            .discover()
            .await
            .map_err(ReconciliationError::Sense)?;

        let diff = compare(desired, &current);
        debug!(
            additions = diff.additions.len(),
            modifications = diff.modifications.len(),
            deletions = diff.deletions.len(),
            unchanged = diff.unchanged.len(),
            "Compared declared and discovered constraints"
        );
        let plan = plan(&diff);
        Ok((diff, plan))
    }

    /// Execute a single reconciliation cycle.
    pub async fn run_cycle(
        &self,
        desired: &[LocationConstraint],
    ) -> Result<ExecutionOutcome, ReconciliationError> {
        let correlation_id = Uuid::new_v4();
        let span = observability::reconcile_span!(correlation_id);

        async {
            let (diff, plan) = self.plan_cycle(desired).await?;

            if !diff.has_changes() {
                info!("All {} declared constraint(s) in sync", desired.len());
                return Ok(ExecutionOutcome::NoActionRequired);
            }

            if self.dry_run {
                for action in &plan.actions {
                    info!("Would {} {}", action.action_type, action.name());
                }
                return Ok(ExecutionOutcome::DryRun {
                    planned: plan.len(),
                });
            }

            let outcome = execute(self.provider.as_ref(), &plan).await?;
            info!("Reconciliation cycle completed: {:?}", outcome);
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}
