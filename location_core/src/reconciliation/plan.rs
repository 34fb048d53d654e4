//! Plan phase: turns a [`Diff`] into the ordered list of provider calls.
//!
//! Removals run first so that a constraint being replaced under a new id does
//! not briefly coexist with the old one, then creations, then updates. Within
//! each group actions are ordered by constraint name.

use location_provider_interface::StagedChange;
use serde::{Deserialize, Serialize};

use super::compare::Diff;

/// Type of action to perform during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
        }
    }
}

/// One provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub change: StagedChange,
}

impl Action {
    pub fn name(&self) -> &str {
        self.change.name()
    }
}

/// Ordered actions for one reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub actions: Vec<Action>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

pub fn plan(diff: &Diff) -> ReconciliationPlan {
    let mut actions = Vec::with_capacity(diff.total_changes());

    for (action_type, group) in [
        (ActionType::Delete, &diff.deletions),
        (ActionType::Create, &diff.additions),
        (ActionType::Update, &diff.modifications),
    ] {
        let mut group: Vec<Action> = group
            .iter()
            .map(|c| Action {
                action_type,
                change: StagedChange::new(c.desired.clone()),
            })
            .collect();
        group.sort_by(|a, b| a.name().cmp(b.name()));
        actions.extend(group);
    }

    ReconciliationPlan { actions }
}
