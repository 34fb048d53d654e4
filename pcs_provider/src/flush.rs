//! Translation of a pending constraint into pcs commands.
//!
//! A flush always emits the base `constraint location add` command for a
//! non-empty pending state, and additionally a `constraint location ... rule`
//! command whenever a rule is present. Neither depends on what the cluster
//! currently holds.

use location_shared_types::{
    LocationConstraint, Rule, RuleValue, EXPRESSION_KEY, SCORE_ATTRIBUTE_KEY, SCORE_KEY,
};

use crate::pcs_cli::PcsCommand;

/// Arguments of a `pcs constraint location <primitive> rule` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleArguments {
    /// `score=<v>` or `score-attribute=<v>`; `None` lets pcs default to
    /// `score=INFINITY`.
    pub score: Option<String>,
    /// `[attribute, operation, value]`, empty when the rule has no expression.
    pub expression: Vec<String>,
}

/// Walks the rule in order; a later `expression` or score entry replaces an
/// earlier one.
pub fn rule_arguments(rule: &Rule) -> RuleArguments {
    let mut args = RuleArguments::default();
    for (key, value) in rule.iter() {
        match key {
            EXPRESSION_KEY => {
                args.expression = match value {
                    RuleValue::Map(expr) => ["attribute", "operation", "value"]
                        .iter()
                        .map(|field| expr.get(*field).cloned().unwrap_or_default())
                        .collect(),
                    RuleValue::Text(_) => Vec::new(),
                };
            }
            SCORE_KEY | SCORE_ATTRIBUTE_KEY => {
                args.score = Some(format!("{}={}", key, value));
            }
            _ => {}
        }
    }
    args
}

/// `pcs constraint location add` for the pending state; absent fields are
/// passed as empty arguments.
pub fn add_command(pending: &LocationConstraint) -> PcsCommand {
    PcsCommand::location_add(
        &pending.name,
        pending.primitive.as_deref().unwrap_or_default(),
        pending.node_name.as_deref().unwrap_or_default(),
        pending.score.as_ref().map(|s| s.as_str()).unwrap_or_default(),
    )
    .in_cib(pending.cib.as_deref())
}

/// `pcs constraint location <primitive> rule ...`, if the pending state has a rule.
pub fn rule_command(pending: &LocationConstraint) -> Option<PcsCommand> {
    let rule = pending.rule.as_ref()?;
    let args = rule_arguments(rule);
    Some(
        PcsCommand::location_rule(
            pending.primitive.as_deref().unwrap_or_default(),
            args.score.as_deref(),
            &args.expression,
        )
        .in_cib(pending.cib.as_deref()),
    )
}

/// All commands a flush issues for `pending`, in execution order.
pub fn flush_commands(pending: Option<&LocationConstraint>) -> Vec<PcsCommand> {
    let Some(pending) = pending else {
        return Vec::new();
    };
    let mut commands = vec![add_command(pending)];
    commands.extend(rule_command(pending));
    commands
}
