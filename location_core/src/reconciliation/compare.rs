//! Compare phase: declared constraints against the constraints found in the
//! cluster.
//!
//! Constraints are matched by name. Only declared constraints are managed:
//! anything found in the cluster that nobody declared is left untouched.
//!
//! Declared and discovered rules have different shapes. A declared rule holds
//! an `expression` map (`attribute`, `operation`, `value`) and maybe a score;
//! discovery reads back one `name -> value` pair per expression element and
//! no score. Rules are therefore compared on the expression values only.

use std::collections::HashMap;

use location_shared_types::{Ensure, LocationConstraint, Rule, RuleValue, EXPRESSION_KEY};
use serde::{Deserialize, Serialize};

/// A change to one constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintChange {
    pub name: String,
    /// What the cluster holds now, if anything
    pub current: Option<LocationConstraint>,
    /// What was declared
    pub desired: LocationConstraint,
}

/// Categorised differences between declared and discovered constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    /// Declared present, not in the cluster
    pub additions: Vec<ConstraintChange>,

    /// Declared present, in the cluster with other placement attributes
    pub modifications: Vec<ConstraintChange>,

    /// Declared absent, still in the cluster
    pub deletions: Vec<ConstraintChange>,

    /// Names already in the declared state
    pub unchanged: Vec<String>,
}

impl Diff {
    /// Creates an empty diff
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the total number of changes (additions + modifications + deletions)
    pub fn total_changes(&self) -> usize {
        self.additions.len() + self.modifications.len() + self.deletions.len()
    }

    /// Returns true if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}

/// Expression value the rule command writes; the last `expression` wins.
fn declared_rule_values(rule: Option<&Rule>) -> Vec<String> {
    let expression = rule
        .into_iter()
        .flat_map(|r| r.iter())
        .filter(|(key, _)| *key == EXPRESSION_KEY)
        .last();
    match expression {
        Some((_, RuleValue::Map(expr))) => vec![expr.get("value").cloned().unwrap_or_default()],
        _ => Vec::new(),
    }
}

fn discovered_rule_values(rule: Option<&Rule>) -> Vec<String> {
    let mut values: Vec<String> = rule
        .into_iter()
        .flat_map(|r| r.iter())
        .filter_map(|(_, value)| value.as_text().map(str::to_string))
        .collect();
    values.sort();
    values
}

/// Whether a discovered constraint already has the declared placement.
/// `cib` and `ensure` do not take part.
fn matches_discovered(declared: &LocationConstraint, discovered: &LocationConstraint) -> bool {
    declared.primitive == discovered.primitive
        && declared.node_name == discovered.node_name
        && declared.score == discovered.score
        && declared_rule_values(declared.rule.as_ref())
            == discovered_rule_values(discovered.rule.as_ref())
}

/// Compare `desired` against `current`.
///
/// Deterministic: the result only depends on the inputs and each category
/// keeps the order of `desired`.
pub fn compare(desired: &[LocationConstraint], current: &[LocationConstraint]) -> Diff {
    let by_name: HashMap<&str, &LocationConstraint> =
        current.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut diff = Diff::empty();
    for want in desired {
        let have = by_name.get(want.name.as_str()).copied();
        let change = || ConstraintChange {
            name: want.name.clone(),
            current: have.cloned(),
            desired: want.clone(),
        };

        match (want.ensure, have) {
            (Ensure::Absent, Some(_)) => diff.deletions.push(change()),
            (Ensure::Absent, None) => diff.unchanged.push(want.name.clone()),
            (Ensure::Present, None) => diff.additions.push(change()),
            (Ensure::Present, Some(existing)) if matches_discovered(want, existing) => {
                diff.unchanged.push(want.name.clone())
            }
            (Ensure::Present, Some(_)) => diff.modifications.push(change()),
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web() -> LocationConstraint {
        LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_node("node1")
            .with_score("100")
    }

    #[test]
    fn test_new_constraint_is_addition() {
        let diff = compare(&[web()], &[]);
        assert_eq!(diff.additions.len(), 1);
        assert!(diff.additions[0].current.is_none());
        assert!(diff.has_changes());
    }

    #[test]
    fn test_discovered_empty_rule_matches_declared_without_rule() {
        let discovered = web().with_rule(Rule::new());
        let diff = compare(&[web()], &[discovered]);
        assert_eq!(diff.unchanged, vec!["loc-web".to_string()]);
        assert!(!diff.has_changes());
    }

    fn discovered_rule(value: &str) -> Rule {
        Rule::new().with_entry("", value)
    }

    #[test]
    fn test_declared_rule_matches_its_discovered_form() {
        let declared = web().with_rule(
            Rule::expression("#uname", "eq", "node1").with_entry("score", "INFINITY"),
        );
        let discovered = web().with_rule(discovered_rule("node1"));

        let diff = compare(&[declared], &[discovered]);
        assert_eq!(diff.unchanged, vec!["loc-web".to_string()]);
    }

    #[test]
    fn test_changed_rule_value_is_modification() {
        let declared = web().with_rule(Rule::expression("#uname", "eq", "node2"));
        let discovered = web().with_rule(discovered_rule("node1"));
        assert_eq!(compare(&[declared], &[discovered]).modifications.len(), 1);

        let declared = web().with_rule(Rule::expression("#uname", "eq", "node1"));
        assert_eq!(compare(&[declared], &[web()]).modifications.len(), 1);
    }

    #[test]
    fn test_rule_removed_from_declaration_is_modification() {
        let discovered = web().with_rule(discovered_rule("node1"));
        assert_eq!(compare(&[web()], &[discovered]).modifications.len(), 1);
    }

    #[test]
    fn test_changed_score_is_modification() {
        let discovered = web().with_score("-INFINITY");
        let diff = compare(&[web()], &[discovered.clone()]);
        assert_eq!(diff.modifications.len(), 1);
        assert_eq!(diff.modifications[0].current, Some(discovered));
    }

    #[test]
    fn test_absent_constraint() {
        let absent = web().with_ensure(Ensure::Absent);
        let diff = compare(&[absent.clone()], &[web()]);
        assert_eq!(diff.deletions.len(), 1);

        let diff = compare(&[absent], &[]);
        assert!(!diff.has_changes());
        assert_eq!(diff.unchanged.len(), 1);
    }

    #[test]
    fn test_undeclared_constraints_left_alone() {
        let other = LocationConstraint::new("loc-other").with_primitive("x");
        let diff = compare(&[], &[other]);
        assert_eq!(diff, Diff::empty());
    }

    #[test]
    fn test_compare_is_deterministic() {
        let desired = vec![web(), LocationConstraint::new("loc-db").with_primitive("db")];
        let current = vec![web().with_node("node2")];
        assert_eq!(compare(&desired, &current), compare(&desired, &current));
    }
}
