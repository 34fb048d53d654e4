use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod rule;
mod score;

pub use rule::{Rule, RuleValue, EXPRESSION_KEY, SCORE_ATTRIBUTE_KEY, SCORE_KEY};
pub use score::Score;

/// Constraint ids are plain strings chosen by whoever declared them.
pub type ConstraintName = String;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Cluster command failed: {0}")]
    Command(String),
    #[error("Constraint discovery failed: {0}")]
    Discovery(String),
    #[error("Cluster not ready after {0:?}")]
    ReadinessTimeout(Duration),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Lifecycle flag of a declared constraint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl std::fmt::Display for Ensure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ensure::Present => write!(f, "present"),
            Ensure::Absent => write!(f, "absent"),
        }
    }
}

// A resource-location constraint, either declared by a user or rebuilt from the CIB
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LocationConstraint {
    pub name: ConstraintName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,
    /// Shadow CIB to operate against instead of the live one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cib: Option<String>,
    #[serde(default)]
    pub ensure: Ensure,
}

impl LocationConstraint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_primitive(mut self, primitive: impl Into<String>) -> Self {
        self.primitive = Some(primitive.into());
        self
    }

    pub fn with_node(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    pub fn with_score(mut self, score: impl Into<Score>) -> Self {
        self.score = Some(score.into());
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_cib(mut self, cib: impl Into<String>) -> Self {
        self.cib = Some(cib.into());
        self
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    /// True when the placement is driven by a non-empty rule.
    pub fn has_rule(&self) -> bool {
        self.rule.as_ref().is_some_and(|r| !r.is_empty())
    }
}

// Generic result type for location constraint operations
pub type Result<T> = std::result::Result<T, LocationError>;
