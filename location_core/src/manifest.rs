//! Declared constraints, as written by the operator.
//!
//! ```yaml
//! constraints:
//!   - name: loc-web
//!     primitive: web
//!     node_name: node1
//!     score: 100
//!   - name: loc-old
//!     ensure: absent
//! ```

use std::collections::HashSet;
use std::path::Path;

use location_shared_types::{LocationConstraint, LocationError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintManifest {
    #[serde(default)]
    pub constraints: Vec<LocationConstraint>,
}

impl ConstraintManifest {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LocationError::Config(format!("Invalid manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            LocationError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Names must be non-empty and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for constraint in &self.constraints {
            if constraint.name.is_empty() {
                return Err(LocationError::Config(
                    "Constraint name must not be empty".to_string(),
                ));
            }
            if !seen.insert(constraint.name.as_str()) {
                return Err(LocationError::Config(format!(
                    "Duplicate constraint name: {}",
                    constraint.name
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}
