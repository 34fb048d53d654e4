use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use location_shared_types::{Ensure, LocationConstraint, LocationError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The desired state of one constraint, handed to [`ConstraintProvider::apply`].
///
/// Everything a flush needs travels in this value; providers keep no pending
/// state between calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StagedChange {
    pub constraint: LocationConstraint,
}

impl StagedChange {
    pub fn new(constraint: LocationConstraint) -> Self {
        Self { constraint }
    }

    pub fn name(&self) -> &str {
        &self.constraint.name
    }

    pub fn ensure(&self) -> Ensure {
        self.constraint.ensure
    }

    pub fn cib(&self) -> Option<&str> {
        self.constraint.cib.as_deref()
    }

    /// True when the change carries a non-empty rule.
    pub fn has_rule(&self) -> bool {
        self.constraint.has_rule()
    }
}

impl From<LocationConstraint> for StagedChange {
    fn from(constraint: LocationConstraint) -> Self {
        Self::new(constraint)
    }
}

/// Trait for a backend able to read and write location constraints
/// (e.g., pcs, crmsh).
#[async_trait]
pub trait ConstraintProvider: Send + Sync {
    /// Name under which this provider is registered.
    fn name(&self) -> &str;

    /// Lists the constraints currently configured in the cluster, in CIB order.
    async fn discover(&self) -> Result<Vec<LocationConstraint>>;

    /// Makes the cluster match the staged change.
    ///
    /// A change with `ensure: absent` removes the constraint.
    async fn apply(&self, change: &StagedChange) -> Result<()>;

    /// Removes a constraint by id, optionally inside a shadow CIB.
    async fn remove(&self, name: &str, cib: Option<&str>) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider not registered: {0}")]
    NotRegistered(String),
    #[error("Provider already registered: {0}")]
    AlreadyRegistered(String),
}

impl From<ProviderError> for LocationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotRegistered(name) => LocationError::ProviderNotFound(name),
            other => LocationError::Config(other.to_string()),
        }
    }
}

/// Named constraint providers available to the reconciliation engine.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ConstraintProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn ConstraintProvider>) -> Result<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(ProviderError::AlreadyRegistered(name).into());
        }
        debug!("Registering constraint provider {}", name);
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ConstraintProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NotRegistered(name.to_string()).into())
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
