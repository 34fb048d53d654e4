//! pcs-backed location constraint provider.
//!
//! [`LocationConstraintProvider`] manages one constraint the way a
//! configuration-management provider does: property reads and writes go to a
//! pending state, `create` stages a whole constraint, `flush` turns the
//! pending state into pcs commands and `destroy` removes the constraint right
//! away.
//!
//! [`PcsLocationProvider`] exposes the same behaviour through the
//! [`ConstraintProvider`] interface, staging and flushing in one call.

use std::sync::Arc;

use async_trait::async_trait;
use location_provider_interface::{ConstraintProvider, StagedChange};
use location_shared_types::{Ensure, LocationConstraint, LocationError, Result, Rule, Score};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cib::parse_locations;
use crate::flush::flush_commands;
use crate::pcs_cli::{CommandRunner, PcsCliConfig, PcsCommand};
use crate::readiness::wait_until_ready;

/// Provider instance for a single location constraint.
pub struct LocationConstraintProvider {
    runner: Arc<dyn CommandRunner>,
    name: String,
    /// Shadow CIB used when nothing is pending.
    cib: Option<String>,
    pending: Option<LocationConstraint>,
}

impl LocationConstraintProvider {
    /// Provider for the constraint called `name`, with nothing pending.
    pub fn new(runner: Arc<dyn CommandRunner>, name: impl Into<String>) -> Self {
        Self {
            runner,
            name: name.into(),
            cib: None,
            pending: None,
        }
    }

    /// Provider seeded with a constraint read from the cluster.
    pub fn from_discovered(runner: Arc<dyn CommandRunner>, constraint: LocationConstraint) -> Self {
        Self {
            runner,
            name: constraint.name.clone(),
            cib: constraint.cib.clone(),
            pending: Some(constraint),
        }
    }

    pub fn with_cib(mut self, cib: Option<String>) -> Self {
        self.cib = cib;
        self
    }

    /// Discover every location constraint in the cluster.
    ///
    /// Waits for the cluster to become ready first.
    pub async fn instances(
        runner: Arc<dyn CommandRunner>,
        config: &PcsCliConfig,
        cancel: Option<watch::Receiver<bool>>,
        cib: Option<&str>,
    ) -> Result<Vec<Self>> {
        wait_until_ready(runner.as_ref(), config, cancel).await?;

        let output = runner
            .run_checked(&PcsCommand::cluster_cib().in_cib(cib))
            .await?;
        let constraints = parse_locations(&output.stdout)?;
        info!("Discovered {} location constraint(s)", constraints.len());

        Ok(constraints
            .into_iter()
            .map(|mut c| {
                c.cib = cib.map(str::to_string);
                Self::from_discovered(Arc::clone(&runner), c)
            })
            .collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pending state, `None` when nothing is staged.
    pub fn properties(&self) -> Option<&LocationConstraint> {
        self.pending.as_ref()
    }

    pub fn into_properties(self) -> Option<LocationConstraint> {
        self.pending
    }

    /// Stage `desired` as the full pending state. Nothing runs until [`flush`](Self::flush).
    pub fn create(&mut self, desired: &LocationConstraint) {
        self.pending = Some(LocationConstraint {
            name: desired.name.clone(),
            primitive: desired.primitive.clone(),
            node_name: desired.node_name.clone(),
            score: desired.score.clone(),
            rule: desired.rule.clone(),
            cib: desired.cib.clone(),
            ensure: Ensure::Present,
        });
    }

    /// Remove the constraint from the cluster now and drop the pending state.
    ///
    /// The pending state is kept if pcs fails.
    pub async fn destroy(&mut self) -> Result<()> {
        debug!("Removing location {}", self.name);
        let cib = self
            .pending
            .as_ref()
            .and_then(|p| p.cib.as_deref())
            .or(self.cib.as_deref());
        let command = PcsCommand::resource_remove(&self.name).in_cib(cib);
        self.runner.run_checked(&command).await?;
        self.pending = None;
        Ok(())
    }

    pub fn primitive(&self) -> Option<&str> {
        self.pending.as_ref()?.primitive.as_deref()
    }

    pub fn node_name(&self) -> Option<&str> {
        self.pending.as_ref()?.node_name.as_deref()
    }

    pub fn score(&self) -> Option<&Score> {
        self.pending.as_ref()?.score.as_ref()
    }

    pub fn rule(&self) -> Option<&Rule> {
        self.pending.as_ref()?.rule.as_ref()
    }

    fn pending_mut(&mut self) -> &mut LocationConstraint {
        let name = &self.name;
        self.pending
            .get_or_insert_with(|| LocationConstraint::new(name.clone()))
    }

    pub fn set_primitive(&mut self, primitive: Option<String>) {
        self.pending_mut().primitive = primitive;
    }

    pub fn set_node_name(&mut self, node_name: Option<String>) {
        self.pending_mut().node_name = node_name;
    }

    pub fn set_score(&mut self, score: Option<Score>) {
        self.pending_mut().score = score;
    }

    pub fn set_rule(&mut self, rule: Option<Rule>) {
        self.pending_mut().rule = rule;
    }

    /// Replay the pending state as pcs commands.
    ///
    /// Runs every time it is called; there is no comparison with what the
    /// cluster already holds. A failure leaves earlier commands applied.
    pub async fn flush(&self) -> Result<()> {
        let commands = flush_commands(self.pending.as_ref());
        if commands.len() > 1 {
            if let Some(p) = self.pending.as_ref().filter(|p| p.node_name.is_none()) {
                warn!(
                    "Constraint {} has a rule but no node; the base location command may add a redundant constraint",
                    p.name
                );
            }
        }
        for command in &commands {
            self.runner.run_checked(command).await?;
        }
        debug!("Flushed {} command(s) for {}", commands.len(), self.name);
        Ok(())
    }
}

impl std::fmt::Debug for LocationConstraintProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationConstraintProvider")
            .field("name", &self.name)
            .field("cib", &self.cib)
            .field("pending", &self.pending)
            .finish()
    }
}

/// [`ConstraintProvider`] backed by pcs.
pub struct PcsLocationProvider {
    runner: Arc<dyn CommandRunner>,
    config: PcsCliConfig,
    cancel: Option<watch::Receiver<bool>>,
    cib: Option<String>,
}

impl PcsLocationProvider {
    pub const NAME: &'static str = "pcs";

    pub fn new(runner: Arc<dyn CommandRunner>, config: PcsCliConfig) -> Self {
        Self {
            runner,
            config,
            cancel: None,
            cib: None,
        }
    }

    /// Abort readiness waits, and refuse further writes, once `cancel` turns
    /// true.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Discover from a shadow CIB instead of the live one.
    pub fn with_cib(mut self, cib: Option<String>) -> Self {
        self.cib = cib;
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(rx) if *rx.borrow() => Err(LocationError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ConstraintProvider for PcsLocationProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn discover(&self) -> Result<Vec<LocationConstraint>> {
        let instances = LocationConstraintProvider::instances(
            Arc::clone(&self.runner),
            &self.config,
            self.cancel.clone(),
            self.cib.as_deref(),
        )
        .await?;
        Ok(instances
            .into_iter()
            .filter_map(LocationConstraintProvider::into_properties)
            .collect())
    }

    async fn apply(&self, change: &StagedChange) -> Result<()> {
        self.check_cancelled()?;
        if change.ensure() == Ensure::Absent {
            return self.remove(change.name(), change.cib()).await;
        }
        info!(
            rule = change.has_rule(),
            "Applying location constraint {}",
            change.name()
        );
        let mut provider = LocationConstraintProvider::new(Arc::clone(&self.runner), change.name());
        provider.create(&change.constraint);
        provider.flush().await
    }

    async fn remove(&self, name: &str, cib: Option<&str>) -> Result<()> {
        self.check_cancelled()?;
        info!("Removing location constraint {}", name);
        let mut provider = LocationConstraintProvider::new(Arc::clone(&self.runner), name)
            .with_cib(cib.map(str::to_string));
        provider.destroy().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;
    use crate::pcs_cli::CommandOutput;

    fn runner() -> Arc<MockRunner> {
        Arc::new(MockRunner::new())
    }

    fn desired() -> LocationConstraint {
        LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_node("node1")
            .with_score("INFINITY")
    }

    #[test]
    fn test_create_stages_without_running() {
        let mock = runner();
        let mut provider = LocationConstraintProvider::new(mock.clone(), "loc-web");
        assert!(provider.properties().is_none());

        provider.create(&desired().with_ensure(Ensure::Absent));
        let pending = provider.properties().unwrap();
        assert_eq!(pending.ensure, Ensure::Present);
        assert!(pending.rule.is_none());
        assert_eq!(provider.primitive(), Some("web"));
        assert_eq!(provider.node_name(), Some("node1"));
        assert_eq!(provider.score(), Some(&Score::from("INFINITY")));
    }

    #[tokio::test]
    async fn test_create_then_destroy_only_removes() {
        let mock = runner();
        let mut provider = LocationConstraintProvider::new(mock.clone(), "loc-web");
        provider.create(&desired());
        provider.destroy().await.unwrap();

        assert_eq!(mock.commands().await, vec![PcsCommand::resource_remove("loc-web")]);
        assert!(provider.properties().is_none());

        provider.flush().await.unwrap();
        assert_eq!(mock.commands().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_destroy_keeps_pending() {
        let mock = runner();
        mock.respond(
            &["constraint", "resource", "remove"],
            CommandOutput::failed(1, "Error: Unable to find constraint"),
        )
        .await;
        let mut provider = LocationConstraintProvider::new(mock.clone(), "loc-web");
        provider.create(&desired());

        let err = provider.destroy().await.unwrap_err();
        assert!(matches!(err, LocationError::Command(_)));
        assert!(provider.properties().is_some());
    }

    #[tokio::test]
    async fn test_setter_on_empty_state_makes_flush_run() {
        let mock = runner();
        let mut provider = LocationConstraintProvider::new(mock.clone(), "loc-web");
        provider.set_score(Some(Score::from("50")));
        assert!(provider.primitive().is_none());

        provider.flush().await.unwrap();
        assert_eq!(
            mock.commands().await,
            vec![PcsCommand::location_add("loc-web", "", "", "50")]
        );
    }

    #[tokio::test]
    async fn test_destroy_uses_shadow_cib() {
        let mock = runner();
        let mut provider = LocationConstraintProvider::new(mock.clone(), "loc-web")
            .with_cib(Some("staging".to_string()));
        provider.destroy().await.unwrap();
        assert_eq!(mock.commands().await[0].cib(), Some("staging"));
    }

    #[tokio::test]
    async fn test_apply_absent_removes() {
        let mock = runner();
        let provider = PcsLocationProvider::new(mock.clone(), PcsCliConfig::default());
        let change = StagedChange::new(desired().with_ensure(Ensure::Absent));
        provider.apply(&change).await.unwrap();
        assert_eq!(mock.commands().await, vec![PcsCommand::resource_remove("loc-web")]);
    }

    #[tokio::test]
    async fn test_flush_stops_on_first_failure() {
        let mock = runner();
        mock.respond(
            &["constraint", "location", "add"],
            CommandOutput::failed(1, "Error: duplicate constraint"),
        )
        .await;
        let mut provider = LocationConstraintProvider::new(mock.clone(), "loc-web");
        provider.create(&desired().with_rule(Rule::expression("#uname", "eq", "node1")));

        assert!(provider.flush().await.is_err());
        assert_eq!(mock.commands().await.len(), 1);
    }

    #[tokio::test]
    async fn test_writes_refused_after_cancel() {
        let mock = runner();
        let (tx, rx) = watch::channel(false);
        let provider =
            PcsLocationProvider::new(mock.clone(), PcsCliConfig::default()).with_cancel(rx);

        provider.apply(&StagedChange::new(desired())).await.unwrap();
        assert_eq!(mock.mutations().await.len(), 1);

        tx.send(true).unwrap();
        let err = provider.apply(&StagedChange::new(desired())).await.unwrap_err();
        assert!(matches!(err, LocationError::Cancelled));
        let err = provider.remove("loc-web", None).await.unwrap_err();
        assert!(matches!(err, LocationError::Cancelled));
        assert_eq!(mock.mutations().await.len(), 1);
    }
}
