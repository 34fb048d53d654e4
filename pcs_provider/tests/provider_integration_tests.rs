//! Integration tests for the pcs location provider
//!
//! These tests drive the provider against a recording runner and verify:
//! - Discovery of constraints from a CIB dump
//! - Commands issued by create / flush / destroy
//! - The interface-level apply / remove / discover calls

use std::sync::Arc;
use std::time::Duration;

use location_shared_types::{Ensure, LocationConstraint, LocationError, Rule, RuleValue, Score};
use pcs_provider::{
    CommandOutput, ConstraintProvider, LocationConstraintProvider, MockRunner, PcsCliConfig,
    PcsCommand, PcsLocationProvider, StagedChange,
};

const CIB: &str = r##"<?xml version="1.0"?>
<cib crm_feature_set="3.16.2" validate-with="pacemaker-3.9" epoch="40" num_updates="0" admin_epoch="0">
  <configuration>
    <constraints>
      <rsc_location id="location-vip-node1" rsc="vip" node="node1" score="100"/>
      <rsc_location id="location-web-ping" rsc="web">
        <rule id="location-web-ping-rule" score-attribute="pingd">
          <expression id="e1" name="pingd" value="0" attribute="pingd" operation="gt"/>
          <expression id="e2" name="#uname" value="node3" attribute="#uname" operation="ne"/>
        </rule>
      </rsc_location>
      <rsc_location id="location-db-avoid" rsc="db" node="node2" score="-INFINITY"/>
    </constraints>
  </configuration>
  <status/>
</cib>"##;

// ============================================================================
// Helpers
// ============================================================================

fn fast_config() -> PcsCliConfig {
    PcsCliConfig {
        ready_timeout: Duration::from_secs(5),
        ready_poll_interval: Duration::from_millis(100),
        ready_settle: Duration::from_millis(10),
        ..Default::default()
    }
}

async fn cluster_with(xml: &str) -> Arc<MockRunner> {
    Arc::new(MockRunner::new().with_cib(xml).await)
}

fn args(cmd: &PcsCommand) -> Vec<&str> {
    cmd.args().iter().map(String::as_str).collect()
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_instances_one_per_rsc_location() {
    let runner = cluster_with(CIB).await;
    let instances = LocationConstraintProvider::instances(runner.clone(), &fast_config(), None, None)
        .await
        .unwrap();

    assert_eq!(instances.len(), 3);
    let names: Vec<&str> = instances.iter().map(|i| i.name()).collect();
    assert_eq!(
        names,
        vec!["location-vip-node1", "location-web-ping", "location-db-avoid"]
    );

    let vip = &instances[0];
    assert_eq!(vip.primitive(), Some("vip"));
    assert_eq!(vip.node_name(), Some("node1"));
    assert_eq!(vip.score(), Some(&Score::from("100")));
    assert_eq!(vip.rule(), Some(&Rule::new()));
    assert_eq!(vip.properties().unwrap().ensure, Ensure::Present);

    let web = &instances[1];
    let rule = web.rule().unwrap();
    assert_eq!(rule.get("pingd"), Some(&RuleValue::Text("0".to_string())));
    assert_eq!(rule.get("#uname"), Some(&RuleValue::Text("node3".to_string())));
    assert!(web.node_name().is_none());

    // readiness check runs before the dump
    let commands = runner.commands().await;
    assert_eq!(commands[0], PcsCommand::dc_version());
    assert_eq!(commands[1], PcsCommand::cluster_cib());
    assert!(runner.mutations().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_instances_empty_cluster() {
    let runner = cluster_with("<cib><configuration><constraints/></configuration></cib>").await;
    let instances = LocationConstraintProvider::instances(runner, &fast_config(), None, None)
        .await
        .unwrap();
    assert!(instances.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_instances_malformed_cib() {
    let runner = cluster_with("<cib><constraints></cib>").await;
    let err = LocationConstraintProvider::instances(runner, &fast_config(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocationError::Discovery(_)));
}

#[tokio::test(start_paused = true)]
async fn test_instances_cib_command_failure() {
    let runner = Arc::new(MockRunner::new());
    runner
        .respond(&["cluster", "cib"], CommandOutput::failed(1, "Error: unable to get cib"))
        .await;
    let err = LocationConstraintProvider::instances(runner, &fast_config(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocationError::Command(_)));
}

#[tokio::test(start_paused = true)]
async fn test_instances_not_ready() {
    let runner = cluster_with(CIB).await;
    runner
        .respond(&["property", "show"], CommandOutput::failed(1, "Error: cluster is not currently running"))
        .await;
    let err = LocationConstraintProvider::instances(runner.clone(), &fast_config(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LocationError::ReadinessTimeout(_)));
    assert!(!runner.commands().await.contains(&PcsCommand::cluster_cib()));
}

// ============================================================================
// create / flush / destroy
// ============================================================================

#[tokio::test]
async fn test_create_destroy_issues_only_removal() {
    let runner = Arc::new(MockRunner::new());
    let mut provider = LocationConstraintProvider::new(runner.clone(), "loc-web");
    provider.create(
        &LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_node("node1")
            .with_score("INFINITY"),
    );
    provider.destroy().await.unwrap();

    let commands = runner.commands().await;
    assert_eq!(commands.len(), 1);
    assert_eq!(args(&commands[0]), vec!["constraint", "resource", "remove", "loc-web"]);
    assert!(provider.properties().is_none());
}

#[tokio::test]
async fn test_flush_node_and_score_only() {
    let runner = Arc::new(MockRunner::new());
    let mut provider = LocationConstraintProvider::new(runner.clone(), "loc-web");
    provider.create(
        &LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_node("node1")
            .with_score("INFINITY"),
    );
    provider.flush().await.unwrap();

    let commands = runner.commands().await;
    assert_eq!(commands.len(), 1);
    assert_eq!(
        args(&commands[0]),
        vec!["constraint", "location", "add", "loc-web", "web", "node1", "INFINITY"]
    );
}

#[tokio::test]
async fn test_flush_rule_without_score() {
    let runner = Arc::new(MockRunner::new());
    let mut provider = LocationConstraintProvider::new(runner.clone(), "loc-web");
    provider.create(
        &LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_rule(Rule::expression("#uname", "eq", "node1")),
    );
    provider.flush().await.unwrap();

    let commands = runner.commands().await;
    assert_eq!(commands.len(), 2);
    assert_eq!(args(&commands[0])[..3], ["constraint", "location", "add"]);
    assert_eq!(
        args(&commands[1]),
        vec!["constraint", "location", "web", "rule", "#uname", "eq", "node1"]
    );
}

#[tokio::test]
async fn test_flush_rule_with_score() {
    let runner = Arc::new(MockRunner::new());
    let mut provider = LocationConstraintProvider::new(runner.clone(), "loc-web");
    provider.create(
        &LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_rule(Rule::new().with_entry("score", "200").with_entry(
                "expression",
                RuleValue::Map(
                    [("attribute", "#uname"), ("operation", "eq"), ("value", "node1")]
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
            )),
    );
    provider.flush().await.unwrap();

    let commands = runner.commands().await;
    assert_eq!(
        args(&commands[1]),
        vec!["constraint", "location", "web", "rule", "score=200", "#uname", "eq", "node1"]
    );
}

#[tokio::test]
async fn test_flush_twice_repeats_commands() {
    let runner = Arc::new(MockRunner::new());
    let mut provider = LocationConstraintProvider::new(runner.clone(), "loc-web");
    provider.create(
        &LocationConstraint::new("loc-web")
            .with_primitive("web")
            .with_node("node1")
            .with_score("10")
            .with_rule(Rule::expression("#uname", "eq", "node1")),
    );
    provider.flush().await.unwrap();
    provider.flush().await.unwrap();

    let commands = runner.commands().await;
    assert_eq!(commands.len(), 4);
    assert_eq!(commands[0], commands[2]);
    assert_eq!(commands[1], commands[3]);
}

#[tokio::test(start_paused = true)]
async fn test_setters_update_discovered_instance() {
    let runner = cluster_with(CIB).await;
    let mut instances = LocationConstraintProvider::instances(runner.clone(), &fast_config(), None, None)
        .await
        .unwrap();
    let mut vip = instances.remove(0);
    vip.set_node_name(Some("node2".to_string()));
    vip.set_score(Some(Score::from("-INFINITY")));
    vip.flush().await.unwrap();

    let mutations = runner.mutations().await;
    // the discovered empty rule still counts as a rule
    assert_eq!(mutations.len(), 2);
    assert_eq!(
        args(&mutations[0]),
        vec!["constraint", "location", "add", "location-vip-node1", "vip", "node2", "-INFINITY"]
    );
    assert_eq!(args(&mutations[1]), vec!["constraint", "location", "vip", "rule"]);
}

// ============================================================================
// ConstraintProvider interface
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_interface_discover_apply_remove() {
    let runner = cluster_with(CIB).await;
    let provider = PcsLocationProvider::new(runner.clone(), fast_config());

    let discovered = provider.discover().await.unwrap();
    assert_eq!(discovered.len(), 3);
    assert_eq!(discovered[2].score, Some(Score::from("-INFINITY")));

    runner.clear().await;
    let change = StagedChange::new(
        LocationConstraint::new("loc-new")
            .with_primitive("app")
            .with_node("node3")
            .with_score("50")
            .with_cib("staging"),
    );
    provider.apply(&change).await.unwrap();
    provider.remove("location-db-avoid", None).await.unwrap();

    let commands = runner.commands().await;
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].cib(), Some("staging"));
    assert_eq!(commands[1], PcsCommand::resource_remove("location-db-avoid"));
}

#[tokio::test(start_paused = true)]
async fn test_interface_discover_from_shadow_cib() {
    let runner = cluster_with(CIB).await;
    let provider =
        PcsLocationProvider::new(runner.clone(), fast_config()).with_cib(Some("staging".into()));

    let discovered = provider.discover().await.unwrap();
    assert!(discovered.iter().all(|c| c.cib.as_deref() == Some("staging")));

    let dump = runner
        .commands()
        .await
        .into_iter()
        .find(|c| c.args().starts_with(&["cluster".to_string(), "cib".to_string()]))
        .unwrap();
    assert_eq!(dump.cib(), Some("staging"));
}
