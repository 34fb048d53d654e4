//! Mock command runner for testing and development.
//!
//! Records every command it is asked to run and answers from a small script
//! of canned outputs. Commands without a scripted answer succeed with empty
//! output.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::pcs_cli::{CommandOutput, CommandRunner, PcsCliError, PcsCommand};

/// Canned outputs for commands whose arguments start with `prefix`.
#[derive(Debug)]
struct Script {
    prefix: Vec<String>,
    /// The last output is repeated once the others are used up.
    outputs: VecDeque<CommandOutput>,
}

/// Mock runner that records commands in-memory.
#[derive(Debug, Default, Clone)]
pub struct MockRunner {
    commands: Arc<RwLock<Vec<PcsCommand>>>,
    scripts: Arc<RwLock<Vec<Script>>>,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command starting with `prefix` with `output`.
    pub async fn respond(&self, prefix: &[&str], output: CommandOutput) {
        self.respond_sequence(prefix, vec![output]).await;
    }

    /// Answer successive matching commands with `outputs`, in order.
    pub async fn respond_sequence(&self, prefix: &[&str], outputs: Vec<CommandOutput>) {
        self.scripts.write().await.push(Script {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.into(),
        });
    }

    /// Serve `xml` as the result of `pcs cluster cib`.
    pub async fn with_cib(self, xml: &str) -> Self {
        self.respond(&["cluster", "cib"], CommandOutput::ok(xml)).await;
        self
    }

    /// All commands run so far (for testing).
    pub async fn commands(&self) -> Vec<PcsCommand> {
        self.commands.read().await.clone()
    }

    /// Commands run so far, excluding readiness polls and CIB dumps.
    pub async fn mutations(&self) -> Vec<PcsCommand> {
        self.commands
            .read()
            .await
            .iter()
            .filter(|c| c.args().first().map(String::as_str) == Some("constraint"))
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.commands.write().await.clear();
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &PcsCommand) -> Result<CommandOutput, PcsCliError> {
        debug!("MockRunner: {}", command);
        self.commands.write().await.push(command.clone());

        let mut scripts = self.scripts.write().await;
        let script = scripts
            .iter_mut()
            .find(|s| command.args().starts_with(&s.prefix));

        let output = match script {
            Some(script) if script.outputs.len() > 1 => script.outputs.pop_front(),
            Some(script) => script.outputs.front().cloned(),
            None => None,
        };
        Ok(output.unwrap_or_else(|| CommandOutput::ok("")))
    }
}
