//! Execution of `pcs` commands.
//!
//! Every interaction with the cluster goes through a [`CommandRunner`]. The
//! production runner, [`ProcessRunner`], spawns the `pcs` binary; tests swap in
//! [`crate::mock::MockRunner`].
//!
//! # Requirements
//!
//! - `pcs` binary installed and in PATH (or configured explicitly)
//! - Permission to read and modify the CIB (usually root or `haclient`)

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use location_shared_types::LocationError;
use tokio::process::Command;
use tracing::debug;

/// Environment variable that points pacemaker tools at a shadow CIB.
pub const CIB_SHADOW_ENV: &str = "CIB_shadow";

/// Errors specific to pcs command execution.
#[derive(Debug, thiserror::Error)]
pub enum PcsCliError {
    #[error("pcs binary not found: {0}")]
    BinaryNotFound(String),

    #[error("Command {command} failed with status {status:?}: {output}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cluster not ready after {0:?}")]
    NotReady(Duration),

    #[error("Cancelled while waiting for the cluster")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PcsCliError> for LocationError {
    fn from(err: PcsCliError) -> Self {
        match err {
            PcsCliError::NotReady(waited) => LocationError::ReadinessTimeout(waited),
            PcsCliError::Cancelled => LocationError::Cancelled,
            other => LocationError::Command(other.to_string()),
        }
    }
}

/// Configuration for running pcs.
#[derive(Debug, Clone)]
pub struct PcsCliConfig {
    /// Path to pcs binary (default: "pcs")
    pub pcs_binary: PathBuf,
    /// Timeout for a single command (default: 60s)
    pub command_timeout: Duration,
    /// Upper bound for the readiness wait (default: 120s)
    pub ready_timeout: Duration,
    /// Delay between readiness polls (default: 2s)
    pub ready_poll_interval: Duration,
    /// Extra wait once the cluster answers (default: 2s)
    pub ready_settle: Duration,
}

impl Default for PcsCliConfig {
    fn default() -> Self {
        Self {
            pcs_binary: PathBuf::from("pcs"),
            command_timeout: Duration::from_secs(60),
            ready_timeout: Duration::from_secs(120),
            ready_poll_interval: Duration::from_secs(2),
            ready_settle: Duration::from_secs(2),
        }
    }
}

/// A pcs invocation: arguments after the binary name plus extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcsCommand {
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl PcsCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    /// Run against the named shadow CIB instead of the live one.
    pub fn in_cib(mut self, cib: Option<&str>) -> Self {
        if let Some(cib) = cib {
            self.env.retain(|(k, _)| k != CIB_SHADOW_ENV);
            self.env.push((CIB_SHADOW_ENV.to_string(), cib.to_string()));
        }
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Shadow CIB this command targets, if any.
    pub fn cib(&self) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == CIB_SHADOW_ENV)
            .map(|(_, v)| v.as_str())
    }

    /// pcs cluster cib
    pub fn cluster_cib() -> Self {
        Self::new(["cluster", "cib"])
    }

    /// pcs property show dc-version
    pub fn dc_version() -> Self {
        Self::new(["property", "show", "dc-version"])
    }

    /// pcs constraint location add <name> <primitive> <node_name> <score>
    pub fn location_add(name: &str, primitive: &str, node_name: &str, score: &str) -> Self {
        Self::new([
            "constraint",
            "location",
            "add",
            name,
            primitive,
            node_name,
            score,
        ])
    }

    /// pcs constraint location <primitive> rule [score_arg] <expression...>
    pub fn location_rule(primitive: &str, score_arg: Option<&str>, expression: &[String]) -> Self {
        let mut args = vec![
            "constraint".to_string(),
            "location".to_string(),
            primitive.to_string(),
            "rule".to_string(),
        ];
        args.extend(score_arg.map(str::to_string));
        args.extend(expression.iter().cloned());
        Self { args, env: Vec::new() }
    }

    /// pcs constraint resource remove <name>
    pub fn resource_remove(name: &str) -> Self {
        Self::new(["constraint", "resource", "remove", name])
    }
}

impl fmt::Display for PcsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.env {
            write!(f, "{}={} ", k, v)?;
        }
        write!(f, "pcs {}", self.args.join(" "))
    }
}

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout followed by stderr, the way pcs prints them to a terminal.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Something that can run pcs commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command and capture its output. A non-zero exit is not an error here.
    async fn run(&self, command: &PcsCommand) -> Result<CommandOutput, PcsCliError>;

    /// Run a command and fail on a non-zero exit.
    async fn run_checked(&self, command: &PcsCommand) -> Result<CommandOutput, PcsCliError> {
        let output = self.run(command).await?;
        if !output.success() {
            return Err(PcsCliError::CommandFailed {
                command: command.to_string(),
                status: output.status,
                output: output.combined(),
            });
        }
        Ok(output)
    }
}

/// Runs pcs as a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: PcsCliConfig,
}

impl ProcessRunner {
    pub fn new(config: PcsCliConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &PcsCommand) -> Result<CommandOutput, PcsCliError> {
        let cmd_str = command.to_string();
        debug!("Executing: {}", cmd_str);

        let output = tokio::time::timeout(
            self.config.command_timeout,
            Command::new(&self.config.pcs_binary)
                .args(command.args())
                .envs(command.env().iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| PcsCliError::Timeout(cmd_str.clone()))?
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                PcsCliError::BinaryNotFound(format!("{:?}: {}", self.config.pcs_binary, e))
            }
            _ => PcsCliError::Io(e),
        })?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("{} exited with {:?}", cmd_str, result.status);
        Ok(result)
    }
}
