//! CLI settings, read from `~/.config/cs-location/config.toml`.
//!
//! Every field is optional in the file; missing fields and a missing file
//! fall back to the pcs defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pcs_provider::PcsCliConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

pub const APP_NAME: &str = "cs-location";
const SETTINGS_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the pcs binary.
    pub pcs_binary: PathBuf,
    /// Timeout for a single pcs command, in seconds.
    pub command_timeout_secs: u64,
    /// Upper bound for the readiness wait, in seconds.
    pub ready_timeout_secs: u64,
    /// Delay between readiness polls, in seconds.
    pub ready_poll_interval_secs: u64,
    /// Extra wait once the cluster answers, in seconds.
    pub ready_settle_secs: u64,
    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let pcs = PcsCliConfig::default();
        Self {
            pcs_binary: pcs.pcs_binary,
            command_timeout_secs: pcs.command_timeout.as_secs(),
            ready_timeout_secs: pcs.ready_timeout.as_secs(),
            ready_poll_interval_secs: pcs.ready_poll_interval.as_secs(),
            ready_settle_secs: pcs.ready_settle.as_secs(),
            log_json: false,
        }
    }
}

impl Settings {
    /// `<config dir>/cs-location/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| CliError::config_error("Could not determine config directory"))?;
        Ok(dir.join(APP_NAME).join(SETTINGS_FILE))
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from an explicit path, or from the default location.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if !path.exists() => Err(CliError::config_error(format!(
                "Settings file {} does not exist",
                path.display()
            ))),
            Some(path) => Self::load(path),
            None => Self::load(Self::default_path()?),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn pcs_config(&self) -> PcsCliConfig {
        PcsCliConfig {
            pcs_binary: self.pcs_binary.clone(),
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
            ready_poll_interval: Duration::from_secs(self.ready_poll_interval_secs),
            ready_settle: Duration::from_secs(self.ready_settle_secs),
        }
    }
}
