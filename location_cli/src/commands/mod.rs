pub mod apply;
pub mod list;
pub mod reconcile;
pub mod remove;

use std::sync::Arc;

use location_provider_interface::{ConstraintProvider, ProviderRegistry};
use location_shared_types::Result;
use pcs_provider::{PcsLocationProvider, ProcessRunner};
use tokio::sync::watch;

use crate::config::Settings;
use crate::OutputFormat;

/// State shared by every subcommand.
pub struct Context {
    pub settings: Settings,
    pub format: OutputFormat,
    cancel: watch::Receiver<bool>,
}

impl Context {
    pub fn new(settings: Settings, format: OutputFormat, cancel: watch::Receiver<bool>) -> Self {
        Self {
            settings,
            format,
            cancel,
        }
    }

    /// Providers available to the subcommands, discovering from `cib` when
    /// given.
    pub fn registry(&self, cib: Option<String>) -> Result<ProviderRegistry> {
        let config = self.settings.pcs_config();
        let runner = Arc::new(ProcessRunner::new(config.clone()));
        let pcs = PcsLocationProvider::new(runner, config)
            .with_cancel(self.cancel.clone())
            .with_cib(cib);

        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(pcs))?;
        Ok(registry)
    }

    /// The pcs provider, looked up by name.
    pub fn provider(&self, cib: Option<String>) -> Result<Arc<dyn ConstraintProvider>> {
        self.registry(cib)?.get(PcsLocationProvider::NAME)
    }
}
