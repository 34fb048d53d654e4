//! Tracing initialization for the `cs-location` binary and span helpers for
//! the reconciliation engine.
//!
//! Log lines go to stderr so that constraint listings on stdout stay
//! machine readable.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How log output is produced.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Recorded once at startup to identify the emitting tool
    pub service_name: String,
    /// Default level when `RUST_LOG` is not set
    pub log_level: Level,
    /// One JSON object per line instead of human readable text
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "cs-location".to_string(),
            log_level: Level::INFO,
            json_output: false,
        }
    }
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json_output = json;
        self
    }

    /// `RUST_LOG` wins over the configured level.
    fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_level.as_str()))
    }
}

/// Install the global subscriber. Call once, before any command runs.
///
/// ```no_run
/// use observability::{init_tracing, TracingConfig};
/// use tracing::Level;
///
/// init_tracing(TracingConfig::new("cs-location").with_level(Level::DEBUG));
/// ```
pub fn init_tracing(config: TracingConfig) {
    let filter = config.build_filter();
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .init();
    }

    tracing::debug!(service = %config.service_name, level = %config.log_level, "Tracing initialized");
}

/// Span covering one reconciliation cycle, tagged with its correlation id.
#[macro_export]
macro_rules! reconcile_span {
    ($correlation_id:expr) => {
        tracing::info_span!("reconcile_cycle", correlation_id = %$correlation_id)
    };
}

/// Span covering one provider call (`create`, `update`, `delete`) on a
/// named constraint.
#[macro_export]
macro_rules! constraint_span {
    ($op:expr, $name:expr) => {
        tracing::info_span!("constraint_operation", operation = %$op, constraint = %$name)
    };
}
