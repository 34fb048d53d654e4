//! pcs implementation of the location constraint provider.
//!
//! This crate provides:
//! - `PcsLocationProvider`: the `ConstraintProvider` implementation used by the
//!   reconciliation loop
//! - `LocationConstraintProvider`: per-constraint provider with a pending state,
//!   `create` / `destroy` / `flush` and property accessors
//! - `ProcessRunner`: runs the `pcs` binary
//! - `MockRunner`: records commands instead of running them (requires the
//!   `mock-runner` feature)
//!
//! The `cib` module parses `pcs cluster cib` output and the `flush` module
//! builds the commands a flush issues.

pub mod cib;
pub mod flush;
pub mod pcs_cli;
pub mod provider;
pub mod readiness;

#[cfg(any(test, feature = "mock-runner"))]
pub mod mock;

// Re-export common types
pub use location_provider_interface::{ConstraintProvider, StagedChange};

pub use cib::{parse_locations, CibParseError};
pub use flush::{flush_commands, rule_arguments, RuleArguments};
pub use pcs_cli::{
    CommandOutput, CommandRunner, PcsCliConfig, PcsCliError, PcsCommand, ProcessRunner,
    CIB_SHADOW_ENV,
};
pub use provider::{LocationConstraintProvider, PcsLocationProvider};
pub use readiness::wait_until_ready;

#[cfg(any(test, feature = "mock-runner"))]
pub use mock::MockRunner;
