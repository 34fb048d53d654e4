//! Reconciliation of declared Pacemaker location constraints.
//!
//! Declared constraints come from a [`ConstraintManifest`]; the
//! [`reconciliation`] module compares them with what a
//! [`ConstraintProvider`](location_provider_interface::ConstraintProvider)
//! discovers and applies the difference.

pub mod manifest;
pub mod reconciliation;

pub use manifest::ConstraintManifest;
pub use reconciliation::{ExecutionOutcome, ReconciliationError, ReconciliationLoop};
