//! Observability for the location constraint tooling.
//!
//! Structured logging through `tracing`, with span helpers for reconciliation
//! cycles and per-constraint operations.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, TracingConfig};
