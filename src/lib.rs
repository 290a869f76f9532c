//! sdk-regen: regenerate SDKs and publish them
//!
//! Runs an external code generator, folds its per-language results into a
//! release record, appends that record to a release ledger and publishes the
//! change as a pull request or a direct merge with optional tagged releases.
//!
//! - **core**: Config, run context, errors, outputs, tracing, version control
//! - **generator**: Generator contract and the system-binary implementation
//! - **release**: Release records, aggregation and the ledger
//! - **workflow**: Branch resolution, finalization and the orchestrator
//! - **commands**: CLI command implementations
//! - **testing**: In-memory collaborators for tests

pub mod commands;
pub mod core;
pub mod generator;
pub mod release;
pub mod testing;
pub mod workflow;
