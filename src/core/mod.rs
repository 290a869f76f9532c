//! Core engine for sdk-regen
//!
//! - **config**: regen.toml parsing, overrides and validation
//! - **context**: Immutable per-run context shared by every component
//! - **error**: Error types with contextual help messages and exit codes
//! - **outputs**: Typed workflow outputs and their sinks
//! - **telemetry**: Tracing subscriber setup
//! - **vcs**: Version control (system git + gh CLI)

pub mod config;
pub mod context;
pub mod error;
pub mod outputs;
pub mod telemetry;
pub mod vcs;
