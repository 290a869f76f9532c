//! The regeneration workflow
//!
//! - **branch**: Working-branch resolution and the lease that cleans it up
//! - **finalize**: Per-mode terminal actions (review request or direct merge)
//! - **orchestrator**: The run sequence and the single output flush

pub mod branch;
pub mod finalize;
pub mod orchestrator;

pub use branch::{BranchLease, resolve_branch};
pub use finalize::{DirectMergeHandler, Finalized, ModeHandler, ReviewRequestHandler, finalize, handler_for};
pub use orchestrator::{RunSummary, Workflow, run_workflow};
