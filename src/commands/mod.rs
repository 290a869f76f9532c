//! CLI commands for sdk-regen
//!
//! - **run**: One regeneration run (generate, record, publish)
//! - **ledger**: Inspect the release ledger (latest record, full history)

pub mod ledger;
pub mod run;

pub use ledger::{run_ledger_latest, run_ledger_list};
pub use run::run_regen;
