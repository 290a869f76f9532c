//! Release records and the release ledger
//!
//! # Core Invariants
//!
//! 1. **One record per run, built fresh**
//!    - The aggregator builds it from the generator's results
//!    - The ledger persists it once; the finalizer reads it back
//!
//! 2. **Published languages are always generated languages**
//!    - `languages_published` keys are a subset of `languages_generated` keys
//!    - A record with nothing generated is never written
//!
//! 3. **The ledger is the source of truth**
//!    - Keyed by document version, oldest first
//!    - Read from disk on every access, never cached across runs
//!
//! # Example RELEASES.toml
//!
//! ```toml
//! [[releases]]
//! title = "2026-10-18 15:04:05"
//! doc_version = "1.0.0"
//! generator_version = "1.170.0"
//! generation_version = "2.4.1"
//! spec_location = "openapi.yaml"
//!
//! [releases.languages_generated.python]
//! version = "0.3.0"
//! path = "out/python"
//!
//! [releases.languages_published.python]
//! package_name = "acme-sdk"
//! version = "0.3.0"
//! path = "out/python"
//! ```

pub mod aggregate;
pub mod ledger;
pub mod record;

pub use aggregate::{Aggregation, aggregate};
pub use ledger::Ledger;
pub use record::{GeneratedLanguage, PublishedLanguage, ReleaseRecord};
