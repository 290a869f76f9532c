//! Run context - build once, pass everywhere
//!
//! `RunContext` holds everything a run needs from its environment: the
//! workspace root, the resolved configuration and the invocation time. It is
//! built once in the `run` command and handed to every component by
//! reference, so no component reads process-wide state on its own.

use crate::core::config::{ConfigOverrides, OperatingMode, RegenConfig};
use crate::core::error::RegenResult;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Human-readable release title format
pub const TITLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used in working-branch names
const BRANCH_STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Immutable per-run context
#[derive(Debug, Clone)]
pub struct RunContext {
  /// Workspace root directory (absolute path)
  pub root: PathBuf,

  /// Final configuration (file + overrides)
  pub config: Arc<RegenConfig>,

  /// When this run was invoked
  pub invoke_time: DateTime<Utc>,
}

impl RunContext {
  /// Build the context from a workspace root.
  ///
  /// Loads regen.toml (if present), applies overrides and validates the result.
  pub fn build(root: &Path, overrides: ConfigOverrides, invoke_time: DateTime<Utc>) -> RegenResult<Self> {
    let config = RegenConfig::load(root)?.with_overrides(overrides)?;
    Ok(Self::from_config(root, config, invoke_time))
  }

  /// Build a context from an already-resolved configuration
  pub fn from_config(root: &Path, config: RegenConfig, invoke_time: DateTime<Utc>) -> Self {
    Self {
      root: root.to_path_buf(),
      config: Arc::new(config),
      invoke_time,
    }
  }

  pub fn mode(&self) -> OperatingMode {
    self.config.workflow.mode
  }

  pub fn debug(&self) -> bool {
    self.config.workflow.debug
  }

  /// Release title for records created in this run
  pub fn release_title(&self) -> String {
    self.invoke_time.format(TITLE_FORMAT).to_string()
  }

  /// Name for a working branch created in this run
  pub fn new_branch_name(&self) -> String {
    format!(
      "{}-{}",
      self.config.workflow.branch_prefix,
      self.invoke_time.format(BRANCH_STAMP_FORMAT)
    )
  }

  /// Absolute location of the release ledger
  pub fn ledger_path(&self) -> PathBuf {
    self.root.join(&self.config.ledger.dir).join(&self.config.ledger.file)
  }
}
