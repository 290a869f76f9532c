//! Working-branch resolution and ownership

use crate::core::config::OperatingMode;
use crate::core::error::RegenResult;
use crate::core::vcs::{VersionControl, WorkingBranch};
use tracing::{debug, info, warn};

/// Pick the branch this run works on.
///
/// In PR mode the branch of an open review request owned by the workflow is
/// reused. Otherwise (or if there is no such request) a new branch is created
/// off the default branch.
pub fn resolve_branch<V: VersionControl + ?Sized>(mode: OperatingMode, vcs: &V) -> RegenResult<WorkingBranch> {
  let hint = match mode {
    OperatingMode::Pr => vcs.find_existing_request(None)?.map(|request| request.branch),
    OperatingMode::Direct => None,
  };

  let branch = vcs.find_or_create_branch(hint.as_deref())?;
  debug!(branch = %branch.name, created = branch.created, mode = %mode, "resolved working branch");
  Ok(branch)
}

/// Ownership of a working branch for the length of a run.
///
/// The branch is deleted when the lease is dropped, whether this run created
/// it or reused it, unless the lease was retained first or debug mode is on.
pub struct BranchLease<'a, V: VersionControl + ?Sized> {
  vcs: &'a V,
  branch: WorkingBranch,
  armed: bool,
}

impl<'a, V: VersionControl + ?Sized> BranchLease<'a, V> {
  pub fn acquire(vcs: &'a V, branch: WorkingBranch, debug: bool) -> Self {
    if debug {
      info!(branch = %branch.name, "debug mode: working branch will be kept");
    }
    let armed = !debug;
    Self { vcs, branch, armed }
  }

  pub fn name(&self) -> &str {
    &self.branch.name
  }

  pub fn branch(&self) -> &WorkingBranch {
    &self.branch
  }

  /// Whether this run created the branch
  pub fn created(&self) -> bool {
    self.branch.created
  }

  /// Keep the branch after the run
  pub fn retain(mut self) {
    self.armed = false;
  }
}

impl<V: VersionControl + ?Sized> Drop for BranchLease<'_, V> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    // Never propagate: the run's own error matters more than a leaked branch
    if let Err(e) = self.vcs.delete_branch(&self.branch.name) {
      warn!(branch = %self.branch.name, error = %e, "failed to delete working branch");
    }
  }
}
