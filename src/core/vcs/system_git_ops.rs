//! Branch, commit, push and merge operations for SystemGit

use super::system_git::SystemGit;
use crate::core::error::{GitError, RegenError, RegenResult};
use tracing::warn;

impl SystemGit {
  /// Fetch a remote, pruning deleted branches
  pub fn fetch(&self, remote: &str) -> RegenResult<()> {
    self.run(&["fetch", "--prune", remote])?;
    Ok(())
  }

  /// Check if a local branch exists
  pub fn local_branch_exists(&self, branch: &str) -> RegenResult<bool> {
    let reference = format!("refs/heads/{}", branch);
    let output = self.output(&["rev-parse", "--verify", "--quiet", &reference])?;
    Ok(output.status.success())
  }

  /// Check if a remote-tracking branch exists (as of the last fetch)
  pub fn remote_branch_exists(&self, remote: &str, branch: &str) -> RegenResult<bool> {
    let reference = format!("refs/remotes/{}/{}", remote, branch);
    let output = self.output(&["rev-parse", "--verify", "--quiet", &reference])?;
    Ok(output.status.success())
  }

  /// Checkout a branch
  pub fn checkout_branch(&self, branch: &str) -> RegenResult<()> {
    self.run(&["checkout", branch])?;
    Ok(())
  }

  /// Create (or reset) a local branch tracking its remote counterpart and check it out
  pub fn checkout_tracking(&self, remote: &str, branch: &str) -> RegenResult<()> {
    let upstream = format!("{}/{}", remote, branch);
    self.run(&["checkout", "-B", branch, "--track", &upstream])?;
    Ok(())
  }

  /// Create a branch from `start_point` and check it out
  pub fn create_and_checkout_branch(&self, branch: &str, start_point: &str) -> RegenResult<()> {
    self.run(&["checkout", "-b", branch, start_point])?;
    Ok(())
  }

  /// Force-delete a local branch
  pub fn delete_local_branch(&self, branch: &str) -> RegenResult<()> {
    self.run(&["branch", "-D", branch])?;
    Ok(())
  }

  /// Delete a branch on the remote; a branch that was never pushed is not an error
  pub fn delete_remote_branch(&self, remote: &str, branch: &str) -> RegenResult<()> {
    let output = self.output(&["push", remote, "--delete", branch])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("remote ref does not exist") {
        return Ok(());
      }
      return Err(RegenError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        branch: branch.to_string(),
        reason: stderr.trim().to_string(),
      }));
    }

    Ok(())
  }

  /// Check whether the working tree has uncommitted changes (tracked or untracked)
  pub fn has_changes(&self) -> RegenResult<bool> {
    let status = self.run(&["status", "--porcelain"])?;
    Ok(!status.is_empty())
  }

  /// Stage everything and commit; returns false if there was nothing to commit
  pub fn commit_all(&self, message: &str) -> RegenResult<bool> {
    if !self.has_changes()? {
      return Ok(false);
    }

    self.run(&["add", "--all"])?;
    self.run(&["commit", "-m", message])?;
    Ok(true)
  }

  /// Push a branch and set its upstream
  pub fn push_branch(&self, remote: &str, branch: &str) -> RegenResult<()> {
    let output = self.output(&["push", "-u", remote, branch])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(RegenError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        branch: branch.to_string(),
        reason: stderr.trim().to_string(),
      }));
    }

    Ok(())
  }

  /// Merge `branch` into the currently checked-out branch with a merge commit
  pub fn merge_into_current(&self, branch: &str, message: &str) -> RegenResult<()> {
    let into = self.current_branch()?;
    let output = self.output(&["merge", "--no-ff", "-m", message, branch])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      // Leave the default branch as it was
      match self.output(&["merge", "--abort"]) {
        Ok(abort) if !abort.status.success() => warn!(
          into = %into,
          stderr = %String::from_utf8_lossy(&abort.stderr).trim(),
          "failed to abort merge"
        ),
        Err(e) => warn!(into = %into, error = %e, "failed to abort merge"),
        Ok(_) => {}
      }
      return Err(RegenError::Git(GitError::MergeFailed {
        branch: branch.to_string(),
        into,
        reason: format!("{}{}", stdout.trim(), stderr.trim()),
      }));
    }

    Ok(())
  }
}
