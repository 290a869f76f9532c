//! Version-control collaborator
//!
//! The workflow only talks to version control through [`VersionControl`].
//! [`GitHubVcs`] implements it with system `git` for branch and commit work
//! and the `gh` CLI for review requests and releases.

pub mod github;
pub mod system_git;
mod system_git_ops;

pub use github::{GhCli, GitHubVcs};
pub use system_git::SystemGit;

use crate::core::error::RegenResult;
use crate::release::ReleaseRecord;
use serde::{Deserialize, Serialize};

/// An open review request (pull request) owned by the workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
  pub number: u64,
  pub url: String,
  pub branch: String,
  pub title: String,
  pub body: String,
}

/// Working branch chosen for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingBranch {
  pub name: String,
  /// True if this run created the branch
  pub created: bool,
}

/// Operations the workflow needs from version control.
///
/// Every operation either completes or returns an error; none retries.
pub trait VersionControl {
  /// Find the open review request owned by the workflow, optionally restricted to one branch
  fn find_existing_request(&self, branch: Option<&str>) -> RegenResult<Option<ReviewRequest>>;

  /// Reuse `hint` if it names an existing branch, otherwise create a new branch off the default branch
  fn find_or_create_branch(&self, hint: Option<&str>) -> RegenResult<WorkingBranch>;

  /// Check out an existing branch, returning its name
  fn find_branch(&self, name: &str) -> RegenResult<String>;

  /// Delete a branch locally and on the remote
  fn delete_branch(&self, name: &str) -> RegenResult<()>;

  /// Commit all changes on the current branch and push it, returning the head commit
  fn commit_and_push(&self, branch: &str, message: &str) -> RegenResult<String>;

  /// Open a review request for `branch`, or update `existing` from the record
  fn create_or_update_request(
    &self,
    branch: &str,
    record: &ReleaseRecord,
    existing: Option<&ReviewRequest>,
  ) -> RegenResult<ReviewRequest>;

  /// Merge `branch` into the default branch, returning the resulting commit
  fn merge_branch(&self, branch: &str) -> RegenResult<String>;

  /// Create tagged release(s) from the record at `commit`
  fn create_release(&self, record: &ReleaseRecord, commit: &str) -> RegenResult<()>;
}
