//! In-memory version control

use crate::core::error::{GitError, RegenError, RegenResult};
use crate::core::vcs::github::{fingerprint_marker, request_body};
use crate::core::vcs::{ReviewRequest, VersionControl, WorkingBranch};
use crate::release::ReleaseRecord;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default branch every `MemoryVcs` starts with
pub const DEFAULT_BRANCH: &str = "main";

/// Title prefix identifying requests owned by the workflow
pub const REQUEST_TITLE: &str = "chore: regenerate SDKs";

/// One `VersionControl` operation, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsCall {
  FindExistingRequest,
  FindOrCreateBranch,
  FindBranch,
  DeleteBranch,
  CommitAndPush,
  CreateOrUpdateRequest,
  MergeBranch,
  CreateRelease,
}

impl VcsCall {
  /// True for calls that change repository or forge state
  pub fn is_side_effect(self) -> bool {
    matches!(
      self,
      VcsCall::DeleteBranch
        | VcsCall::CommitAndPush
        | VcsCall::CreateOrUpdateRequest
        | VcsCall::MergeBranch
        | VcsCall::CreateRelease
    )
  }
}

/// A release recorded by [`MemoryVcs::create_release`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRelease {
  pub tags: Vec<String>,
  pub commit: String,
}

#[derive(Debug, Default)]
struct MemoryState {
  branches: BTreeSet<String>,
  requests: Vec<ReviewRequest>,
  calls: Vec<VcsCall>,
  failures: Vec<VcsCall>,
  commits: Vec<(String, String)>,
  merges: Vec<String>,
  releases: Vec<RecordedRelease>,
  deleted: Vec<String>,
  request_updates: usize,
  next_branch: u32,
  next_commit: u32,
}

/// Version control held entirely in memory.
///
/// Mirrors the observable behaviour of `GitHubVcs`: requests are recognised by
/// [`REQUEST_TITLE`], request bodies carry the record fingerprint and an
/// update with an unchanged fingerprint is a no-op.
#[derive(Debug)]
pub struct MemoryVcs {
  state: Mutex<MemoryState>,
}

impl Default for MemoryVcs {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryVcs {
  pub fn new() -> Self {
    let mut state = MemoryState::default();
    state.branches.insert(DEFAULT_BRANCH.to_string());
    Self {
      state: Mutex::new(state),
    }
  }

  fn state(&self) -> MutexGuard<'_, MemoryState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Record a call, failing it if a failure was injected for it
  fn enter(&self, call: VcsCall) -> RegenResult<MutexGuard<'_, MemoryState>> {
    let mut state = self.state();
    state.calls.push(call);
    if state.failures.contains(&call) {
      return Err(RegenError::message(format!("injected failure in {:?}", call)));
    }
    Ok(state)
  }

  pub fn add_branch(&self, name: &str) {
    self.state().branches.insert(name.to_string());
  }

  pub fn has_branch(&self, name: &str) -> bool {
    self.state().branches.contains(name)
  }

  /// All branches except the default one
  pub fn working_branches(&self) -> Vec<String> {
    self
      .state()
      .branches
      .iter()
      .filter(|b| *b != DEFAULT_BRANCH)
      .cloned()
      .collect()
  }

  pub fn add_request(&self, request: ReviewRequest) {
    self.state().requests.push(request);
  }

  pub fn requests(&self) -> Vec<ReviewRequest> {
    self.state().requests.clone()
  }

  /// Make every later call of `call` fail
  pub fn fail_on(&self, call: VcsCall) {
    self.state().failures.push(call);
  }

  pub fn clear_failures(&self) {
    self.state().failures.clear();
  }

  pub fn count(&self, call: VcsCall) -> usize {
    self.state().calls.iter().filter(|c| **c == call).count()
  }

  /// Number of state-changing calls made so far
  pub fn side_effects(&self) -> usize {
    self.state().calls.iter().filter(|c| c.is_side_effect()).count()
  }

  /// `(branch, message)` of every commit
  pub fn commits(&self) -> Vec<(String, String)> {
    self.state().commits.clone()
  }

  pub fn merges(&self) -> Vec<String> {
    self.state().merges.clone()
  }

  pub fn releases(&self) -> Vec<RecordedRelease> {
    self.state().releases.clone()
  }

  pub fn deleted(&self) -> Vec<String> {
    self.state().deleted.clone()
  }

  /// Number of request edits that actually changed a request
  pub fn request_updates(&self) -> usize {
    self.state().request_updates
  }
}

fn branch_not_found(name: &str) -> RegenError {
  RegenError::Git(GitError::BranchNotFound {
    branch: name.to_string(),
  })
}

impl VersionControl for MemoryVcs {
  fn find_existing_request(&self, branch: Option<&str>) -> RegenResult<Option<ReviewRequest>> {
    let state = self.enter(VcsCall::FindExistingRequest)?;
    Ok(
      state
        .requests
        .iter()
        .filter(|r| branch.is_none_or(|b| r.branch == b))
        .find(|r| r.title.starts_with(REQUEST_TITLE))
        .cloned(),
    )
  }

  fn find_or_create_branch(&self, hint: Option<&str>) -> RegenResult<WorkingBranch> {
    let mut state = self.enter(VcsCall::FindOrCreateBranch)?;
    if let Some(name) = hint
      && state.branches.contains(name)
    {
      return Ok(WorkingBranch {
        name: name.to_string(),
        created: false,
      });
    }

    state.next_branch += 1;
    let name = format!("regen-sdk-test-{}", state.next_branch);
    state.branches.insert(name.clone());
    Ok(WorkingBranch { name, created: true })
  }

  fn find_branch(&self, name: &str) -> RegenResult<String> {
    let state = self.enter(VcsCall::FindBranch)?;
    if !state.branches.contains(name) {
      return Err(branch_not_found(name));
    }
    Ok(name.to_string())
  }

  fn delete_branch(&self, name: &str) -> RegenResult<()> {
    let mut state = self.enter(VcsCall::DeleteBranch)?;
    state.branches.remove(name);
    state.requests.retain(|r| r.branch != name);
    state.deleted.push(name.to_string());
    Ok(())
  }

  fn commit_and_push(&self, branch: &str, message: &str) -> RegenResult<String> {
    let mut state = self.enter(VcsCall::CommitAndPush)?;
    if !state.branches.contains(branch) {
      return Err(branch_not_found(branch));
    }
    state.next_commit += 1;
    let commit = format!("{:040x}", state.next_commit);
    state.commits.push((branch.to_string(), message.to_string()));
    Ok(commit)
  }

  fn create_or_update_request(
    &self,
    branch: &str,
    record: &ReleaseRecord,
    existing: Option<&ReviewRequest>,
  ) -> RegenResult<ReviewRequest> {
    let mut state = self.enter(VcsCall::CreateOrUpdateRequest)?;
    let title = format!("{} {}", REQUEST_TITLE, record.title);
    let body = request_body(record, None);

    match existing {
      Some(request) if request.body.contains(&fingerprint_marker(record)) && request.title == title => {
        Ok(request.clone())
      }
      Some(request) => {
        let updated = ReviewRequest {
          title,
          body,
          ..request.clone()
        };
        if let Some(slot) = state.requests.iter_mut().find(|r| r.number == request.number) {
          *slot = updated.clone();
        }
        state.request_updates += 1;
        Ok(updated)
      }
      None => {
        let number = state.requests.iter().map(|r| r.number).max().unwrap_or(0) + 1;
        let request = ReviewRequest {
          number,
          url: format!("https://example.test/acme/sdk/pull/{}", number),
          branch: branch.to_string(),
          title,
          body,
        };
        state.requests.push(request.clone());
        Ok(request)
      }
    }
  }

  fn merge_branch(&self, branch: &str) -> RegenResult<String> {
    let mut state = self.enter(VcsCall::MergeBranch)?;
    if !state.branches.contains(branch) {
      return Err(branch_not_found(branch));
    }
    state.next_commit += 1;
    let commit = format!("{:040x}", state.next_commit);
    state.merges.push(branch.to_string());
    Ok(commit)
  }

  fn create_release(&self, record: &ReleaseRecord, commit: &str) -> RegenResult<()> {
    let mut state = self.enter(VcsCall::CreateRelease)?;
    state.releases.push(RecordedRelease {
      tags: record.release_tags(),
      commit: commit.to_string(),
    });
    Ok(())
  }
}
