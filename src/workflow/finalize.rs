//! Terminal action of a run, one handler per operating mode

use crate::core::config::OperatingMode;
use crate::core::error::RegenResult;
use crate::core::outputs::{OutputsDelta, WorkflowOutputs};
use crate::core::vcs::{ReviewRequest, VersionControl};
use crate::release::{Ledger, ReleaseRecord};
use tracing::info;

/// What a finalizer produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finalized {
  pub outputs: OutputsDelta,
  pub request: Option<ReviewRequest>,
}

/// Terminal action for one operating mode
pub trait ModeHandler {
  fn finalize(&self, branch: &str, record: &ReleaseRecord) -> RegenResult<Finalized>;
}

/// PR mode: open or update the review request for the branch
pub struct ReviewRequestHandler<'a, V: VersionControl + ?Sized> {
  vcs: &'a V,
}

impl<'a, V: VersionControl + ?Sized> ReviewRequestHandler<'a, V> {
  pub fn new(vcs: &'a V) -> Self {
    Self { vcs }
  }
}

impl<V: VersionControl + ?Sized> ModeHandler for ReviewRequestHandler<'_, V> {
  fn finalize(&self, branch: &str, record: &ReleaseRecord) -> RegenResult<Finalized> {
    // A request opened by an earlier run may still be open on this branch
    let existing = self.vcs.find_existing_request(Some(branch))?;
    let request = self.vcs.create_or_update_request(branch, record, existing.as_ref())?;

    Ok(Finalized {
      outputs: OutputsDelta::default(),
      request: Some(request),
    })
  }
}

/// Direct mode: merge into the default branch, optionally cut releases
pub struct DirectMergeHandler<'a, V: VersionControl + ?Sized> {
  vcs: &'a V,
  create_release: bool,
}

impl<'a, V: VersionControl + ?Sized> DirectMergeHandler<'a, V> {
  pub fn new(vcs: &'a V, create_release: bool) -> Self {
    Self { vcs, create_release }
  }
}

impl<V: VersionControl + ?Sized> ModeHandler for DirectMergeHandler<'_, V> {
  fn finalize(&self, branch: &str, record: &ReleaseRecord) -> RegenResult<Finalized> {
    // Point of no return: a failed release after this does not undo the merge
    let commit = self.vcs.merge_branch(branch)?;

    if self.create_release {
      self.vcs.create_release(record, &commit)?;
    }

    Ok(Finalized {
      outputs: OutputsDelta {
        commit_hash: Some(commit),
      },
      request: None,
    })
  }
}

/// Handler for `mode`
pub fn handler_for<'a, V: VersionControl + ?Sized>(
  mode: OperatingMode,
  vcs: &'a V,
  create_release: bool,
) -> Box<dyn ModeHandler + 'a> {
  match mode {
    OperatingMode::Pr => Box::new(ReviewRequestHandler::new(vcs)),
    OperatingMode::Direct => Box::new(DirectMergeHandler::new(vcs, create_release)),
  }
}

/// Finish a run on `branch`.
///
/// Records the branch in the outputs. When nothing was regenerated that is
/// all; otherwise the most recent ledger record is handed to the mode's handler.
pub fn finalize<V: VersionControl + ?Sized>(
  handler: &dyn ModeHandler,
  vcs: &V,
  ledger: &Ledger,
  outputs: &mut WorkflowOutputs,
  branch: &str,
  anything_regenerated: bool,
) -> RegenResult<Finalized> {
  let branch = vcs.find_branch(branch)?;
  outputs.set_branch_name(&branch);

  if !anything_regenerated {
    info!(branch = %branch, "nothing regenerated, skipping finalization");
    return Ok(Finalized::default());
  }

  let record = ledger.most_recent()?;
  let finalized = handler.finalize(&branch, &record)?;
  outputs.apply(finalized.outputs.clone());
  Ok(finalized)
}
