//! Orchestrator - sequences one regeneration run
//!
//! resolve generator version → resolve branch → generate → aggregate →
//! persist ledger → commit → finalize. Every step short-circuits the rest on
//! error. The working branch is held by a [`BranchLease`] from the moment it
//! is resolved, so every early return deletes it.

use super::branch::{BranchLease, resolve_branch};
use super::finalize::{finalize, handler_for};
use crate::core::config::OperatingMode;
use crate::core::context::RunContext;
use crate::core::error::RegenResult;
use crate::core::outputs::{OutputSink, WorkflowOutputs};
use crate::core::vcs::{ReviewRequest, VersionControl};
use crate::generator::{Generator, ensure_minimum_version};
use crate::release::{Ledger, ReleaseRecord, aggregate};
use serde::Serialize;
use tracing::{info, warn};

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
  pub branch: String,
  pub anything_regenerated: bool,
  pub commit_hash: Option<String>,
  pub request: Option<ReviewRequest>,
}

/// One run over borrowed collaborators
pub struct Workflow<'a, V: VersionControl + ?Sized, G: Generator + ?Sized> {
  ctx: &'a RunContext,
  vcs: &'a V,
  generator: &'a G,
  ledger: Ledger,
}

impl<'a, V: VersionControl + ?Sized, G: Generator + ?Sized> Workflow<'a, V, G> {
  pub fn new(ctx: &'a RunContext, vcs: &'a V, generator: &'a G) -> Self {
    Self {
      ctx,
      vcs,
      generator,
      ledger: Ledger::from_context(ctx),
    }
  }

  /// Run every step, accumulating into `outputs` as it goes
  pub fn execute(&self, outputs: &mut WorkflowOutputs) -> RegenResult<RunSummary> {
    let mode = self.ctx.mode();

    // Resolve and validate are separate steps
    let pinned = self.ctx.config.generator.pinned()?;
    let version = self.generator.resolve_version(pinned.as_ref())?;
    outputs.set_resolved_generator_version(&version);
    ensure_minimum_version(&version)?;

    let working = resolve_branch(mode, self.vcs)?;
    let lease = BranchLease::acquire(self.vcs, working, self.ctx.debug());
    info!(branch = lease.name(), mode = %mode, generator = %version, "starting regeneration");

    let run = match self.generator.generate(self.ctx, &version) {
      Ok(run) => run,
      Err(failure) => {
        // Whatever the generator reported stays visible to the caller
        outputs.set_language_results(&failure.partial.results);
        return Err(failure.error);
      }
    };
    outputs.set_language_results(&run.results);

    let mut anything_regenerated = false;
    if let Some(info) = &run.info {
      let supported = self.generator.supported_languages()?;
      let aggregation = aggregate(
        info,
        &run.results,
        &supported,
        &self.ctx.release_title(),
        &self.ctx.config.generator.doc_location,
      );
      anything_regenerated = aggregation.anything_regenerated;

      if anything_regenerated {
        self.ledger.append(&aggregation.record)?;
        self.vcs.commit_and_push(lease.name(), &self.commit_message(&aggregation.record))?;
      }
    }

    let handler = handler_for(mode, self.vcs, self.ctx.config.workflow.create_release);
    let finalized = finalize(
      handler.as_ref(),
      self.vcs,
      &self.ledger,
      outputs,
      lease.name(),
      anything_regenerated,
    )?;

    let summary = RunSummary {
      branch: lease.name().to_string(),
      anything_regenerated,
      commit_hash: finalized.outputs.commit_hash,
      request: finalized.request,
    };

    // Direct-mode branches are scaffolding. A PR branch outlives the run if it
    // carries a change or already backs an open request.
    match mode {
      OperatingMode::Pr if anything_regenerated || !lease.created() => lease.retain(),
      _ => drop(lease),
    }

    info!(branch = %summary.branch, regenerated = anything_regenerated, "run complete");
    Ok(summary)
  }

  fn commit_message(&self, record: &ReleaseRecord) -> String {
    format!("{} {}", self.ctx.config.workflow.request_title, record.title)
  }
}

/// Run the workflow and flush its outputs to `sink` exactly once, on every exit path.
///
/// A flush failure after a failed run is logged; the run's error is returned.
pub fn run_workflow<V: VersionControl + ?Sized, G: Generator + ?Sized>(
  ctx: &RunContext,
  vcs: &V,
  generator: &G,
  sink: &mut dyn OutputSink,
) -> RegenResult<RunSummary> {
  let mut outputs = WorkflowOutputs::new();
  let result = Workflow::new(ctx, vcs, generator).execute(&mut outputs);

  match result {
    Ok(summary) => {
      outputs.flush(sink)?;
      Ok(summary)
    }
    Err(err) => {
      if let Err(flush_err) = outputs.flush(sink) {
        warn!(error = %flush_err, "failed to flush workflow outputs");
      }
      Err(err)
    }
  }
}
