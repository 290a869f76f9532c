//! End-to-end runs of the orchestrator against in-memory collaborators

use anyhow::Result;
use sdk_regen::core::config::{OperatingMode, RegenConfig};
use sdk_regen::core::error::{ExitCode, GeneratorError, LedgerError, RegenError};
use sdk_regen::release::Ledger;
use sdk_regen::testing::fixtures::{context, context_with, generation_run, lang};
use sdk_regen::core::vcs::ReviewRequest;
use sdk_regen::testing::{CapturedOutputs, MemoryVcs, REQUEST_TITLE, ScriptedGenerator, VcsCall};
use sdk_regen::workflow::run_workflow;
use semver::Version;
use tempfile::TempDir;

fn generator() -> ScriptedGenerator {
  ScriptedGenerator::new(Version::new(1, 170, 0)).with_languages(&["go", "python", "typescript"])
}

fn python_published() -> ScriptedGenerator {
  generator().with_run(generation_run(&[lang("python", "0.3.0", true, true)]))
}

/// Memory forge with an open request on `regen-sdk-old`
fn vcs_with_open_request() -> MemoryVcs {
  let vcs = MemoryVcs::new();
  vcs.add_branch("regen-sdk-old");
  vcs.add_request(ReviewRequest {
    number: 7,
    url: "https://example.test/pull/7".to_string(),
    branch: "regen-sdk-old".to_string(),
    title: format!("{} 2026-10-01 00:00:00", REQUEST_TITLE),
    body: String::new(),
  });
  vcs
}

fn direct_config(create_release: bool) -> RegenConfig {
  let mut config = RegenConfig::default();
  config.workflow.mode = OperatingMode::Direct;
  config.workflow.create_release = create_release;
  config
}

#[test]
fn test_direct_mode_python_published() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context_with(dir.path(), direct_config(true));
  let vcs = MemoryVcs::new();
  let mut sink = CapturedOutputs::default();

  let summary = run_workflow(&ctx, &vcs, &python_published(), &mut sink)?;

  let record = Ledger::from_context(&ctx).most_recent()?;
  assert_eq!(record.languages_generated.len(), 1);
  assert_eq!(record.languages_generated["python"].version, "0.3.0");
  assert_eq!(record.languages_generated["python"].path, "out/python");
  assert_eq!(record.languages_published["python"].package_name, "acme-python");
  assert_eq!(record.title, "2026-10-18 15:04:05");

  let commit = summary.commit_hash.clone().expect("direct mode records a commit");
  let outputs = sink.last().expect("outputs flushed");
  assert_eq!(sink.flushes.len(), 1);
  assert_eq!(outputs["resolved_generator_version"], "1.170.0");
  assert_eq!(outputs["python_regenerated"], "true");
  assert_eq!(outputs["python_directory"], "out/python");
  assert_eq!(outputs["publish_python"], "true");
  assert_eq!(outputs["commit_hash"], commit);
  assert_eq!(outputs["branch_name"], summary.branch);

  assert_eq!(vcs.merges(), vec![summary.branch.clone()]);
  let releases = vcs.releases();
  assert_eq!(releases.len(), 1);
  assert_eq!(releases[0].commit, commit);

  // Direct-mode working branches never outlive the run
  assert!(vcs.working_branches().is_empty());
  Ok(())
}

#[test]
fn test_direct_mode_without_release_flag() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context_with(dir.path(), direct_config(false));
  let vcs = MemoryVcs::new();

  let summary = run_workflow(&ctx, &vcs, &python_published(), &mut CapturedOutputs::default())?;

  assert!(summary.commit_hash.is_some());
  assert_eq!(vcs.count(VcsCall::CreateRelease), 0);
  Ok(())
}

#[test]
fn test_pr_mode_nothing_regenerated() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();
  let generator = generator().with_run(generation_run(&[
    lang("python", "0.3.0", false, true),
    lang("go", "1.0.0", false, false),
  ]));
  let mut sink = CapturedOutputs::default();

  let summary = run_workflow(&ctx, &vcs, &generator, &mut sink)?;

  assert!(!summary.anything_regenerated);
  let outputs = sink.last().expect("outputs flushed");
  assert_eq!(outputs["branch_name"], summary.branch);
  assert_eq!(outputs["python_regenerated"], "false");
  assert!(!outputs.contains_key("commit_hash"));

  assert_eq!(vcs.count(VcsCall::CommitAndPush), 0);
  assert_eq!(vcs.count(VcsCall::CreateOrUpdateRequest), 0);
  assert!(vcs.requests().is_empty());
  assert!(!Ledger::from_context(&ctx).path().exists());

  // Created this run and carrying nothing: cleaned up
  assert_eq!(vcs.deleted(), vec![summary.branch.clone()]);
  assert!(vcs.working_branches().is_empty());
  Ok(())
}

#[test]
fn test_pr_mode_opens_request_and_keeps_branch() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();

  let summary = run_workflow(&ctx, &vcs, &python_published(), &mut CapturedOutputs::default())?;

  let request = summary.request.expect("request opened");
  assert_eq!(request.branch, summary.branch);
  assert_eq!(request.title, "chore: regenerate SDKs 2026-10-18 15:04:05");
  assert!(vcs.has_branch(&summary.branch));
  assert!(summary.commit_hash.is_none());

  let commits = vcs.commits();
  assert_eq!(commits.len(), 1);
  assert_eq!(commits[0].0, summary.branch);
  assert_eq!(commits[0].1, "chore: regenerate SDKs 2026-10-18 15:04:05");
  Ok(())
}

#[test]
fn test_pr_mode_repeated_runs_reuse_branch_and_request() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();
  let generator = python_published();

  let first = run_workflow(&ctx, &vcs, &generator, &mut CapturedOutputs::default())?;
  let second = run_workflow(&ctx, &vcs, &generator, &mut CapturedOutputs::default())?;

  assert_eq!(first.branch, second.branch);
  assert_eq!(vcs.requests().len(), 1);
  assert_eq!(vcs.request_updates(), 0);
  assert_eq!(vcs.count(VcsCall::FindOrCreateBranch), 2);
  assert_eq!(vcs.working_branches(), vec![first.branch.clone()]);
  assert_eq!(Ledger::from_context(&ctx).records()?.len(), 1);
  Ok(())
}

#[test]
fn test_reused_pr_branch_survives_empty_run() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();

  let first = run_workflow(&ctx, &vcs, &python_published(), &mut CapturedOutputs::default())?;
  let quiet = generator().with_run(generation_run(&[lang("python", "0.3.0", false, true)]));
  let second = run_workflow(&ctx, &vcs, &quiet, &mut CapturedOutputs::default())?;

  assert_eq!(first.branch, second.branch);
  assert!(vcs.has_branch(&first.branch));
  assert_eq!(vcs.requests().len(), 1);
  Ok(())
}

#[test]
fn test_generator_failure() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();
  let generator = generator().failing("boom");
  let mut sink = CapturedOutputs::default();

  let err = run_workflow(&ctx, &vcs, &generator, &mut sink).unwrap_err();

  assert!(matches!(err, RegenError::Generator(GeneratorError::Failed { .. })));
  assert_eq!(sink.flushes.len(), 1);
  let outputs = sink.last().expect("outputs flushed");
  assert_eq!(outputs["resolved_generator_version"], "1.170.0");
  assert!(!outputs.contains_key("python_regenerated"));
  assert!(!outputs.contains_key("branch_name"));

  assert!(!Ledger::from_context(&ctx).path().exists());
  assert_eq!(vcs.count(VcsCall::CommitAndPush), 0);
  assert!(vcs.working_branches().is_empty());
  Ok(())
}

#[test]
fn test_generator_failure_keeps_partial_results() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Direct);
  let vcs = MemoryVcs::new();
  let partial = generation_run(&[lang("python", "0.3.0", true, false)]);
  let generator = generator().failing_after(partial, "go target failed");
  let mut sink = CapturedOutputs::default();

  let err = run_workflow(&ctx, &vcs, &generator, &mut sink).unwrap_err();

  assert!(matches!(err, RegenError::Generator(GeneratorError::Failed { .. })));
  assert_eq!(sink.flushes.len(), 1);
  let outputs = sink.last().expect("outputs flushed");
  assert_eq!(outputs["python_regenerated"], "true");
  assert_eq!(outputs["python_directory"], "out/python");
  assert!(!Ledger::from_context(&ctx).path().exists());
  assert!(vcs.working_branches().is_empty());
  Ok(())
}

#[test]
fn test_failed_runs_delete_the_working_branch() -> Result<()> {
  let cases = [
    (OperatingMode::Pr, VcsCall::CommitAndPush),
    (OperatingMode::Pr, VcsCall::CreateOrUpdateRequest),
    (OperatingMode::Pr, VcsCall::FindBranch),
    (OperatingMode::Direct, VcsCall::CommitAndPush),
    (OperatingMode::Direct, VcsCall::MergeBranch),
    (OperatingMode::Direct, VcsCall::CreateRelease),
  ];

  for (mode, failing) in cases {
    let dir = TempDir::new()?;
    let mut config = direct_config(true);
    config.workflow.mode = mode;
    let ctx = context_with(dir.path(), config);
    let vcs = MemoryVcs::new();
    vcs.fail_on(failing);
    let mut sink = CapturedOutputs::default();

    let result = run_workflow(&ctx, &vcs, &python_published(), &mut sink);

    assert!(result.is_err(), "{mode} / {failing:?} should fail");
    assert!(
      vcs.working_branches().is_empty(),
      "{mode} / {failing:?} leaked {:?}",
      vcs.working_branches()
    );
    assert_eq!(sink.flushes.len(), 1);
  }

  // A branch reused from an open request is deleted too
  for failing in [VcsCall::CommitAndPush, VcsCall::CreateOrUpdateRequest] {
    let dir = TempDir::new()?;
    let ctx = context(dir.path(), OperatingMode::Pr);
    let vcs = vcs_with_open_request();
    vcs.fail_on(failing);
    let mut sink = CapturedOutputs::default();

    let result = run_workflow(&ctx, &vcs, &python_published(), &mut sink);

    assert!(result.is_err(), "{failing:?} should fail");
    assert_eq!(vcs.deleted(), vec!["regen-sdk-old".to_string()], "{failing:?}");
    assert!(!vcs.has_branch("regen-sdk-old"));
    assert_eq!(sink.flushes.len(), 1);
  }
  Ok(())
}

#[test]
fn test_debug_mode_keeps_reused_branch_on_failure() -> Result<()> {
  let dir = TempDir::new()?;
  let mut config = RegenConfig::default();
  config.workflow.debug = true;
  let ctx = context_with(dir.path(), config);
  let vcs = vcs_with_open_request();
  vcs.fail_on(VcsCall::CommitAndPush);

  let result = run_workflow(&ctx, &vcs, &python_published(), &mut CapturedOutputs::default());

  assert!(result.is_err());
  assert!(vcs.has_branch("regen-sdk-old"));
  assert_eq!(vcs.count(VcsCall::DeleteBranch), 0);
  Ok(())
}

#[test]
fn test_language_listing_failure_deletes_branch() -> Result<()> {
  for mode in [OperatingMode::Pr, OperatingMode::Direct] {
    let dir = TempDir::new()?;
    let ctx = context(dir.path(), mode);
    let vcs = MemoryVcs::new();
    let generator = python_published().failing_languages("cannot list targets");
    let mut sink = CapturedOutputs::default();

    let err = run_workflow(&ctx, &vcs, &generator, &mut sink).unwrap_err();

    assert!(matches!(err, RegenError::Generator(GeneratorError::Failed { .. })));
    assert_eq!(vcs.count(VcsCall::DeleteBranch), 1, "{mode}");
    assert!(vcs.working_branches().is_empty(), "{mode}");
    assert_eq!(vcs.count(VcsCall::CommitAndPush), 0);
    assert!(!Ledger::from_context(&ctx).path().exists());
    assert_eq!(sink.flushes.len(), 1);
    assert_eq!(sink.last().expect("outputs flushed")["python_regenerated"], "true");
  }
  Ok(())
}

#[test]
fn test_unreadable_ledger_deletes_branch() -> Result<()> {
  for mode in [OperatingMode::Pr, OperatingMode::Direct] {
    let dir = TempDir::new()?;
    let ctx = context(dir.path(), mode);
    let ledger = Ledger::from_context(&ctx);
    std::fs::write(ledger.path(), "releases = [not toml")?;
    let vcs = MemoryVcs::new();
    let mut sink = CapturedOutputs::default();

    let err = run_workflow(&ctx, &vcs, &python_published(), &mut sink).unwrap_err();

    assert!(matches!(err, RegenError::Ledger(LedgerError::Unreadable { .. })), "{mode}");
    assert!(vcs.working_branches().is_empty(), "{mode}");
    assert_eq!(vcs.count(VcsCall::CommitAndPush), 0);
    assert_eq!(std::fs::read_to_string(ledger.path())?, "releases = [not toml");
    assert_eq!(sink.flushes.len(), 1);
  }
  Ok(())
}

#[test]
fn test_branch_resolution_failure_skips_generation() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();
  vcs.fail_on(VcsCall::FindOrCreateBranch);
  let generator = python_published();

  assert!(run_workflow(&ctx, &vcs, &generator, &mut CapturedOutputs::default()).is_err());
  assert_eq!(generator.generate_calls(), 0);
  Ok(())
}

#[test]
fn test_debug_mode_keeps_branch_on_failure() -> Result<()> {
  let dir = TempDir::new()?;
  let mut config = direct_config(false);
  config.workflow.debug = true;
  let ctx = context_with(dir.path(), config);
  let vcs = MemoryVcs::new();

  let result = run_workflow(&ctx, &vcs, &generator().failing("boom"), &mut CapturedOutputs::default());

  assert!(result.is_err());
  assert_eq!(vcs.working_branches().len(), 1);
  assert_eq!(vcs.count(VcsCall::DeleteBranch), 0);
  Ok(())
}

#[test]
fn test_branch_delete_failure_does_not_mask_error() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();
  vcs.fail_on(VcsCall::DeleteBranch);

  let err = run_workflow(&ctx, &vcs, &generator().failing("boom"), &mut CapturedOutputs::default()).unwrap_err();

  assert!(matches!(err, RegenError::Generator(GeneratorError::Failed { .. })));
  Ok(())
}

#[test]
fn test_generator_below_floor_fails_before_branching() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context(dir.path(), OperatingMode::Pr);
  let vcs = MemoryVcs::new();
  let generator = ScriptedGenerator::new(Version::new(1, 160, 0)).with_languages(&["python"]);
  let mut sink = CapturedOutputs::default();

  let err = run_workflow(&ctx, &vcs, &generator, &mut sink).unwrap_err();

  assert!(matches!(err, RegenError::Generator(GeneratorError::BelowMinimum { .. })));
  assert_eq!(err.exit_code(), ExitCode::Precondition);
  assert_eq!(sink.last().expect("outputs flushed")["resolved_generator_version"], "1.160.0");
  assert_eq!(vcs.count(VcsCall::FindOrCreateBranch), 0);
  assert_eq!(generator.generate_calls(), 0);
  Ok(())
}

#[test]
fn test_pinned_version_mismatch() -> Result<()> {
  let dir = TempDir::new()?;
  let mut config = RegenConfig::default();
  config.generator.pinned_version = Some("v1.171.0".to_string());
  let ctx = context_with(dir.path(), config);
  let vcs = MemoryVcs::new();
  let mut sink = CapturedOutputs::default();

  let err = run_workflow(&ctx, &vcs, &python_published(), &mut sink).unwrap_err();

  assert!(matches!(err, RegenError::Generator(GeneratorError::PinMismatch { .. })));
  assert!(!sink.last().expect("outputs flushed").contains_key("resolved_generator_version"));
  Ok(())
}

#[test]
fn test_generator_without_info_regenerates_nothing() -> Result<()> {
  let dir = TempDir::new()?;
  let ctx = context_with(dir.path(), direct_config(true));
  let vcs = MemoryVcs::new();
  let mut run = generation_run(&[lang("python", "0.3.0", true, true)]);
  run.info = None;
  let mut sink = CapturedOutputs::default();

  let summary = run_workflow(&ctx, &vcs, &generator().with_run(run), &mut sink)?;

  assert!(!summary.anything_regenerated);
  assert_eq!(sink.last().expect("outputs flushed")["python_regenerated"], "true");
  assert_eq!(vcs.count(VcsCall::MergeBranch), 0);
  assert!(!Ledger::from_context(&ctx).path().exists());
  Ok(())
}
