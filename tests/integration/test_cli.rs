//! Tests for the `sdk-regen` binary

use crate::helpers::*;
use anyhow::Result;
use sdk_regen::release::{GeneratedLanguage, Ledger, ReleaseRecord};

fn seed_ledger(workspace: &TestWorkspace) -> Result<ReleaseRecord> {
  let mut record = ReleaseRecord::new("2026-10-18 15:04:05", "1.0.0", "1.170.0", "2.4.1", "openapi.yaml");
  record.languages_generated.insert(
    "python".to_string(),
    GeneratedLanguage {
      version: "0.3.0".to_string(),
      path: "out/python".to_string(),
    },
  );
  Ledger::new(workspace.path.join("RELEASES.toml")).append(&record)?;
  Ok(record)
}

#[test]
fn test_ledger_latest_on_empty_ledger() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_sdk_regen(&workspace.path, &["ledger", "latest"])?;

  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stderr).contains("No release records found"));
  Ok(())
}

#[test]
fn test_ledger_latest_json() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let record = seed_ledger(&workspace)?;

  let output = run_sdk_regen(&workspace.path, &["ledger", "latest", "--json"])?;

  assert!(output.status.success());
  let printed: ReleaseRecord = serde_json::from_slice(&output.stdout)?;
  assert_eq!(printed, record);
  Ok(())
}

#[test]
fn test_ledger_latest_markdown() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  seed_ledger(&workspace)?;

  let output = run_sdk_regen(&workspace.path, &["ledger", "latest"])?;

  assert!(output.status.success());
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.starts_with("# SDK regeneration 2026-10-18 15:04:05"));
  assert!(stdout.contains("- **python** v0.3.0 (`out/python`)"));
  Ok(())
}

#[test]
fn test_ledger_list() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  seed_ledger(&workspace)?;

  let output = run_sdk_regen(&workspace.path, &["ledger", "list", "--json"])?;

  assert!(output.status.success());
  let records: Vec<ReleaseRecord> = serde_json::from_slice(&output.stdout)?;
  assert_eq!(records.len(), 1);
  Ok(())
}

#[test]
fn test_invalid_config_is_a_user_error() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("regen.toml", "[generator]\npinned_version = \"not-a-version\"\n")?;

  let output = run_sdk_regen(&workspace.path, &["ledger", "latest"])?;

  assert_eq!(output.status.code(), Some(1));
  Ok(())
}

#[test]
fn test_run_rejects_bad_invoke_time() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_sdk_regen(&workspace.path, &["run", "--invoke-time", "yesterday"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("invoke-time"));
  Ok(())
}

#[test]
fn test_run_rejects_unknown_mode() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_sdk_regen(&workspace.path, &["run", "--mode", "sideways"])?;

  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("sideways"));
  Ok(())
}

#[test]
fn test_run_with_missing_generator_fails_without_branching() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file(
    "regen.toml",
    "[workflow]\nmode = \"direct\"\n\n[generator]\nbinary = \"sdk-regen-missing-generator\"\n",
  )?;
  workspace.commit("Use a missing generator")?;

  let output = run_sdk_regen(&workspace.path, &["run"])?;

  assert!(!output.status.success());
  assert_eq!(workspace.local_branches()?, vec!["main".to_string()]);
  assert_eq!(workspace.remote_branches()?, vec!["main".to_string()]);
  // Outputs still flushed (to stdout without GITHUB_OUTPUT)
  let outputs: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert!(outputs.as_object().is_some_and(|o| o.is_empty()));
  Ok(())
}
