//! GitHubVcs branch, commit, merge and delete operations against a real bare remote
//!
//! Only the git half is exercised here; request and release operations need `gh`.

use crate::helpers::*;
use anyhow::Result;
use sdk_regen::core::config::OperatingMode;
use sdk_regen::core::error::{GitError, RegenError};
use sdk_regen::core::vcs::{GitHubVcs, SystemGit, VersionControl};
use sdk_regen::testing::fixtures::context;

const BRANCH: &str = "regen-sdk-20261018-150405";

fn open(workspace: &TestWorkspace) -> Result<GitHubVcs> {
  let ctx = context(&workspace.path, OperatingMode::Direct);
  Ok(GitHubVcs::open(&ctx)?)
}

#[test]
fn test_creates_branch_from_default() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;

  let branch = vcs.find_or_create_branch(None)?;

  assert_eq!(branch.name, BRANCH);
  assert!(branch.created);
  assert_eq!(workspace.current_branch()?, BRANCH);
  Ok(())
}

#[test]
fn test_new_branch_names_do_not_collide() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;

  let first = vcs.find_or_create_branch(None)?;
  let second = vcs.find_or_create_branch(None)?;

  assert_eq!(first.name, BRANCH);
  assert_eq!(second.name, format!("{}-2", BRANCH));
  Ok(())
}

#[test]
fn test_hint_reuses_remote_branch() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  git(&workspace.path, &["checkout", "-b", "regen-sdk-old"])?;
  workspace.write_file("out/python/setup.py", "# v0.2.0\n")?;
  let pushed = workspace.commit("Old regeneration")?;
  git(&workspace.path, &["push", "origin", "regen-sdk-old"])?;
  git(&workspace.path, &["checkout", "main"])?;
  git(&workspace.path, &["branch", "-D", "regen-sdk-old"])?;

  let vcs = open(&workspace)?;
  let branch = vcs.find_or_create_branch(Some("regen-sdk-old"))?;

  assert_eq!(branch.name, "regen-sdk-old");
  assert!(!branch.created);
  assert_eq!(workspace.head()?, pushed);
  Ok(())
}

#[test]
fn test_stale_hint_creates_new_branch() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;

  let branch = vcs.find_or_create_branch(Some("regen-sdk-gone"))?;

  assert!(branch.created);
  assert_eq!(branch.name, BRANCH);
  Ok(())
}

#[test]
fn test_commit_and_push() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;
  let branch = vcs.find_or_create_branch(None)?;

  workspace.write_file("out/python/setup.py", "# v0.3.0\n")?;
  let commit = vcs.commit_and_push(&branch.name, "chore: regenerate SDKs")?;

  assert_eq!(workspace.remote_rev(&branch.name)?, commit);
  assert_eq!(workspace.remote_log(&branch.name, 1)?, vec!["chore: regenerate SDKs"]);
  Ok(())
}

#[test]
fn test_merge_into_default_branch() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;
  let branch = vcs.find_or_create_branch(None)?;
  workspace.write_file("out/python/setup.py", "# v0.3.0\n")?;
  vcs.commit_and_push(&branch.name, "chore: regenerate SDKs")?;

  let merge = vcs.merge_branch(&branch.name)?;

  assert_eq!(workspace.remote_rev("main")?, merge);
  assert_eq!(
    workspace.remote_log("main", 1)?,
    vec![format!("Merge branch '{}' into main", branch.name)]
  );
  let branch_head = workspace.remote_rev(&branch.name)?;
  git(&workspace.remote, &["merge-base", "--is-ancestor", &branch_head, "main"])?;
  assert_eq!(workspace.current_branch()?, "main");
  Ok(())
}

#[test]
fn test_conflicting_merge_is_aborted() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;
  let branch = vcs.find_or_create_branch(None)?;
  workspace.write_file("out/python/setup.py", "# v0.3.0\n")?;
  vcs.commit_and_push(&branch.name, "chore: regenerate SDKs")?;

  git(&workspace.path, &["checkout", "main"])?;
  workspace.write_file("out/python/setup.py", "# hand edited\n")?;
  let main_head = workspace.commit("Edit python SDK by hand")?;
  git(&workspace.path, &["push", "origin", "main"])?;

  let err = vcs.merge_branch(&branch.name).unwrap_err();

  assert!(matches!(err, RegenError::Git(GitError::MergeFailed { .. })));
  assert!(!workspace.path.join(".git").join("MERGE_HEAD").exists());
  let status = git(&workspace.path, &["status", "--porcelain"])?;
  assert!(String::from_utf8_lossy(&status.stdout).trim().is_empty());
  assert_eq!(workspace.head()?, main_head);
  assert_eq!(workspace.remote_rev("main")?, main_head);
  Ok(())
}

#[test]
fn test_delete_branch_everywhere() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;
  let branch = vcs.find_or_create_branch(None)?;
  workspace.write_file("out/go/go.mod", "module acme\n")?;
  vcs.commit_and_push(&branch.name, "chore: regenerate SDKs")?;

  vcs.delete_branch(&branch.name)?;

  assert_eq!(workspace.current_branch()?, "main");
  assert!(!workspace.local_branches()?.contains(&branch.name));
  assert!(!workspace.remote_branches()?.contains(&branch.name));
  Ok(())
}

#[test]
fn test_delete_unpushed_branch() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;
  let branch = vcs.find_or_create_branch(None)?;

  vcs.delete_branch(&branch.name)?;

  assert_eq!(workspace.local_branches()?, vec!["main".to_string()]);
  Ok(())
}

#[test]
fn test_find_missing_branch() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let vcs = open(&workspace)?;

  let err = vcs.find_branch("regen-sdk-missing").unwrap_err();

  assert!(matches!(err, RegenError::Git(GitError::BranchNotFound { .. })));
  Ok(())
}

#[test]
fn test_commit_all_without_changes() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let git = SystemGit::open(&workspace.path)?;

  assert!(!git.has_changes()?);
  assert!(!git.commit_all("nothing")?);

  workspace.write_file("notes.txt", "x\n")?;
  assert!(git.commit_all("add notes")?);
  assert!(!git.has_changes()?);
  Ok(())
}
