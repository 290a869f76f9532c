//! GitHub-backed version control: system git for branches, `gh` for requests and releases

use super::{ReviewRequest, SystemGit, VersionControl, WorkingBranch};
use crate::core::context::RunContext;
use crate::core::error::{ForgeError, GitError, RegenError, RegenResult, ResultExt};
use crate::release::ReleaseRecord;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Thin wrapper around the `gh` CLI
pub struct GhCli {
  work_dir: PathBuf,
}

/// Subset of `gh pr list --json` we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPullRequest {
  number: u64,
  url: String,
  head_ref_name: String,
  title: String,
  #[serde(default)]
  body: String,
}

impl From<GhPullRequest> for ReviewRequest {
  fn from(pr: GhPullRequest) -> Self {
    Self {
      number: pr.number,
      url: pr.url,
      branch: pr.head_ref_name,
      title: pr.title,
      body: pr.body,
    }
  }
}

impl GhCli {
  pub fn new(work_dir: &Path) -> Self {
    Self {
      work_dir: work_dir.to_path_buf(),
    }
  }

  /// Open pull requests, optionally only those whose head is `head`
  pub fn list_open_requests(&self, head: Option<&str>) -> RegenResult<Vec<ReviewRequest>> {
    let mut args = vec![
      "pr",
      "list",
      "--state",
      "open",
      "--limit",
      "100",
      "--json",
      "number,url,headRefName,title,body",
    ];
    if let Some(head) = head {
      args.extend(["--head", head]);
    }

    let stdout = self.run(&args)?;
    let prs: Vec<GhPullRequest> = serde_json::from_str(&stdout).map_err(|e| {
      RegenError::Forge(ForgeError::UnexpectedOutput {
        command: "gh pr list".to_string(),
        output: e.to_string(),
      })
    })?;

    Ok(prs.into_iter().map(ReviewRequest::from).collect())
  }

  /// Open a pull request, returning its URL
  pub fn create_request(&self, base: &str, head: &str, title: &str, body: &str) -> RegenResult<String> {
    let stdout = self.run(&[
      "pr", "create", "--base", base, "--head", head, "--title", title, "--body", body,
    ])?;

    stdout
      .lines()
      .rev()
      .map(str::trim)
      .find(|line| line.starts_with("http"))
      .map(str::to_string)
      .ok_or_else(|| {
        RegenError::Forge(ForgeError::UnexpectedOutput {
          command: "gh pr create".to_string(),
          output: stdout.clone(),
        })
      })
  }

  pub fn edit_request(&self, number: u64, title: &str, body: &str) -> RegenResult<()> {
    let number = number.to_string();
    self.run(&["pr", "edit", &number, "--title", title, "--body", body])?;
    Ok(())
  }

  pub fn release_exists(&self, tag: &str) -> RegenResult<bool> {
    let output = self
      .gh_cmd()
      .args(["release", "view", tag])
      .output()
      .context("Failed to execute gh release view")?;
    Ok(output.status.success())
  }

  pub fn create_release(&self, tag: &str, target: &str, title: &str, notes: &str) -> RegenResult<()> {
    self.run(&[
      "release", "create", tag, "--target", target, "--title", title, "--notes", notes,
    ])?;
    Ok(())
  }

  fn run(&self, args: &[&str]) -> RegenResult<String> {
    let output = self
      .gh_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute gh {}", args.first().copied().unwrap_or_default()))?;

    if !output.status.success() {
      return Err(RegenError::Forge(ForgeError::CommandFailed {
        command: format!("gh {}", args.iter().take(2).copied().collect::<Vec<_>>().join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// gh needs the token and repository variables from the environment, so it is not isolated like git
  fn gh_cmd(&self) -> Command {
    let mut cmd = Command::new("gh");
    cmd.current_dir(&self.work_dir);
    cmd.env("GH_PROMPT_DISABLED", "1");
    cmd.env("NO_COLOR", "1");
    cmd
  }
}

/// Settings GitHubVcs takes from the run context
#[derive(Debug, Clone)]
pub struct VcsSettings {
  pub remote: String,
  pub default_branch: String,
  pub request_title: String,
  pub new_branch_name: String,
  pub previous_generation_version: Option<String>,
}

impl VcsSettings {
  pub fn from_context(ctx: &RunContext) -> Self {
    let workflow = &ctx.config.workflow;
    Self {
      remote: workflow.remote.clone(),
      default_branch: workflow.default_branch.clone(),
      request_title: workflow.request_title.clone(),
      new_branch_name: ctx.new_branch_name(),
      previous_generation_version: workflow.previous_generation_version.clone(),
    }
  }
}

/// Version control on a GitHub checkout
pub struct GitHubVcs {
  git: SystemGit,
  gh: GhCli,
  settings: VcsSettings,
}

impl GitHubVcs {
  pub fn open(ctx: &RunContext) -> RegenResult<Self> {
    let git = SystemGit::open(&ctx.root)?;
    let gh = GhCli::new(git.work_tree());
    Ok(Self {
      git,
      gh,
      settings: VcsSettings::from_context(ctx),
    })
  }

  fn branch_exists(&self, name: &str) -> RegenResult<bool> {
    Ok(self.git.remote_branch_exists(&self.settings.remote, name)? || self.git.local_branch_exists(name)?)
  }

  /// Check out `name`, preferring the remote copy when one exists
  fn checkout_existing(&self, name: &str) -> RegenResult<()> {
    if self.git.remote_branch_exists(&self.settings.remote, name)? {
      self.git.checkout_tracking(&self.settings.remote, name)
    } else {
      self.git.checkout_branch(name)
    }
  }

  /// First free name derived from the run's branch name
  fn unique_branch_name(&self) -> RegenResult<String> {
    let base = &self.settings.new_branch_name;
    if !self.branch_exists(base)? {
      return Ok(base.clone());
    }
    let mut n = 2;
    loop {
      let candidate = format!("{}-{}", base, n);
      if !self.branch_exists(&candidate)? {
        return Ok(candidate);
      }
      n += 1;
    }
  }

  fn request_title(&self, record: &ReleaseRecord) -> String {
    format!("{} {}", self.settings.request_title, record.title)
  }
}

impl VersionControl for GitHubVcs {
  fn find_existing_request(&self, branch: Option<&str>) -> RegenResult<Option<ReviewRequest>> {
    let requests = self.gh.list_open_requests(branch)?;
    let found = requests
      .into_iter()
      .find(|r| r.title.starts_with(&self.settings.request_title));

    if let Some(request) = &found {
      debug!(number = request.number, branch = %request.branch, "found open review request");
    }
    Ok(found)
  }

  fn find_or_create_branch(&self, hint: Option<&str>) -> RegenResult<WorkingBranch> {
    self.git.fetch(&self.settings.remote)?;

    if let Some(name) = hint.filter(|h| !h.is_empty()) {
      if self.branch_exists(name)? {
        self.checkout_existing(name)?;
        info!(branch = name, "reusing existing branch");
        return Ok(WorkingBranch {
          name: name.to_string(),
          created: false,
        });
      }
      warn!(branch = name, "hinted branch no longer exists, creating a new one");
    }

    let name = self.unique_branch_name()?;
    let start_point = format!("{}/{}", self.settings.remote, self.settings.default_branch);
    self.git.create_and_checkout_branch(&name, &start_point)?;
    info!(branch = %name, from = %start_point, "created working branch");

    Ok(WorkingBranch { name, created: true })
  }

  fn find_branch(&self, name: &str) -> RegenResult<String> {
    if self.git.current_branch()? == name {
      return Ok(name.to_string());
    }
    if !self.branch_exists(name)? {
      return Err(RegenError::Git(GitError::BranchNotFound {
        branch: name.to_string(),
      }));
    }
    self.checkout_existing(name)?;
    Ok(name.to_string())
  }

  fn delete_branch(&self, name: &str) -> RegenResult<()> {
    if self.git.current_branch()? == name {
      let default = &self.settings.default_branch;
      if self.git.local_branch_exists(default)? {
        self.git.checkout_branch(default)?;
      } else {
        self.git.checkout_tracking(&self.settings.remote, default)?;
      }
    }

    if self.git.local_branch_exists(name)? {
      self.git.delete_local_branch(name)?;
    }
    self.git.delete_remote_branch(&self.settings.remote, name)?;
    info!(branch = name, "deleted working branch");
    Ok(())
  }

  fn commit_and_push(&self, branch: &str, message: &str) -> RegenResult<String> {
    if !self.git.commit_all(message)? {
      debug!(branch, "nothing to commit");
    }
    self.git.push_branch(&self.settings.remote, branch)?;
    self.git.head_commit()
  }

  fn create_or_update_request(
    &self,
    branch: &str,
    record: &ReleaseRecord,
    existing: Option<&ReviewRequest>,
  ) -> RegenResult<ReviewRequest> {
    let title = self.request_title(record);
    let body = request_body(record, self.settings.previous_generation_version.as_deref());

    match existing {
      Some(request) if request.body.contains(&fingerprint_marker(record)) && request.title == title => {
        info!(number = request.number, "review request already up to date");
        Ok(request.clone())
      }
      Some(request) => {
        self.gh.edit_request(request.number, &title, &body)?;
        info!(number = request.number, url = %request.url, "updated review request");
        Ok(ReviewRequest {
          title,
          body,
          ..request.clone()
        })
      }
      None => {
        let url = self.gh.create_request(&self.settings.default_branch, branch, &title, &body)?;
        let number = request_number(&url).ok_or_else(|| {
          RegenError::Forge(ForgeError::UnexpectedOutput {
            command: "gh pr create".to_string(),
            output: url.clone(),
          })
        })?;
        info!(number, url = %url, "opened review request");
        Ok(ReviewRequest {
          number,
          url,
          branch: branch.to_string(),
          title,
          body,
        })
      }
    }
  }

  fn merge_branch(&self, branch: &str) -> RegenResult<String> {
    let remote = &self.settings.remote;
    let default = &self.settings.default_branch;

    self.git.fetch(remote)?;
    self.git.checkout_tracking(remote, default)?;
    self.git.merge_into_current(branch, &format!("Merge branch '{}' into {}", branch, default))?;
    self.git.push_branch(remote, default)?;

    let commit = self.git.head_commit()?;
    info!(branch, into = %default, commit = %commit, "merged working branch");
    Ok(commit)
  }

  fn create_release(&self, record: &ReleaseRecord, commit: &str) -> RegenResult<()> {
    let notes = record.to_markdown();
    for (language, tag) in record.release_targets() {
      if self.gh.release_exists(&tag)? {
        if tag_is_shared(&tag) {
          warn!(
            tag = %tag,
            language = %language,
            "release tag already exists and may belong to another language, not released"
          );
        } else {
          info!(tag = %tag, "release already exists, skipping");
        }
        continue;
      }
      self
        .gh
        .create_release(&tag, commit, &format!("{} - {}", tag, record.title), &notes)?;
      info!(tag = %tag, commit, "created release");
    }
    Ok(())
  }
}

/// Bare `v<version>` tags carry no language, so any language at that version can claim them
fn tag_is_shared(tag: &str) -> bool {
  !tag.contains('/')
}

/// Hidden marker tying a request body to the record it was rendered from
pub fn fingerprint_marker(record: &ReleaseRecord) -> String {
  format!("<!-- sdk-regen:record {} -->", record.fingerprint())
}

/// Review-request body for a record
pub fn request_body(record: &ReleaseRecord, previous_generation_version: Option<&str>) -> String {
  let mut body = record.to_markdown();
  if let Some(previous) = previous_generation_version {
    body.push_str(&format!("\nPrevious generation version: `{}`\n", previous));
  }
  body.push('\n');
  body.push_str(&fingerprint_marker(record));
  body.push('\n');
  body
}

/// Pull request number from its URL (`.../pull/<n>`)
fn request_number(url: &str) -> Option<u64> {
  url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}
