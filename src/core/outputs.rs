//! Workflow outputs - the run's only channel back to its caller
//!
//! Outputs are accumulated as typed values during a run and rendered into the
//! flat `key=value` shape the invoking environment expects only when flushed.
//! `flush` consumes the value, so a run flushes at most once.

use crate::core::error::{RegenResult, ResultExt};
use crate::generator::LanguageResult;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

pub const RESOLVED_GENERATOR_VERSION: &str = "resolved_generator_version";
pub const BRANCH_NAME: &str = "branch_name";
pub const COMMIT_HASH: &str = "commit_hash";

/// Outputs accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowOutputs {
  resolved_generator_version: Option<String>,
  languages: Vec<LanguageResult>,
  branch_name: Option<String>,
  commit_hash: Option<String>,
}

/// Changes a finalizer contributes to the outputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputsDelta {
  pub commit_hash: Option<String>,
}

impl WorkflowOutputs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_resolved_generator_version(&mut self, version: &semver::Version) {
    self.resolved_generator_version = Some(version.to_string());
  }

  /// Record the generator's per-language results, in generator order
  pub fn set_language_results(&mut self, results: &[LanguageResult]) {
    self.languages = results.to_vec();
  }

  pub fn set_branch_name(&mut self, branch: &str) {
    self.branch_name = Some(branch.to_string());
  }

  pub fn apply(&mut self, delta: OutputsDelta) {
    if let Some(hash) = delta.commit_hash {
      self.commit_hash = Some(hash);
    }
  }

  pub fn branch_name(&self) -> Option<&str> {
    self.branch_name.as_deref()
  }

  pub fn commit_hash(&self) -> Option<&str> {
    self.commit_hash.as_deref()
  }

  /// Render the legacy flat key/value interface
  pub fn to_flat_map(&self) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    if let Some(version) = &self.resolved_generator_version {
      map.insert(RESOLVED_GENERATOR_VERSION.to_string(), version.clone());
    }

    for result in &self.languages {
      map.insert(format!("{}_regenerated", result.language), result.regenerated.to_string());
      if let Some(path) = &result.output_path {
        map.insert(format!("{}_directory", result.language), path.clone());
      }
      if result.published {
        map.insert(format!("publish_{}", result.language), "true".to_string());
      }
    }

    if let Some(branch) = &self.branch_name {
      map.insert(BRANCH_NAME.to_string(), branch.clone());
    }
    if let Some(hash) = &self.commit_hash {
      map.insert(COMMIT_HASH.to_string(), hash.clone());
    }

    map
  }

  /// Hand the outputs to their sink
  pub fn flush(self, sink: &mut dyn OutputSink) -> RegenResult<()> {
    sink.emit(&self.to_flat_map())
  }
}

/// Destination for flushed outputs
pub trait OutputSink {
  fn emit(&mut self, outputs: &BTreeMap<String, String>) -> RegenResult<()>;
}

/// GitHub Actions `$GITHUB_OUTPUT` file
pub struct GithubOutputFile {
  path: PathBuf,
}

impl GithubOutputFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Sink named by `GITHUB_OUTPUT`, if the variable is set
  pub fn from_env() -> Option<Self> {
    std::env::var_os("GITHUB_OUTPUT")
      .filter(|p| !p.is_empty())
      .map(|p| Self::new(PathBuf::from(p)))
  }
}

impl OutputSink for GithubOutputFile {
  fn emit(&mut self, outputs: &BTreeMap<String, String>) -> RegenResult<()> {
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .with_context(|| format!("Failed to open output file {}", self.path.display()))?;

    file
      .write_all(render_github_output(outputs).as_bytes())
      .with_context(|| format!("Failed to write output file {}", self.path.display()))?;
    Ok(())
  }
}

/// Pretty JSON on stdout (local runs)
pub struct JsonStdout;

impl OutputSink for JsonStdout {
  fn emit(&mut self, outputs: &BTreeMap<String, String>) -> RegenResult<()> {
    println!("{}", serde_json::to_string_pretty(outputs)?);
    Ok(())
  }
}

/// Render outputs in `$GITHUB_OUTPUT` syntax; multi-line values use a heredoc delimiter
fn render_github_output(outputs: &BTreeMap<String, String>) -> String {
  let mut rendered = String::new();
  for (key, value) in outputs {
    if value.contains('\n') {
      let mut delimiter = "REGEN_EOF".to_string();
      while value.contains(&delimiter) {
        delimiter.push('_');
      }
      rendered.push_str(&format!("{}<<{}\n{}\n{}\n", key, delimiter, value, delimiter));
    } else {
      rendered.push_str(&format!("{}={}\n", key, value));
    }
  }
  rendered
}
