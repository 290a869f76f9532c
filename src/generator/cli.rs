//! Generator backed by a system binary
//!
//! Contract with the binary:
//!
//! - `<bin> --version` prints the version as its last whitespace-separated token
//! - `<bin> languages` prints one supported language per line
//! - `<bin> generate --doc <location> --report <file>` writes a JSON
//!   [`GenerationRun`] report to `<file>`, possibly partial when it exits non-zero

use super::{GenerationFailure, GenerationRun, Generator, check_pin};
use crate::core::context::RunContext;
use crate::core::error::{GeneratorError, RegenError, RegenResult, ResultExt};
use std::path::Path;
use std::process::{Command, Output};
use tracing::{debug, info};

pub struct SystemGenerator {
  binary: String,
}

impl SystemGenerator {
  pub fn new(binary: impl Into<String>) -> Self {
    Self { binary: binary.into() }
  }

  pub fn from_context(ctx: &RunContext) -> Self {
    Self::new(ctx.config.generator.binary.clone())
  }

  /// Run the binary and return its output whatever the exit status
  fn spawn(&self, args: &[&str], ctx_dir: Option<&Path>) -> RegenResult<Output> {
    let mut cmd = Command::new(&self.binary);
    cmd.args(args);
    if let Some(dir) = ctx_dir {
      cmd.current_dir(dir);
    }

    cmd
      .output()
      .with_context(|| format!("Failed to execute {} (is it on PATH?)", self.binary))
  }

  fn run(&self, args: &[&str], ctx_dir: Option<&Path>) -> RegenResult<Output> {
    let output = self.spawn(args, ctx_dir)?;
    if !output.status.success() {
      return Err(self.failed(args, &output));
    }
    Ok(output)
  }

  fn failed(&self, args: &[&str], output: &Output) -> RegenError {
    RegenError::Generator(GeneratorError::Failed {
      command: self.describe(args),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
  }

  fn read_report(&self, path: &Path) -> RegenResult<GenerationRun> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read generator report {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| {
      RegenError::Generator(GeneratorError::InvalidOutput {
        command: self.describe(&["generate"]),
        reason: e.to_string(),
      })
    })
  }

  fn describe(&self, args: &[&str]) -> String {
    format!("{} {}", self.binary, args.first().copied().unwrap_or_default())
  }
}

/// Parse `--version` output: last token, optional leading `v`
pub(crate) fn parse_version_output(stdout: &str) -> Option<semver::Version> {
  let token = stdout.split_whitespace().last()?;
  let token = token.strip_prefix('v').unwrap_or(token);
  semver::Version::parse(token).ok()
}

/// Parse `languages` output: one per line, blanks and duplicates dropped, order kept
pub(crate) fn parse_languages_output(stdout: &str) -> Vec<String> {
  let mut languages: Vec<String> = Vec::new();
  for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
    if !languages.iter().any(|l| l == line) {
      languages.push(line.to_string());
    }
  }
  languages
}

impl Generator for SystemGenerator {
  fn resolve_version(&self, pinned: Option<&semver::Version>) -> RegenResult<semver::Version> {
    let output = self.run(&["--version"], None)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let installed = parse_version_output(&stdout).ok_or_else(|| {
      RegenError::Generator(GeneratorError::InvalidOutput {
        command: self.describe(&["--version"]),
        reason: format!("no semantic version in '{}'", stdout.trim()),
      })
    })?;

    let version = check_pin(installed, pinned)?;
    info!(version = %version, "resolved generator version");
    Ok(version)
  }

  fn supported_languages(&self) -> RegenResult<Vec<String>> {
    let output = self.run(&["languages"], None)?;
    Ok(parse_languages_output(&String::from_utf8_lossy(&output.stdout)))
  }

  fn generate(&self, ctx: &RunContext, version: &semver::Version) -> Result<GenerationRun, GenerationFailure> {
    let report_file = tempfile::Builder::new()
      .prefix("regen-report-")
      .suffix(".json")
      .tempfile()
      .context("Failed to create generator report file")?;
    let report_path = report_file.path().to_string_lossy().to_string();

    info!(
      generator = %self.binary,
      version = %version,
      doc = %ctx.config.generator.doc_location,
      "running generator"
    );
    let args: [&str; 5] = ["generate", "--doc", &ctx.config.generator.doc_location, "--report", &report_path];
    let output = self.spawn(&args, Some(&ctx.root))?;
    let report = self.read_report(report_file.path());

    if !output.status.success() {
      // A generator that dies early may leave an empty or truncated report
      let partial = report
        .inspect_err(|e| debug!(error = %e, "no usable report from failed generator"))
        .unwrap_or_default();
      return Err(GenerationFailure {
        partial,
        error: self.failed(&args, &output),
      });
    }

    let run = report?;

    debug!(results = run.results.len(), has_info = run.info.is_some(), "generator report parsed");
    Ok(run)
  }
}
