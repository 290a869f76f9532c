//! Generator that replays a prepared result

use crate::core::context::RunContext;
use crate::core::error::{GeneratorError, RegenError, RegenResult};
use crate::generator::{GenerationFailure, GenerationRun, Generator, check_pin};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum Outcome {
  Run(GenerationRun),
  Fail { partial: GenerationRun, stderr: String },
}

/// Generator with a fixed version, language list and generation outcome
#[derive(Debug)]
pub struct ScriptedGenerator {
  version: semver::Version,
  languages: Vec<String>,
  languages_error: Option<String>,
  outcome: Outcome,
  generate_calls: AtomicUsize,
}

impl ScriptedGenerator {
  /// Generator at `version` that reports nothing
  pub fn new(version: semver::Version) -> Self {
    Self {
      version,
      languages: Vec::new(),
      languages_error: None,
      outcome: Outcome::Run(GenerationRun::default()),
      generate_calls: AtomicUsize::new(0),
    }
  }

  pub fn with_languages(mut self, languages: &[&str]) -> Self {
    self.languages = languages.iter().map(|l| l.to_string()).collect();
    self
  }

  pub fn with_run(mut self, run: GenerationRun) -> Self {
    self.outcome = Outcome::Run(run);
    self
  }

  /// Make `generate` fail with `stderr`
  pub fn failing(self, stderr: &str) -> Self {
    self.failing_after(GenerationRun::default(), stderr)
  }

  /// Make `generate` fail with `stderr` after reporting `partial`
  pub fn failing_after(mut self, partial: GenerationRun, stderr: &str) -> Self {
    self.outcome = Outcome::Fail {
      partial,
      stderr: stderr.to_string(),
    };
    self
  }

  /// Make `supported_languages` fail with `stderr`
  pub fn failing_languages(mut self, stderr: &str) -> Self {
    self.languages_error = Some(stderr.to_string());
    self
  }

  pub fn generate_calls(&self) -> usize {
    self.generate_calls.load(Ordering::SeqCst)
  }
}

impl Generator for ScriptedGenerator {
  fn resolve_version(&self, pinned: Option<&semver::Version>) -> RegenResult<semver::Version> {
    check_pin(self.version.clone(), pinned)
  }

  fn supported_languages(&self) -> RegenResult<Vec<String>> {
    match &self.languages_error {
      Some(stderr) => Err(failed("scripted languages", stderr)),
      None => Ok(self.languages.clone()),
    }
  }

  fn generate(&self, _ctx: &RunContext, _version: &semver::Version) -> Result<GenerationRun, GenerationFailure> {
    self.generate_calls.fetch_add(1, Ordering::SeqCst);
    match &self.outcome {
      Outcome::Run(run) => Ok(run.clone()),
      Outcome::Fail { partial, stderr } => Err(GenerationFailure {
        partial: partial.clone(),
        error: failed("scripted generate", stderr),
      }),
    }
  }
}

fn failed(command: &str, stderr: &str) -> RegenError {
  RegenError::Generator(GeneratorError::Failed {
    command: command.to_string(),
    stderr: stderr.to_string(),
  })
}
