//! Generator collaborator
//!
//! The code generator is a black box. The workflow needs three things from
//! it: the version that will run, the languages it supports, and a
//! generation run that reports per-language results.

pub mod cli;

pub use cli::SystemGenerator;

use crate::core::context::RunContext;
use crate::core::error::{GeneratorError, RegenError, RegenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Oldest generator release the workflow supports
pub const MIN_GENERATOR_VERSION: semver::Version = semver::Version::new(1, 161, 0);

/// Per-language data in the generator's info block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
  pub version: String,
  #[serde(default)]
  pub package_name: String,
}

/// Provenance and versions reported by a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInfo {
  pub doc_version: String,
  pub generator_version: String,
  #[serde(default)]
  pub generation_version: String,
  #[serde(default)]
  pub languages: BTreeMap<String, LanguageInfo>,
}

/// What happened to one language during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageResult {
  pub language: String,
  #[serde(default)]
  pub regenerated: bool,
  #[serde(default)]
  pub output_path: Option<String>,
  #[serde(default)]
  pub published: bool,
}

/// Result of a successful generator invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRun {
  /// Absent when the generator had nothing to report (e.g. no targets configured)
  #[serde(default)]
  pub info: Option<GenerationInfo>,
  /// Per-language results in generator order
  #[serde(default)]
  pub results: Vec<LanguageResult>,
}

/// A generator run that failed, with whatever it reported before failing
#[derive(Debug)]
pub struct GenerationFailure {
  /// Per-language results written before the failure; empty when there were none
  pub partial: GenerationRun,
  pub error: RegenError,
}

impl From<RegenError> for GenerationFailure {
  fn from(error: RegenError) -> Self {
    Self {
      partial: GenerationRun::default(),
      error,
    }
  }
}

impl From<GenerationFailure> for RegenError {
  fn from(failure: GenerationFailure) -> Self {
    failure.error
  }
}

/// Operations the workflow needs from the generator
pub trait Generator {
  /// Version of the generator that will run, checked against `pinned` when set
  fn resolve_version(&self, pinned: Option<&semver::Version>) -> RegenResult<semver::Version>;

  /// Supported languages, in the generator's canonical order
  fn supported_languages(&self) -> RegenResult<Vec<String>>;

  /// Run generation for the workspace.
  ///
  /// A failed run still hands back the per-language results it reported.
  fn generate(&self, ctx: &RunContext, version: &semver::Version) -> Result<GenerationRun, GenerationFailure>;
}

/// Fail if `version` is older than [`MIN_GENERATOR_VERSION`]
pub fn ensure_minimum_version(version: &semver::Version) -> RegenResult<()> {
  if *version < MIN_GENERATOR_VERSION {
    return Err(RegenError::Generator(GeneratorError::BelowMinimum {
      found: version.clone(),
      required: MIN_GENERATOR_VERSION,
    }));
  }
  Ok(())
}

/// Check an installed version against an optional pin
pub fn check_pin(installed: semver::Version, pinned: Option<&semver::Version>) -> RegenResult<semver::Version> {
  match pinned {
    Some(pinned) if *pinned != installed => Err(RegenError::Generator(GeneratorError::PinMismatch {
      pinned: pinned.clone(),
      installed,
    })),
    _ => Ok(installed),
  }
}
