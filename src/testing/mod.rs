//! In-memory collaborators for driving the workflow in tests
//!
//! [`MemoryVcs`] and [`ScriptedGenerator`] stand in for git/gh and the
//! generator binary. They record every call so tests can assert on side
//! effects, and [`MemoryVcs::fail_on`] injects failures at any step.
//!
//! ```rust,ignore
//! use sdk_regen::testing::{CapturedOutputs, MemoryVcs, ScriptedGenerator, fixtures};
//!
//! let vcs = MemoryVcs::new();
//! let generator = ScriptedGenerator::new(semver::Version::new(1, 170, 0))
//!   .with_languages(&["python"])
//!   .with_run(fixtures::generation_run(&[fixtures::lang("python", "0.3.0", true, true)]));
//! let mut sink = CapturedOutputs::default();
//!
//! run_workflow(&ctx, &vcs, &generator, &mut sink)?;
//! ```

mod memory_vcs;
mod scripted_generator;

pub use memory_vcs::{DEFAULT_BRANCH, MemoryVcs, REQUEST_TITLE, RecordedRelease, VcsCall};
pub use scripted_generator::ScriptedGenerator;

use crate::core::error::RegenResult;
use crate::core::outputs::OutputSink;
use std::collections::BTreeMap;

/// Sink that keeps every flush in memory
#[derive(Debug, Default)]
pub struct CapturedOutputs {
  pub flushes: Vec<BTreeMap<String, String>>,
}

impl CapturedOutputs {
  /// Outputs of the most recent flush
  pub fn last(&self) -> Option<&BTreeMap<String, String>> {
    self.flushes.last()
  }
}

impl OutputSink for CapturedOutputs {
  fn emit(&mut self, outputs: &BTreeMap<String, String>) -> RegenResult<()> {
    self.flushes.push(outputs.clone());
    Ok(())
  }
}

/// Test fixtures and helper functions
pub mod fixtures {
  use crate::core::config::{OperatingMode, RegenConfig};
  use crate::core::context::RunContext;
  use crate::generator::{GenerationInfo, GenerationRun, LanguageInfo, LanguageResult};
  use chrono::{TimeZone, Utc};
  use std::path::Path;

  /// One language in a scripted generation run
  #[derive(Debug, Clone)]
  pub struct ScriptedLanguage {
    pub language: String,
    pub version: String,
    pub regenerated: bool,
    pub published: bool,
  }

  pub fn lang(language: &str, version: &str, regenerated: bool, published: bool) -> ScriptedLanguage {
    ScriptedLanguage {
      language: language.to_string(),
      version: version.to_string(),
      regenerated,
      published,
    }
  }

  /// Generation run for doc version 1.0.0; languages write to `out/<lang>`
  pub fn generation_run(languages: &[ScriptedLanguage]) -> GenerationRun {
    GenerationRun {
      info: Some(GenerationInfo {
        doc_version: "1.0.0".to_string(),
        generator_version: "1.170.0".to_string(),
        generation_version: "2.4.1".to_string(),
        languages: languages
          .iter()
          .map(|l| {
            (
              l.language.clone(),
              LanguageInfo {
                version: l.version.clone(),
                package_name: format!("acme-{}", l.language),
              },
            )
          })
          .collect(),
      }),
      results: languages
        .iter()
        .map(|l| LanguageResult {
          language: l.language.clone(),
          regenerated: l.regenerated,
          output_path: Some(format!("out/{}", l.language)),
          published: l.published,
        })
        .collect(),
    }
  }

  /// Context rooted at `root`, invoked at 2026-10-18 15:04:05 UTC
  pub fn context(root: &Path, mode: OperatingMode) -> RunContext {
    let mut config = RegenConfig::default();
    config.workflow.mode = mode;
    context_with(root, config)
  }

  pub fn context_with(root: &Path, config: RegenConfig) -> RunContext {
    let time = Utc
      .with_ymd_and_hms(2026, 10, 18, 15, 4, 5)
      .single()
      .unwrap_or_else(Utc::now);
    RunContext::from_config(root, config, time)
  }
}
