use crate::core::error::{ConfigError, RegenError, RegenResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration for sdk-regen
/// Searched in order: regen.toml, .regen.toml, .github/regen.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegenConfig {
  #[serde(default)]
  pub workflow: WorkflowConfig,
  #[serde(default)]
  pub generator: GeneratorConfig,
  #[serde(default)]
  pub ledger: LedgerConfig,
}

/// How a run publishes its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
  /// Open or update a review request for the working branch
  #[default]
  Pr,
  /// Merge the working branch into the default branch, optionally tagging a release
  Direct,
}

impl fmt::Display for OperatingMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OperatingMode::Pr => write!(f, "pr"),
      OperatingMode::Direct => write!(f, "direct"),
    }
  }
}

impl FromStr for OperatingMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pr" => Ok(OperatingMode::Pr),
      "direct" => Ok(OperatingMode::Direct),
      other => Err(format!("unknown mode '{}' (expected 'pr' or 'direct')", other)),
    }
  }
}

/// `[workflow]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
  #[serde(default)]
  pub mode: OperatingMode,

  /// Keep working branches around on failure (and in direct mode)
  #[serde(default)]
  pub debug: bool,

  /// Create a tagged release after a direct merge
  #[serde(default)]
  pub create_release: bool,

  #[serde(default = "default_branch")]
  pub default_branch: String,

  #[serde(default = "default_remote")]
  pub remote: String,

  /// Prefix for branches created by the workflow (default: "regen-sdk")
  #[serde(default = "default_branch_prefix")]
  pub branch_prefix: String,

  /// Title prefix identifying review requests owned by the workflow
  #[serde(default = "default_request_title")]
  pub request_title: String,

  /// Generation version the previous run produced, quoted in request bodies
  #[serde(default)]
  pub previous_generation_version: Option<String>,
}

fn default_branch() -> String {
  "main".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_branch_prefix() -> String {
  "regen-sdk".to_string()
}

fn default_request_title() -> String {
  "chore: regenerate SDKs".to_string()
}

impl Default for WorkflowConfig {
  fn default() -> Self {
    Self {
      mode: OperatingMode::default(),
      debug: false,
      create_release: false,
      default_branch: default_branch(),
      remote: default_remote(),
      branch_prefix: default_branch_prefix(),
      request_title: default_request_title(),
      previous_generation_version: None,
    }
  }
}

/// `[generator]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
  /// Generator executable (looked up on PATH)
  #[serde(default = "default_generator_binary")]
  pub binary: String,

  /// Exact generator version to require; "latest" or unset accepts whatever is installed
  #[serde(default)]
  pub pinned_version: Option<String>,

  /// Location of the API document handed to the generator
  #[serde(default = "default_doc_location")]
  pub doc_location: String,
}

fn default_generator_binary() -> String {
  "sdkgen".to_string()
}

fn default_doc_location() -> String {
  "openapi.yaml".to_string()
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    Self {
      binary: default_generator_binary(),
      pinned_version: None,
      doc_location: default_doc_location(),
    }
  }
}

impl GeneratorConfig {
  /// The pinned version, if one is set and is not "latest"
  pub fn pinned(&self) -> RegenResult<Option<semver::Version>> {
    match self.pinned_version.as_deref().map(str::trim) {
      None | Some("") | Some("latest") => Ok(None),
      Some(v) => {
        let v = v.strip_prefix('v').unwrap_or(v);
        semver::Version::parse(v).map(Some).map_err(|_| {
          RegenError::Config(ConfigError::InvalidValue {
            field: "generator.pinned_version".to_string(),
            value: v.to_string(),
          })
        })
      }
    }
  }
}

/// `[ledger]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
  /// Directory holding the ledger (relative to the workspace root)
  #[serde(default = "default_ledger_dir")]
  pub dir: PathBuf,

  #[serde(default = "default_ledger_file")]
  pub file: String,
}

fn default_ledger_dir() -> PathBuf {
  PathBuf::from(".")
}

fn default_ledger_file() -> String {
  "RELEASES.toml".to_string()
}

impl Default for LedgerConfig {
  fn default() -> Self {
    Self {
      dir: default_ledger_dir(),
      file: default_ledger_file(),
    }
  }
}

/// Values supplied on the command line (or as action inputs) that win over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub mode: Option<OperatingMode>,
  pub debug: Option<bool>,
  pub create_release: Option<bool>,
  pub generator_version: Option<String>,
  pub doc_location: Option<String>,
}

impl RegenConfig {
  /// Find config file in search order: regen.toml, .regen.toml, .github/regen.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("regen.toml"),
      path.join(".regen.toml"),
      path.join(".github").join("regen.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config (defaults when no file exists)
  pub fn load(path: &Path) -> RegenResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: RegenConfig = toml_edit::de::from_str(&content).map_err(|e| {
      RegenError::Config(ConfigError::Invalid {
        path: config_path.clone(),
        reason: e.to_string(),
      })
    })?;

    config.validate()?;
    Ok(config)
  }

  /// Apply command-line overrides, returning the final immutable config
  pub fn with_overrides(mut self, overrides: ConfigOverrides) -> RegenResult<Self> {
    if let Some(mode) = overrides.mode {
      self.workflow.mode = mode;
    }
    if let Some(debug) = overrides.debug {
      self.workflow.debug = debug;
    }
    if let Some(create_release) = overrides.create_release {
      self.workflow.create_release = create_release;
    }
    if let Some(version) = overrides.generator_version {
      self.generator.pinned_version = Some(version);
    }
    if let Some(doc) = overrides.doc_location {
      self.generator.doc_location = doc;
    }

    self.validate()?;
    Ok(self)
  }

  /// Validate field values that serde cannot check
  pub fn validate(&self) -> RegenResult<()> {
    self.generator.pinned()?;

    for (field, value) in [
      ("workflow.default_branch", &self.workflow.default_branch),
      ("workflow.remote", &self.workflow.remote),
      ("workflow.branch_prefix", &self.workflow.branch_prefix),
      ("generator.binary", &self.generator.binary),
    ] {
      if value.trim().is_empty() {
        return Err(RegenError::Config(ConfigError::InvalidValue {
          field: field.to_string(),
          value: value.clone(),
        }));
      }
    }

    if self.workflow.branch_prefix == self.workflow.default_branch {
      return Err(RegenError::with_help(
        "workflow.branch_prefix must differ from the default branch",
        "Working branches are deleted after direct merges; they must never be the default branch.",
      ));
    }

    Ok(())
  }
}
