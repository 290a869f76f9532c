//! Error types for sdk-regen with contextual messages and exit codes
//!
//! Errors fall into three groups that map onto exit codes:
//!
//! - **Preconditions** (generator below the supported floor, pinned version
//!   mismatch, ledger unreadable or empty) abort before anything is mutated.
//! - **Collaborator failures** (git, gh, generator) are propagated verbatim.
//! - **User errors** (bad configuration or arguments).
//!
//! Best-effort cleanup failures never become a `RegenError`; they are logged
//! where they happen.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for sdk-regen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args)
  User = 1,
  /// System error (git, gh, generator, I/O)
  System = 2,
  /// Precondition failure (version floor, ledger state)
  Precondition = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for sdk-regen
#[derive(Debug)]
pub enum RegenError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Review-request / release platform errors
  Forge(ForgeError),

  /// Generator invocation and version errors
  Generator(GeneratorError),

  /// Release ledger errors
  Ledger(LedgerError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RegenError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RegenError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RegenError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RegenError::Message { message, context, help } => RegenError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RegenError::Config(_) => ExitCode::User,
      RegenError::Git(_) | RegenError::Forge(_) | RegenError::Io(_) => ExitCode::System,
      RegenError::Generator(e) if e.is_precondition() => ExitCode::Precondition,
      RegenError::Generator(_) => ExitCode::System,
      RegenError::Ledger(_) => ExitCode::Precondition,
      RegenError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RegenError::Config(e) => e.help_message(),
      RegenError::Git(e) => e.help_message(),
      RegenError::Forge(e) => e.help_message(),
      RegenError::Generator(e) => e.help_message(),
      RegenError::Ledger(e) => e.help_message(),
      RegenError::Message { help, .. } => help.clone(),
      RegenError::Io(_) => None,
    }
  }

  /// True if this is the ledger's "nothing recorded yet" error
  pub fn is_ledger_not_found(&self) -> bool {
    matches!(self, RegenError::Ledger(LedgerError::NotFound { .. }))
  }
}

impl fmt::Display for RegenError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RegenError::Config(e) => write!(f, "{}", e),
      RegenError::Git(e) => write!(f, "{}", e),
      RegenError::Forge(e) => write!(f, "{}", e),
      RegenError::Generator(e) => write!(f, "{}", e),
      RegenError::Ledger(e) => write!(f, "{}", e),
      RegenError::Io(e) => write!(f, "I/O error: {}", e),
      RegenError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RegenError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RegenError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RegenError {
  fn from(err: io::Error) -> Self {
    RegenError::Io(err)
  }
}

impl From<String> for RegenError {
  fn from(msg: String) -> Self {
    RegenError::message(msg)
  }
}

impl From<&str> for RegenError {
  fn from(msg: &str) -> Self {
    RegenError::message(msg)
  }
}

impl From<toml_edit::de::Error> for RegenError {
  fn from(err: toml_edit::de::Error) -> Self {
    RegenError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for RegenError {
  fn from(err: toml_edit::ser::Error) -> Self {
    RegenError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for RegenError {
  fn from(err: serde_json::Error) -> Self {
    RegenError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for RegenError {
  fn from(err: semver::Error) -> Self {
    RegenError::message(format!("Invalid semantic version: {}", err))
  }
}

impl From<chrono::ParseError> for RegenError {
  fn from(err: chrono::ParseError) -> Self {
    RegenError::message(format!("Invalid timestamp: {}", err))
  }
}

impl From<tempfile::PersistError> for RegenError {
  fn from(err: tempfile::PersistError) -> Self {
    RegenError::Io(err.error)
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file could not be parsed
  Invalid { path: PathBuf, reason: String },

  /// A field holds a value outside its allowed set
  InvalidValue { field: String, value: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } => Some("Check regen.toml against the documented [workflow], [generator] and [ledger] sections.".to_string()),
      ConfigError::InvalidValue { field, .. } if field == "workflow.mode" => {
        Some("Valid modes are 'pr' and 'direct'.".to_string())
      }
      ConfigError::InvalidValue { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::InvalidValue { field, value } => {
        write!(f, "Invalid value '{}' for {}", value, field)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Branch does not exist locally or on the remote
  BranchNotFound { branch: String },

  /// Push failed
  PushFailed {
    remote: String,
    branch: String,
    reason: String,
  },

  /// Merge into the default branch failed
  MergeFailed { branch: String, into: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") {
          Some("The remote branch moved since it was fetched. Re-run the workflow to pick up the new head.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check that the workflow token has contents: write permission.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run sdk-regen from inside a checkout, or pass --root: {}",
        path.display()
      )),
      GitError::MergeFailed { .. } => {
        Some("Resolve the conflict on the default branch, or switch the workflow to 'pr' mode.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::BranchNotFound { branch } => {
        write!(f, "Branch not found: {}", branch)
      }
      GitError::PushFailed { remote, branch, reason } => {
        write!(f, "Push to {}/{} failed: {}", remote, branch, reason)
      }
      GitError::MergeFailed { branch, into, reason } => {
        write!(f, "Merging {} into {} failed: {}", branch, into, reason)
      }
    }
  }
}

/// Review-request and release platform errors (gh CLI)
#[derive(Debug)]
pub enum ForgeError {
  /// gh command failed
  CommandFailed { command: String, stderr: String },

  /// gh produced output we could not interpret
  UnexpectedOutput { command: String, output: String },
}

impl ForgeError {
  fn help_message(&self) -> Option<String> {
    match self {
      ForgeError::CommandFailed { stderr, .. } if stderr.contains("GH_TOKEN") || stderr.contains("auth login") => {
        Some("Export GH_TOKEN (or GITHUB_TOKEN) for the gh CLI.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ForgeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ForgeError::CommandFailed { command, stderr } => {
        write!(f, "gh command failed: {}\n{}", command, stderr)
      }
      ForgeError::UnexpectedOutput { command, output } => {
        write!(f, "Unexpected output from {}: {}", command, output)
      }
    }
  }
}

/// Generator errors
#[derive(Debug)]
pub enum GeneratorError {
  /// Generator binary could not be run or exited non-zero
  Failed { command: String, stderr: String },

  /// Installed generator is older than the supported floor
  BelowMinimum {
    found: semver::Version,
    required: semver::Version,
  },

  /// Installed generator differs from the pinned version
  PinMismatch {
    pinned: semver::Version,
    installed: semver::Version,
  },

  /// Version or report output could not be parsed
  InvalidOutput { command: String, reason: String },
}

impl GeneratorError {
  /// Precondition errors abort before any mutation
  pub fn is_precondition(&self) -> bool {
    matches!(self, GeneratorError::BelowMinimum { .. } | GeneratorError::PinMismatch { .. })
  }

  fn help_message(&self) -> Option<String> {
    match self {
      GeneratorError::BelowMinimum { required, .. } => Some(format!(
        "Install generator {} or newer, or raise the pinned version in regen.toml.",
        required
      )),
      GeneratorError::PinMismatch { pinned, .. } => Some(format!(
        "Install generator {} or set [generator] pinned_version = \"latest\".",
        pinned
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GeneratorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GeneratorError::Failed { command, stderr } => {
        write!(f, "Generator failed: {}\n{}", command, stderr)
      }
      GeneratorError::BelowMinimum { found, required } => {
        write!(f, "Workflow requires at least version {} of the generator (found {})", required, found)
      }
      GeneratorError::PinMismatch { pinned, installed } => {
        write!(f, "Generator {} is pinned but {} is installed", pinned, installed)
      }
      GeneratorError::InvalidOutput { command, reason } => {
        write!(f, "Could not parse output of {}: {}", command, reason)
      }
    }
  }
}

/// Release ledger errors
#[derive(Debug)]
pub enum LedgerError {
  /// Ledger is absent or holds no records
  NotFound { path: PathBuf },

  /// Ledger exists but cannot be read or parsed
  Unreadable { path: PathBuf, reason: String },
}

impl LedgerError {
  fn help_message(&self) -> Option<String> {
    match self {
      LedgerError::NotFound { .. } => {
        Some("No release has been recorded yet. Run the workflow once with a regenerating generator.".to_string())
      }
      LedgerError::Unreadable { path, .. } => Some(format!(
        "Fix or remove {} by hand; sdk-regen never rewrites a ledger it cannot parse.",
        path.display()
      )),
    }
  }
}

impl fmt::Display for LedgerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LedgerError::NotFound { path } => {
        write!(f, "No release records found in {}", path.display())
      }
      LedgerError::Unreadable { path, reason } => {
        write!(f, "Release ledger {} is unreadable: {}", path.display(), reason)
      }
    }
  }
}

/// Result type alias for sdk-regen
pub type RegenResult<T> = Result<T, RegenError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RegenResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RegenResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RegenError>,
{
  fn context(self, ctx: impl Into<String>) -> RegenResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RegenResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RegenError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
