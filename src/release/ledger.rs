//! Release ledger - the persisted history of regenerations
//!
//! The ledger is a TOML document with a `[[releases]]` array in chronological
//! order. It is read fresh on every access; nothing is cached across calls.

use super::record::ReleaseRecord;
use crate::core::context::RunContext;
use crate::core::error::{LedgerError, RegenError, RegenResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
  #[serde(default)]
  releases: Vec<ReleaseRecord>,
}

/// Ledger stored at a fixed path
#[derive(Debug, Clone)]
pub struct Ledger {
  path: PathBuf,
}

impl Ledger {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Ledger configured for this run
  pub fn from_context(ctx: &RunContext) -> Self {
    Self::new(ctx.ledger_path())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// All records, oldest first. An absent ledger has no records.
  pub fn records(&self) -> RegenResult<Vec<ReleaseRecord>> {
    Ok(self.read()?.releases)
  }

  /// Merge `record` into the history, keyed by document version.
  ///
  /// A record for a document version already in the ledger is folded into
  /// that entry, which then moves to the end. The file is replaced atomically.
  pub fn append(&self, record: &ReleaseRecord) -> RegenResult<()> {
    if record.is_empty() {
      return Err(RegenError::message(format!(
        "Refusing to record release '{}' with no generated languages",
        record.title
      )));
    }
    record.validate()?;

    let mut file = self.read()?;
    let entry = match file.releases.iter().position(|r| r.doc_version == record.doc_version) {
      Some(index) => {
        let mut existing = file.releases.remove(index);
        existing.merge(record.clone());
        info!(doc_version = %record.doc_version, "merged release into existing ledger entry");
        existing
      }
      None => {
        info!(doc_version = %record.doc_version, "appended release to ledger");
        record.clone()
      }
    };
    file.releases.push(entry);

    self.write(&file)
  }

  /// Latest record; fails with `LedgerError::NotFound` if there is none
  pub fn most_recent(&self) -> RegenResult<ReleaseRecord> {
    self.read()?.releases.pop().ok_or_else(|| {
      RegenError::Ledger(LedgerError::NotFound {
        path: self.path.clone(),
      })
    })
  }

  fn read(&self) -> RegenResult<LedgerFile> {
    if !self.path.exists() {
      return Ok(LedgerFile::default());
    }

    let content = std::fs::read_to_string(&self.path).map_err(|e| self.unreadable(e.to_string()))?;
    toml_edit::de::from_str(&content).map_err(|e| self.unreadable(e.to_string()))
  }

  fn write(&self, file: &LedgerFile) -> RegenResult<()> {
    let content = toml_edit::ser::to_string_pretty(file).context("Failed to serialize release ledger")?;

    let dir = match self.path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create ledger directory {}", dir.display()))?;

    // Temp file in the same directory so the rename stays on one filesystem
    let mut temp = NamedTempFile::new_in(&dir)
      .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp
      .write_all(content.as_bytes())
      .context("Failed to write temporary ledger file")?;
    temp.as_file().sync_all().context("Failed to fsync temporary ledger file")?;
    temp
      .persist(&self.path)
      .with_context(|| format!("Failed to replace ledger {}", self.path.display()))?;

    Ok(())
  }

  fn unreadable(&self, reason: String) -> RegenError {
    RegenError::Ledger(LedgerError::Unreadable {
      path: self.path.clone(),
      reason,
    })
  }
}
