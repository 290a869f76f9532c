//! Release records: one ledger entry per regeneration

use crate::core::error::{RegenError, RegenResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A language the generator produced new output for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLanguage {
  pub version: String,
  pub path: String,
}

/// A generated language that is also flagged for publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedLanguage {
  pub package_name: String,
  pub version: String,
  pub path: String,
}

/// One entry in the release ledger
///
/// # Invariants
///
/// 1. Every key of `languages_published` is a key of `languages_generated`
/// 2. A record with no generated languages is never persisted
/// 3. `title` and the provenance fields never change once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
  /// Invocation time, `%Y-%m-%d %H:%M:%S`
  pub title: String,
  pub doc_version: String,
  pub generator_version: String,
  /// Generation-tool version reported by the generator
  #[serde(default)]
  pub generation_version: String,
  pub spec_location: String,
  #[serde(default)]
  pub languages_generated: BTreeMap<String, GeneratedLanguage>,
  #[serde(default)]
  pub languages_published: BTreeMap<String, PublishedLanguage>,
}

impl ReleaseRecord {
  /// Create a record with provenance and no languages
  pub fn new(
    title: impl Into<String>,
    doc_version: impl Into<String>,
    generator_version: impl Into<String>,
    generation_version: impl Into<String>,
    spec_location: impl Into<String>,
  ) -> Self {
    Self {
      title: title.into(),
      doc_version: doc_version.into(),
      generator_version: generator_version.into(),
      generation_version: generation_version.into(),
      spec_location: spec_location.into(),
      languages_generated: BTreeMap::new(),
      languages_published: BTreeMap::new(),
    }
  }

  /// True if nothing was generated
  pub fn is_empty(&self) -> bool {
    self.languages_generated.is_empty()
  }

  /// Check that published languages are a subset of generated ones
  pub fn validate(&self) -> RegenResult<()> {
    if let Some(lang) = self
      .languages_published
      .keys()
      .find(|lang| !self.languages_generated.contains_key(*lang))
    {
      return Err(RegenError::message(format!(
        "Release '{}' publishes {} without generating it",
        self.title, lang
      )));
    }
    Ok(())
  }

  /// Fold a newer record for the same document version into this one.
  ///
  /// Language entries from `newer` replace existing ones; title and provenance are kept.
  /// A language `newer` regenerated without publishing loses its older published entry.
  pub fn merge(&mut self, newer: ReleaseRecord) {
    for lang in newer.languages_generated.keys() {
      if !newer.languages_published.contains_key(lang) {
        self.languages_published.remove(lang);
      }
    }
    self.languages_generated.extend(newer.languages_generated);
    self.languages_published.extend(newer.languages_published);
  }

  /// Short content hash (first 12 hex chars of SHA-256)
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    for field in [
      &self.title,
      &self.doc_version,
      &self.generator_version,
      &self.generation_version,
      &self.spec_location,
    ] {
      hasher.update(field.as_bytes());
      hasher.update([0u8]);
    }
    for (lang, generated) in &self.languages_generated {
      hasher.update(format!("g:{}:{}:{}\n", lang, generated.version, generated.path).as_bytes());
    }
    for (lang, published) in &self.languages_published {
      hasher.update(format!("p:{}:{}:{}:{}\n", lang, published.package_name, published.version, published.path).as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
  }

  /// Tags for releases cut from this record.
  ///
  /// One tag per published language (generated languages when none are
  /// published): `v<version>` if there is exactly one, `<lang>/v<version>` otherwise.
  pub fn release_tags(&self) -> Vec<String> {
    self.release_targets().into_iter().map(|(_, tag)| tag).collect()
  }

  /// [`release_tags`](Self::release_tags) paired with the language each tag releases
  pub fn release_targets(&self) -> Vec<(String, String)> {
    let versions: Vec<(&String, &String)> = if self.languages_published.is_empty() {
      self.languages_generated.iter().map(|(l, g)| (l, &g.version)).collect()
    } else {
      self.languages_published.iter().map(|(l, p)| (l, &p.version)).collect()
    };

    if let [(lang, version)] = versions.as_slice() {
      return vec![(lang.to_string(), format!("v{}", version))];
    }
    versions
      .into_iter()
      .map(|(lang, version)| (lang.clone(), format!("{}/v{}", lang, version)))
      .collect()
  }

  /// Markdown summary used for request bodies and release notes
  pub fn to_markdown(&self) -> String {
    let mut md = format!("# SDK regeneration {}\n\n", self.title);

    md.push_str("## Provenance\n\n");
    md.push_str(&format!("- API document: `{}` (version {})\n", self.spec_location, self.doc_version));
    md.push_str(&format!("- Generator: {}\n", self.generator_version));
    if !self.generation_version.is_empty() {
      md.push_str(&format!("- Generation tool: {}\n", self.generation_version));
    }

    md.push_str("\n## Generated\n\n");
    for (lang, generated) in &self.languages_generated {
      md.push_str(&format!("- **{}** v{} (`{}`)\n", lang, generated.version, generated.path));
    }

    if !self.languages_published.is_empty() {
      md.push_str("\n## Published\n\n");
      for (lang, published) in &self.languages_published {
        md.push_str(&format!("- **{}**: `{}` v{}\n", lang, published.package_name, published.version));
      }
    }

    md
  }
}
