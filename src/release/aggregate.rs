//! Fold per-language generator results into one release record

use super::record::{GeneratedLanguage, PublishedLanguage, ReleaseRecord};
use crate::generator::{GenerationInfo, LanguageResult};
use tracing::debug;

/// Outcome of aggregating one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
  pub record: ReleaseRecord,
  /// True if at least one supported language produced new output
  pub anything_regenerated: bool,
}

/// Build the release record for a run.
///
/// Languages are visited in `supported` order. A language contributes only if
/// the generator reported info for it and flagged it as regenerated; it is
/// additionally published when flagged for publication.
pub fn aggregate(
  info: &GenerationInfo,
  results: &[LanguageResult],
  supported: &[String],
  title: &str,
  spec_location: &str,
) -> Aggregation {
  let mut record = ReleaseRecord::new(
    title,
    info.doc_version.as_str(),
    info.generator_version.as_str(),
    info.generation_version.as_str(),
    spec_location,
  );
  let mut anything_regenerated = false;

  for lang in supported {
    let Some(lang_info) = info.languages.get(lang) else {
      continue;
    };
    let Some(result) = results.iter().find(|r| &r.language == lang) else {
      continue;
    };
    if !result.regenerated {
      continue;
    }

    anything_regenerated = true;
    let path = result.output_path.clone().unwrap_or_default();
    record.languages_generated.insert(
      lang.clone(),
      GeneratedLanguage {
        version: lang_info.version.clone(),
        path: path.clone(),
      },
    );

    if result.published {
      record.languages_published.insert(
        lang.clone(),
        PublishedLanguage {
          package_name: lang_info.package_name.clone(),
          version: lang_info.version.clone(),
          path,
        },
      );
    }
    debug!(language = %lang, version = %lang_info.version, published = result.published, "language regenerated");
  }

  Aggregation {
    record,
    anything_regenerated,
  }
}
