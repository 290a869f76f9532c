//! `sdk-regen ledger` - inspect the release ledger

use crate::core::config::ConfigOverrides;
use crate::core::context::RunContext;
use crate::core::error::RegenResult;
use crate::release::Ledger;
use chrono::Utc;
use std::path::Path;

fn open_ledger(root: &Path) -> RegenResult<Ledger> {
  let ctx = RunContext::build(root, ConfigOverrides::default(), Utc::now())?;
  Ok(Ledger::from_context(&ctx))
}

/// Print the most recent release record
pub fn run_ledger_latest(root: &Path, json: bool) -> RegenResult<()> {
  let record = open_ledger(root)?.most_recent()?;

  if json {
    println!("{}", serde_json::to_string_pretty(&record)?);
  } else {
    print!("{}", record.to_markdown());
  }
  Ok(())
}

/// Print every release record, oldest first
pub fn run_ledger_list(root: &Path, json: bool) -> RegenResult<()> {
  let ledger = open_ledger(root)?;
  let records = ledger.records()?;

  if json {
    println!("{}", serde_json::to_string_pretty(&records)?);
    return Ok(());
  }

  if records.is_empty() {
    println!("No releases recorded in {}", ledger.path().display());
    return Ok(());
  }

  println!("{:<20} {:<12} {:<12} LANGUAGES", "TITLE", "DOC", "GENERATOR");
  println!("{:-<80}", "");
  for record in &records {
    let languages: Vec<String> = record
      .languages_generated
      .keys()
      .map(|lang| {
        if record.languages_published.contains_key(lang) {
          format!("{}*", lang)
        } else {
          lang.clone()
        }
      })
      .collect();
    println!(
      "{:<20} {:<12} {:<12} {}",
      record.title,
      record.doc_version,
      record.generator_version,
      languages.join(", ")
    );
  }
  println!("\n* published");
  Ok(())
}
