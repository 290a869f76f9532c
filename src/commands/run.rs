//! `sdk-regen run` - one regeneration run

use crate::core::config::ConfigOverrides;
use crate::core::context::RunContext;
use crate::core::error::{ConfigError, RegenError, RegenResult};
use crate::core::outputs::{GithubOutputFile, JsonStdout};
use crate::core::vcs::GitHubVcs;
use crate::generator::SystemGenerator;
use crate::workflow::{RunSummary, run_workflow};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

/// Run the workflow against the checkout at `root`
pub fn run_regen(root: &Path, overrides: ConfigOverrides, invoke_time: Option<&str>) -> RegenResult<()> {
  let invoke_time = parse_invoke_time(invoke_time)?;
  let ctx = RunContext::build(root, overrides, invoke_time)?;
  debug!(root = %ctx.root.display(), mode = %ctx.mode(), "run context ready");

  let vcs = GitHubVcs::open(&ctx)?;
  let generator = SystemGenerator::from_context(&ctx);

  // Outputs go to $GITHUB_OUTPUT inside an action, stdout otherwise
  let summary = match GithubOutputFile::from_env() {
    Some(mut sink) => run_workflow(&ctx, &vcs, &generator, &mut sink)?,
    None => run_workflow(&ctx, &vcs, &generator, &mut JsonStdout)?,
  };

  print_summary(&summary);
  Ok(())
}

/// Invocation time from an RFC 3339 string, or now
pub fn parse_invoke_time(value: Option<&str>) -> RegenResult<DateTime<Utc>> {
  match value {
    None => Ok(Utc::now()),
    Some(raw) => DateTime::parse_from_rfc3339(raw)
      .map(|t| t.with_timezone(&Utc))
      .map_err(|_| {
        RegenError::Config(ConfigError::InvalidValue {
          field: "invoke-time".to_string(),
          value: raw.to_string(),
        })
      }),
  }
}

/// Summary on stderr; stdout may be carrying the outputs
fn print_summary(summary: &RunSummary) {
  if !summary.anything_regenerated {
    eprintln!("✅ No SDK changes (branch {})", summary.branch);
    return;
  }

  eprintln!("✅ SDKs regenerated on {}", summary.branch);
  if let Some(request) = &summary.request {
    eprintln!("   Review request #{}: {}", request.number, request.url);
  }
  if let Some(commit) = &summary.commit_hash {
    eprintln!("   Merged at {}", commit);
  }
}
