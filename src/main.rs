use clap::{Args, Parser, Subcommand};
use sdk_regen::commands;
use sdk_regen::core::config::{ConfigOverrides, OperatingMode};
use sdk_regen::core::error::{RegenError, print_error};
use sdk_regen::core::telemetry::init_tracing;
use std::path::PathBuf;
use tracing::Level;

/// Regenerate SDKs, record them in a release ledger, and publish them
#[derive(Parser)]
#[command(name = "sdk-regen")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Repository checkout to work in (default: current directory)
  #[arg(long, global = true, env = "GITHUB_WORKSPACE")]
  root: Option<PathBuf>,

  /// Emit logs as JSON lines
  #[arg(long, global = true)]
  json_logs: bool,

  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the generator and publish the result
  Run(RunArgs),

  /// Inspect the release ledger
  #[command(subcommand)]
  Ledger(LedgerCommands),
}

/// Flags double as GitHub Actions inputs
#[derive(Args)]
struct RunArgs {
  /// Operating mode: pr or direct
  #[arg(long, env = "INPUT_MODE")]
  mode: Option<OperatingMode>,

  /// Keep working branches after the run
  #[arg(long, env = "INPUT_DEBUG", value_parser = clap::builder::BoolishValueParser::new())]
  debug: Option<bool>,

  /// Create tagged releases after a direct merge
  #[arg(long, env = "INPUT_CREATE_RELEASE", value_parser = clap::builder::BoolishValueParser::new())]
  create_release: Option<bool>,

  /// Exact generator version to require ("latest" accepts any)
  #[arg(long, env = "INPUT_SPEAKEASY_VERSION")]
  generator_version: Option<String>,

  /// Location of the API document
  #[arg(long, env = "INPUT_OPENAPI_DOC_LOCATION")]
  doc_location: Option<String>,

  /// Invocation time (RFC 3339); defaults to now
  #[arg(long)]
  invoke_time: Option<String>,
}

#[derive(Subcommand)]
enum LedgerCommands {
  /// Show the most recent release record
  Latest {
    /// Output the record as JSON
    #[arg(long)]
    json: bool,
  },
  /// List every release record
  List {
    /// Output records as JSON
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  let level = match cli.verbose {
    0 => Level::INFO,
    1 => Level::DEBUG,
    _ => Level::TRACE,
  };
  init_tracing(cli.json_logs, level);

  let root = match cli.root {
    Some(root) => root,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(RegenError::from(e).context("Failed to get current directory")),
    },
  };

  let result = match cli.command {
    Commands::Run(args) => {
      let overrides = ConfigOverrides {
        mode: args.mode,
        debug: args.debug,
        create_release: args.create_release,
        generator_version: args.generator_version,
        doc_location: args.doc_location,
      };
      commands::run_regen(&root, overrides, args.invoke_time.as_deref())
    }
    Commands::Ledger(ledger_cmd) => match ledger_cmd {
      LedgerCommands::Latest { json } => commands::run_ledger_latest(&root, json),
      LedgerCommands::List { json } => commands::run_ledger_list(&root, json),
    },
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RegenError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
