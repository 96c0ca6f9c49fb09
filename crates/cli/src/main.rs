use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lambdapack_lib::consts::PROJECT_FILENAME;
use lambdapack_lib::project::parse_override;

mod cmd;
mod output;

use output::OutputFormat;

/// lambdapack - package Lambda functions and publish them to S3
#[derive(Parser)]
#[command(name = "lambdapack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the project file
  #[arg(short, long, global = true, default_value = PROJECT_FILENAME)]
  project: PathBuf,

  /// Set a project property, overriding the project file (repeatable)
  #[arg(short = 'P', long = "property", value_name = "KEY=VALUE", global = true, value_parser = parse_property)]
  properties: Vec<(String, String)>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Install dependencies and assemble the Lambda zip
  Package {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Package, then upload the zip under its versioned and latest keys
  Upload {
    /// Record the uploads in memory instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the bucket and keys an upload would use
  Keys {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
  parse_override(raw).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
  let default = if verbose {
    "info,lambdapack=debug,lambdapack_lib=debug"
  } else {
    "warn,lambdapack=info,lambdapack_lib=info"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  match cli.command {
    Commands::Package { output } => cmd::cmd_package(&cli.project, &cli.properties, output),
    Commands::Upload { dry_run, output } => cmd::cmd_upload(&cli.project, &cli.properties, dry_run, output),
    Commands::Keys { output } => cmd::cmd_keys(&cli.project, &cli.properties, output),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      output::print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}
