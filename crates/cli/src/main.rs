mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{InstallArgs, cmd_install};
use output::{OutputFormat, print_error};

/// wheeup - install packages described by registry manifests
#[derive(Parser)]
#[command(name = "wheeup")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (ignored when RUST_LOG is set)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch a package manifest and provision everything it describes
  Install {
    /// Package name, looked up as <registry>/<package>.yml
    package: String,

    /// Registry base URL (overrides WHEEUP_REGISTRY_URL)
    #[arg(long, value_name = "URL")]
    registry: Option<String>,

    /// Directory downloads are staged in (overrides WHEEUP_SCRATCH_DIR)
    #[arg(long, value_name = "PATH")]
    scratch_dir: Option<PathBuf>,

    /// Record host changes instead of making them
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  // Usage errors exit with 1; help and version exit with 0.
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) => {
      let code = if err.use_stderr() { 1 } else { 0 };
      let _ = err.print();
      return ExitCode::from(code);
    }
  };

  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Install {
      package,
      registry,
      scratch_dir,
      dry_run,
      output,
    } => cmd_install(InstallArgs {
      package,
      registry,
      scratch_dir,
      dry_run,
      output,
    }),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("warn,wheeup=debug,wheeup_lib=debug")
    } else {
      EnvFilter::new("warn")
    }
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();
}
