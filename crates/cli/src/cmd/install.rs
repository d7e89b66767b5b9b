//! Implementation of the `wheeup install` command.
//!
//! Loads the package manifest from the registry and provisions the host from
//! it. With `--dry-run` the host changes are recorded and printed instead of
//! being made; downloads and release lookups still happen.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use wheeup_lib::config::InstallConfig;
use wheeup_lib::fetch::HttpFetcher;
use wheeup_lib::host::{CommandHost, DryRunHost, Host, HostOp};
use wheeup_lib::install::{InstallReport, Installer};
use wheeup_lib::loader::RegistryLoader;

use crate::output::{
  OutputFormat, print_error, print_info, print_json, print_stat, print_success, print_warning, symbols,
};

pub struct InstallArgs {
  pub package: String,
  pub registry: Option<String>,
  pub scratch_dir: Option<PathBuf>,
  pub dry_run: bool,
  pub output: OutputFormat,
}

/// Execute the install command.
///
/// Returns an error when configuration is invalid, the scratch directory
/// cannot be created or the manifest cannot be loaded. Failed entries are
/// printed but do not fail the command.
pub fn cmd_install(args: InstallArgs) -> Result<()> {
  let mut config = InstallConfig::from_env().context("Invalid configuration")?;
  if let Some(url) = args.registry {
    config = config.with_registry_url(url);
  }
  if let Some(dir) = args.scratch_dir {
    config = config.with_scratch_dir(dir);
  }
  debug!(
    registry = %config.registry_url,
    scratch = ?config.scratch_dir,
    elevation = %config.elevation,
    "configuration loaded"
  );

  if !args.output.is_json() {
    print_info(&format!("Installing {}", args.package));
  }

  let fetcher = HttpFetcher::new().context("Failed to create HTTP client")?;
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  if args.dry_run {
    let host = DryRunHost::new();
    let report = rt.block_on(run(config, &fetcher, &host, &args.package))?;
    let planned = host.ops();

    if args.output.is_json() {
      print_json(&serde_json::json!({
        "package": report.package,
        "dry_run": true,
        "outcomes": report.outcomes,
        "planned": planned,
      }))?;
    } else {
      print_report(&report);
      print_planned(&planned);
    }
  } else {
    let host = CommandHost::new(config.elevation);
    let report = rt.block_on(run(config, &fetcher, host, &args.package))?;

    if args.output.is_json() {
      print_json(&report)?;
    } else {
      print_report(&report);
    }
  }

  Ok(())
}

async fn run<H: Host>(config: InstallConfig, fetcher: &HttpFetcher, host: H, package: &str) -> Result<InstallReport> {
  let loader = RegistryLoader::from_config(&config, fetcher);
  let installer = Installer::new(config, loader, fetcher, host);
  installer
    .install(package)
    .await
    .with_context(|| format!("Failed to install {}", package))
}

fn print_report(report: &InstallReport) {
  for outcome in &report.outcomes {
    let label = format!("{} {}", outcome.step, outcome.entry);
    match &outcome.error {
      None => print_success(&label),
      Some(err) => print_error(&format!("{}: {} ({})", label, err, err.kind())),
    }
  }

  println!();
  if report.outcomes.is_empty() {
    print_warning(&format!("Manifest for {} has no entries", report.package));
  } else if report.is_success() {
    print_success(&format!("Installed {}", report.package));
  } else {
    print_warning(&format!("Installed {} with failures", report.package));
  }
  print_stat("Applied", &report.succeeded().to_string());
  print_stat("Failed", &report.failed().to_string());
}

fn print_planned(planned: &[HostOp]) {
  println!();
  print_info("Dry run - no changes made");
  for op in planned {
    println!("  {} {}", symbols::ARROW, op);
  }
}
