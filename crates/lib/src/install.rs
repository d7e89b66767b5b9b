//! Installation orchestration.
//!
//! An install loads the package manifest, then applies its sections in a
//! fixed order: identity, directories, remotes, content, dependencies. A load
//! failure stops the install before the host is touched. After that, every
//! step runs whatever happened in the steps before it, and the per-entry
//! outcomes are gathered into an [`InstallReport`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::InstallConfig;
use crate::fetch::{FetchFile, FetchText};
use crate::host::Host;
use crate::loader::{LoadError, ManifestSource};
use crate::manifest::Manifest;
use crate::steps::{self, EntryOutcome, StepContext, StepKind};

/// Errors that abort an install before any step runs.
#[derive(Debug, Error)]
pub enum InstallError {
  #[error("failed to prepare scratch directory {path}: {source}")]
  Workspace {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Load(#[from] LoadError),
}

/// Success and failure counts for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepCounts {
  pub succeeded: usize,
  pub failed: usize,
}

/// Everything that happened during one install.
#[derive(Debug, Serialize)]
pub struct InstallReport {
  pub package: String,
  /// Entry outcomes in execution order.
  pub outcomes: Vec<EntryOutcome>,
}

impl InstallReport {
  pub fn succeeded(&self) -> usize {
    self.outcomes.iter().filter(|o| o.is_success()).count()
  }

  pub fn failed(&self) -> usize {
    self.outcomes.len() - self.succeeded()
  }

  pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
    self.outcomes.iter().filter(|o| !o.is_success())
  }

  /// True when every entry was applied. An empty manifest is a success.
  pub fn is_success(&self) -> bool {
    self.outcomes.iter().all(EntryOutcome::is_success)
  }

  /// Counts per step, for steps that had at least one entry.
  pub fn step_counts(&self) -> BTreeMap<&'static str, StepCounts> {
    let mut counts = BTreeMap::new();
    for outcome in &self.outcomes {
      let entry: &mut StepCounts = counts.entry(outcome.step.as_str()).or_default();
      if outcome.is_success() {
        entry.succeeded += 1;
      } else {
        entry.failed += 1;
      }
    }
    counts
  }
}

/// Runs installs against one configuration and set of collaborators.
pub struct Installer<L, F, H> {
  config: InstallConfig,
  loader: L,
  fetcher: F,
  host: H,
}

impl<L, F, H> Installer<L, F, H>
where
  L: ManifestSource,
  F: FetchFile + FetchText,
  H: Host,
{
  pub fn new(config: InstallConfig, loader: L, fetcher: F, host: H) -> Self {
    Self {
      config,
      loader,
      fetcher,
      host,
    }
  }

  pub fn config(&self) -> &InstallConfig {
    &self.config
  }

  pub fn host(&self) -> &H {
    &self.host
  }

  /// Install `package`.
  ///
  /// Returns an error only if the scratch directory cannot be created or the
  /// manifest cannot be loaded. Entry failures are reported, not returned.
  pub async fn install(&self, package: &str) -> Result<InstallReport, InstallError> {
    let scratch_dir = &self.config.scratch_dir;
    tokio::fs::create_dir_all(scratch_dir)
      .await
      .map_err(|source| InstallError::Workspace {
        path: scratch_dir.clone(),
        source,
      })?;

    info!(package = %package, "installing package");
    let manifest = self.loader.load(package).await?;

    if manifest.is_empty() {
      warn!(package = %package, "manifest has no entries");
    }

    let outcomes = self.apply(&manifest).await;
    let report = InstallReport {
      package: package.to_string(),
      outcomes,
    };

    info!(
      package = %package,
      succeeded = report.succeeded(),
      failed = report.failed(),
      "install finished"
    );

    Ok(report)
  }

  /// Apply every section of `manifest`, in step order.
  pub async fn apply(&self, manifest: &Manifest) -> Vec<EntryOutcome> {
    let ctx = StepContext {
      fetcher: &self.fetcher,
      host: &self.host,
      scratch_dir: &self.config.scratch_dir,
      operator: self.config.operator.as_deref(),
    };

    let mut outcomes = Vec::with_capacity(manifest.entry_count());
    for step in StepKind::ALL {
      let step_outcomes = match step {
        StepKind::Identity => steps::identity::apply(&ctx, manifest.identity.as_ref()).await,
        StepKind::Directories => steps::directory::apply(&ctx, &manifest.directories).await,
        StepKind::Remotes => steps::remote::apply(&ctx, &manifest.remote_files).await,
        StepKind::Content => steps::content::apply(&ctx, &manifest.content).await,
        StepKind::Dependencies => steps::dependency::apply(&ctx, &manifest.dependencies).await,
      };
      outcomes.extend(step_outcomes);
    }
    outcomes
  }
}
