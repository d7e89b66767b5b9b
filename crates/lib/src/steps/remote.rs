//! Remote files copied verbatim to an absolute target.

use std::path::Path;

use tracing::debug;

use super::{EntryOutcome, StepContext, StepError, StepKind};
use crate::consts::REMOTE_SCRATCH_FILE;
use crate::fetch::FetchFile;
use crate::host::Host;
use crate::manifest::{Entry, RemoteFileSpec};

/// Download each remote file and copy it into place.
///
/// All entries share one scratch file; each download replaces the previous
/// one before it is copied.
pub async fn apply<F: FetchFile, H: Host>(
  ctx: &StepContext<'_, F, H>,
  specs: &[Entry<RemoteFileSpec>],
) -> Vec<EntryOutcome> {
  let staged = ctx.scratch_dir.join(REMOTE_SCRATCH_FILE);
  let mut outcomes = Vec::with_capacity(specs.len());

  for entry in specs {
    let outcome = match entry {
      Entry::Valid(spec) => EntryOutcome::record(StepKind::Remotes, &spec.target, apply_one(ctx, spec, &staged).await),
      Entry::Invalid(invalid) => EntryOutcome::record(StepKind::Remotes, &invalid.label, Err(invalid.into())),
    };
    outcomes.push(outcome);
  }

  outcomes
}

async fn apply_one<F: FetchFile, H: Host>(
  ctx: &StepContext<'_, F, H>,
  spec: &RemoteFileSpec,
  staged: &Path,
) -> Result<(), StepError> {
  let target = Path::new(&spec.target);

  if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
    ctx.host.make_directory(parent).await?;
  }

  debug!(url = %spec.url, staged = ?staged, "downloading remote file");
  ctx.fetcher.fetch_file(&spec.url, staged).await?;
  ctx.host.copy_file(staged, target).await?;

  Ok(())
}
