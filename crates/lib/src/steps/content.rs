//! Executables downloaded directly by URL.

use tracing::debug;

use super::{EntryOutcome, StepContext, StepError, StepKind, place_executable};
use crate::fetch::{FetchFile, scratch_file_name};
use crate::host::Host;
use crate::manifest::{ContentSpec, Entry};

/// Download each content entry, install it at its location and link it.
///
/// A failed download leaves the host untouched for that entry.
pub async fn apply<F: FetchFile, H: Host>(ctx: &StepContext<'_, F, H>, specs: &[Entry<ContentSpec>]) -> Vec<EntryOutcome> {
  let mut outcomes = Vec::with_capacity(specs.len());

  for entry in specs {
    let outcome = match entry {
      Entry::Valid(spec) => EntryOutcome::record(StepKind::Content, &spec.name, apply_one(ctx, spec).await),
      Entry::Invalid(invalid) => EntryOutcome::record(StepKind::Content, &invalid.label, Err(invalid.into())),
    };
    outcomes.push(outcome);
  }

  outcomes
}

async fn apply_one<F: FetchFile, H: Host>(ctx: &StepContext<'_, F, H>, spec: &ContentSpec) -> Result<(), StepError> {
  let staged = ctx.scratch_dir.join(scratch_file_name(&spec.name));

  debug!(url = %spec.source, staged = ?staged, "downloading content");
  ctx.fetcher.fetch_file(&spec.source, &staged).await?;

  place_executable(ctx.host, &staged, &spec.location, spec.binlink()).await
}
