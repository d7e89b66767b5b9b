//! Directory provisioning.

use std::path::Path;

use super::{EntryOutcome, StepContext, StepError, StepKind};
use crate::host::Host;
use crate::manifest::{DirectorySpec, Entry};

/// Create each directory, then apply ownership and mode when given.
///
/// Ownership is only changed when both owner and group are set. If creating
/// the directory fails, the rest of that entry is skipped; later entries
/// still run.
pub async fn apply<F, H: Host>(ctx: &StepContext<'_, F, H>, specs: &[Entry<DirectorySpec>]) -> Vec<EntryOutcome> {
  let mut outcomes = Vec::with_capacity(specs.len());

  for entry in specs {
    let outcome = match entry {
      Entry::Valid(spec) => EntryOutcome::record(StepKind::Directories, &spec.path, apply_one(ctx.host, spec).await),
      Entry::Invalid(invalid) => EntryOutcome::record(StepKind::Directories, &invalid.label, Err(invalid.into())),
    };
    outcomes.push(outcome);
  }

  outcomes
}

async fn apply_one(host: &impl Host, spec: &DirectorySpec) -> Result<(), StepError> {
  let path = Path::new(&spec.path);

  host.make_directory(path).await?;

  if let Some((owner, group)) = spec.ownership() {
    host.set_owner(path, owner, group).await?;
  }

  if let Some(mode) = spec.permissions() {
    host.set_permissions(path, mode).await?;
  }

  Ok(())
}
