//! Service group and account provisioning.

use tracing::{debug, info};

use super::{EntryOutcome, StepContext, StepError, StepKind};
use crate::consts::SUPERUSER;
use crate::host::{Host, HostError};
use crate::manifest::{Entry, IdentitySpec};

/// Ensure the package group and service account exist.
///
/// The operator (when known) and root are added to the group so they can
/// manage the package's files. Existing groups and accounts are left alone,
/// so applying the same spec twice creates nothing the second time.
pub async fn apply<F, H: Host>(ctx: &StepContext<'_, F, H>, spec: Option<&Entry<IdentitySpec>>) -> Vec<EntryOutcome> {
  let Some(entry) = spec else {
    return Vec::new();
  };

  let outcome = match entry {
    Entry::Valid(spec) => EntryOutcome::record(StepKind::Identity, &spec.user, ensure_identity(ctx, spec).await),
    Entry::Invalid(invalid) => EntryOutcome::record(StepKind::Identity, &invalid.label, Err(invalid.into())),
  };

  vec![outcome]
}

async fn ensure_identity<F, H: Host>(ctx: &StepContext<'_, F, H>, spec: &IdentitySpec) -> Result<(), StepError> {
  let host = ctx.host;
  // Every sub-operation is attempted; the first failure is reported.
  let mut first_error = None;

  match host.ensure_group(&spec.group).await {
    Ok(true) => info!(group = %spec.group, "created group"),
    Ok(false) => debug!(group = %spec.group, "group already exists"),
    Err(e) => keep_first(&mut first_error, e),
  }

  let mut members = Vec::with_capacity(2);
  if let Some(operator) = ctx.operator.filter(|op| *op != SUPERUSER) {
    members.push(operator);
  }
  members.push(SUPERUSER);

  for account in members {
    if let Err(e) = host.add_to_group(account, &spec.group).await {
      keep_first(&mut first_error, e);
    }
  }

  match host.ensure_user(&spec.user, &spec.group).await {
    Ok(true) => info!(user = %spec.user, group = %spec.group, "created service account"),
    Ok(false) => debug!(user = %spec.user, "service account already exists"),
    Err(e) => keep_first(&mut first_error, e),
  }

  match first_error {
    Some(e) => Err(e.into()),
    None => Ok(()),
  }
}

fn keep_first(first: &mut Option<HostError>, err: HostError) {
  debug!(error = %err, "identity operation failed");
  first.get_or_insert(err);
}
