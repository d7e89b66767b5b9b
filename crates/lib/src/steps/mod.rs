//! Provisioning steps.
//!
//! Each step applies one manifest section and returns one [`EntryOutcome`]
//! per entry. A failing entry is logged and recorded, then the step moves on
//! to the next entry; steps never abort each other.
//!
//! | Step         | Section        | Side effects                               |
//! |--------------|----------------|--------------------------------------------|
//! | identity     | `users`        | group, memberships, service account        |
//! | directory    | `directories`  | directory tree, ownership, mode            |
//! | remote       | `remotes`      | file copied to an absolute target          |
//! | content      | `content`      | executable fetched by URL, optional link   |
//! | dependency   | `dependencies` | executable resolved from release metadata  |

pub mod content;
pub mod dependency;
pub mod directory;
pub mod identity;
pub mod remote;
mod types;

pub use types::*;

use std::path::Path;

use tracing::debug;

use crate::host::Host;

/// Collaborators shared by the steps of one run.
#[derive(Debug)]
pub struct StepContext<'a, F, H> {
  pub fetcher: &'a F,
  pub host: &'a H,
  /// Directory downloads are staged in before being copied into place.
  pub scratch_dir: &'a Path,
  /// Account added to the package group alongside root.
  pub operator: Option<&'a str>,
}

/// Copy a staged download to `location`, mark it executable and, if
/// requested, point `binlink` at it.
pub(crate) async fn place_executable(
  host: &impl Host,
  staged: &Path,
  location: &str,
  binlink: Option<&str>,
) -> Result<(), StepError> {
  let location = Path::new(location);
  debug!(staged = ?staged, location = ?location, "placing executable");

  host.copy_file(staged, location).await?;
  host.make_executable(location).await?;

  if let Some(link) = binlink {
    host.make_symlink(location, Path::new(link)).await?;
  }

  Ok(())
}
