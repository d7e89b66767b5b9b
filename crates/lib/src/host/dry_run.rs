//! Host that records mutations instead of performing them.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use super::{CommandHost, Host, HostError, HostOp};
use crate::config::Elevation;

#[derive(Debug, Default)]
struct Recorded {
  ops: Vec<HostOp>,
  groups: BTreeSet<String>,
  users: BTreeSet<String>,
}

/// Records every mutation as a [`HostOp`] and performs none of them.
///
/// Existence probes are answered by the real system (they are read-only),
/// combined with whatever this host has already pretended to create, so a
/// dry run reports the same creations a real run would.
#[derive(Debug)]
pub struct DryRunHost {
  probe: CommandHost,
  recorded: Mutex<Recorded>,
}

impl Default for DryRunHost {
  fn default() -> Self {
    Self::new()
  }
}

impl DryRunHost {
  pub fn new() -> Self {
    Self {
      probe: CommandHost::new(Elevation::Never),
      recorded: Mutex::new(Recorded::default()),
    }
  }

  /// The mutations recorded so far, in order.
  pub fn ops(&self) -> Vec<HostOp> {
    self.lock().ops.clone()
  }

  fn lock(&self) -> MutexGuard<'_, Recorded> {
    self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn record(&self, op: HostOp) {
    info!(op = %op, "dry run");
    self.lock().ops.push(op);
  }
}

impl Host for DryRunHost {
  async fn group_exists(&self, group: &str) -> Result<bool, HostError> {
    if self.lock().groups.contains(group) {
      return Ok(true);
    }
    self.probe.group_exists(group).await
  }

  async fn create_group(&self, group: &str) -> Result<(), HostError> {
    self.lock().groups.insert(group.to_string());
    self.record(HostOp::CreateGroup {
      group: group.to_string(),
    });
    Ok(())
  }

  async fn user_exists(&self, user: &str) -> Result<bool, HostError> {
    if self.lock().users.contains(user) {
      return Ok(true);
    }
    self.probe.user_exists(user).await
  }

  async fn create_system_user(&self, user: &str, group: &str) -> Result<(), HostError> {
    self.lock().users.insert(user.to_string());
    self.record(HostOp::CreateSystemUser {
      user: user.to_string(),
      group: group.to_string(),
    });
    Ok(())
  }

  async fn add_to_group(&self, account: &str, group: &str) -> Result<(), HostError> {
    self.record(HostOp::AddToGroup {
      account: account.to_string(),
      group: group.to_string(),
    });
    Ok(())
  }

  async fn make_directory(&self, path: &Path) -> Result<(), HostError> {
    self.record(HostOp::MakeDirectory {
      path: path.to_path_buf(),
    });
    Ok(())
  }

  async fn set_owner(&self, path: &Path, owner: &str, group: &str) -> Result<(), HostError> {
    self.record(HostOp::SetOwner {
      path: path.to_path_buf(),
      owner: owner.to_string(),
      group: group.to_string(),
    });
    Ok(())
  }

  async fn set_permissions(&self, path: &Path, mode: &str) -> Result<(), HostError> {
    self.record(HostOp::SetPermissions {
      path: path.to_path_buf(),
      mode: mode.to_string(),
    });
    Ok(())
  }

  async fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), HostError> {
    self.record(HostOp::CopyFile {
      src: src.to_path_buf(),
      dest: dest.to_path_buf(),
    });
    Ok(())
  }

  async fn make_executable(&self, path: &Path) -> Result<(), HostError> {
    self.record(HostOp::MakeExecutable {
      path: path.to_path_buf(),
    });
    Ok(())
  }

  async fn make_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
    self.record(HostOp::MakeSymlink {
      target: target.to_path_buf(),
      link: link.to_path_buf(),
    });
    Ok(())
  }
}
