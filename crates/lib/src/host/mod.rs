//! Host mutation capability.
//!
//! Every change the installer makes to the machine goes through [`Host`]:
//! group and account creation, directories, ownership, modes, file copies and
//! symlinks. [`CommandHost`] performs them with the standard Unix tools,
//! optionally under `sudo`; [`DryRunHost`] only records what would happen.

mod command;
mod dry_run;

pub use command::CommandHost;
pub use dry_run::DryRunHost;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Errors raised by host mutations.
#[derive(Debug, Error)]
pub enum HostError {
  /// The program could not be started.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {command}{}", stderr_suffix(.stderr))]
  CommandFailed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// An argument was rejected before anything was run.
  #[error("invalid {what}: '{value}'")]
  InvalidArgument { what: &'static str, value: String },
}

fn stderr_suffix(stderr: &str) -> String {
  let stderr = stderr.trim();
  if stderr.is_empty() {
    String::new()
  } else {
    format!(" ({})", stderr)
  }
}

/// A single recorded host mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
  CreateGroup { group: String },
  CreateSystemUser { user: String, group: String },
  AddToGroup { account: String, group: String },
  MakeDirectory { path: PathBuf },
  SetOwner { path: PathBuf, owner: String, group: String },
  SetPermissions { path: PathBuf, mode: String },
  CopyFile { src: PathBuf, dest: PathBuf },
  MakeExecutable { path: PathBuf },
  MakeSymlink { target: PathBuf, link: PathBuf },
}

impl fmt::Display for HostOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostOp::CreateGroup { group } => write!(f, "create group {}", group),
      HostOp::CreateSystemUser { user, group } => write!(f, "create system user {} (group {})", user, group),
      HostOp::AddToGroup { account, group } => write!(f, "add {} to group {}", account, group),
      HostOp::MakeDirectory { path } => write!(f, "create directory {}", path.display()),
      HostOp::SetOwner { path, owner, group } => write!(f, "chown -R {}:{} {}", owner, group, path.display()),
      HostOp::SetPermissions { path, mode } => write!(f, "chmod -R {} {}", mode, path.display()),
      HostOp::CopyFile { src, dest } => write!(f, "copy {} -> {}", src.display(), dest.display()),
      HostOp::MakeExecutable { path } => write!(f, "chmod +x {}", path.display()),
      HostOp::MakeSymlink { target, link } => write!(f, "symlink {} -> {}", link.display(), target.display()),
    }
  }
}

/// Privileged operations on the machine being provisioned.
///
/// Directory, ownership and permission changes are recursive. Existence
/// probes never mutate anything.
#[allow(async_fn_in_trait)]
pub trait Host {
  async fn group_exists(&self, group: &str) -> Result<bool, HostError>;
  async fn create_group(&self, group: &str) -> Result<(), HostError>;
  async fn user_exists(&self, user: &str) -> Result<bool, HostError>;
  /// Create a system account with no login shell and `group` as its primary group.
  async fn create_system_user(&self, user: &str, group: &str) -> Result<(), HostError>;
  /// Add `account` to `group`; adding an existing member is not an error.
  async fn add_to_group(&self, account: &str, group: &str) -> Result<(), HostError>;
  /// Create `path` and any missing parents; an existing directory is not an error.
  async fn make_directory(&self, path: &Path) -> Result<(), HostError>;
  async fn set_owner(&self, path: &Path, owner: &str, group: &str) -> Result<(), HostError>;
  async fn set_permissions(&self, path: &Path, mode: &str) -> Result<(), HostError>;
  async fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), HostError>;
  async fn make_executable(&self, path: &Path) -> Result<(), HostError>;
  /// Point `link` at `target`, replacing whatever `link` was.
  async fn make_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError>;

  /// Create `group` unless it exists. Returns true if it was created.
  async fn ensure_group(&self, group: &str) -> Result<bool, HostError> {
    if self.group_exists(group).await? {
      return Ok(false);
    }
    self.create_group(group).await?;
    Ok(true)
  }

  /// Create the system account `user` unless it exists. Returns true if it was created.
  async fn ensure_user(&self, user: &str, group: &str) -> Result<bool, HostError> {
    if self.user_exists(user).await? {
      return Ok(false);
    }
    self.create_system_user(user, group).await?;
    Ok(true)
  }
}

impl<T: Host + ?Sized> Host for &T {
  async fn group_exists(&self, group: &str) -> Result<bool, HostError> {
    (**self).group_exists(group).await
  }

  async fn create_group(&self, group: &str) -> Result<(), HostError> {
    (**self).create_group(group).await
  }

  async fn user_exists(&self, user: &str) -> Result<bool, HostError> {
    (**self).user_exists(user).await
  }

  async fn create_system_user(&self, user: &str, group: &str) -> Result<(), HostError> {
    (**self).create_system_user(user, group).await
  }

  async fn add_to_group(&self, account: &str, group: &str) -> Result<(), HostError> {
    (**self).add_to_group(account, group).await
  }

  async fn make_directory(&self, path: &Path) -> Result<(), HostError> {
    (**self).make_directory(path).await
  }

  async fn set_owner(&self, path: &Path, owner: &str, group: &str) -> Result<(), HostError> {
    (**self).set_owner(path, owner, group).await
  }

  async fn set_permissions(&self, path: &Path, mode: &str) -> Result<(), HostError> {
    (**self).set_permissions(path, mode).await
  }

  async fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), HostError> {
    (**self).copy_file(src, dest).await
  }

  async fn make_executable(&self, path: &Path) -> Result<(), HostError> {
    (**self).make_executable(path).await
  }

  async fn make_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
    (**self).make_symlink(target, link).await
  }
}
