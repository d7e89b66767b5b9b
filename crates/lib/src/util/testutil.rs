//! Test doubles for wheeup-lib.
//!
//! - [`StubFetcher`]: serves canned files and documents keyed by URL
//! - [`FakeHost`]: in-memory group/user database that records mutations and
//!   can be told to fail on specific paths or accounts
//! - [`StubLoader`]: returns a fixed manifest or a fixed load failure

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::fetch::{FetchError, FetchFile, FetchText};
use crate::host::{Host, HostError, HostOp};
use crate::loader::{LoadError, ManifestSource};
use crate::manifest::Manifest;

/// Serves canned responses; unknown URLs fail like a 404.
#[derive(Debug, Default)]
pub struct StubFetcher {
  files: HashMap<String, Vec<u8>>,
  texts: HashMap<String, String>,
  requests: Mutex<Vec<String>>,
}

impl StubFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_file(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
    self.files.insert(url.to_string(), body.into());
    self
  }

  pub fn with_text(mut self, url: &str, body: &str) -> Self {
    self.texts.insert(url.to_string(), body.to_string());
    self
  }

  /// URLs requested so far, in order.
  pub fn requests(&self) -> Vec<String> {
    self.requests.lock().unwrap().clone()
  }

  fn not_found(url: &str) -> FetchError {
    FetchError::Status {
      url: url.to_string(),
      status: 404,
    }
  }
}

impl FetchFile for StubFetcher {
  async fn fetch_file(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
    self.requests.lock().unwrap().push(url.to_string());
    let body = self.files.get(url).ok_or_else(|| Self::not_found(url))?;

    let write_err = |source| FetchError::Write {
      path: dest.to_path_buf(),
      source,
    };
    if let Some(parent) = dest.parent() {
      tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(dest, body).await.map_err(write_err)
  }
}

impl FetchText for StubFetcher {
  async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
    self.requests.lock().unwrap().push(url.to_string());
    self.texts.get(url).cloned().ok_or_else(|| Self::not_found(url))
  }
}

#[derive(Debug, Default)]
struct FakeState {
  groups: BTreeSet<String>,
  users: BTreeSet<String>,
  ops: Vec<HostOp>,
  failing: Vec<PathBuf>,
  failing_accounts: Vec<String>,
}

/// In-memory host.
///
/// Creating a group or user that already exists fails, like `groupadd` and
/// `useradd` do, so double creation shows up as an error.
#[derive(Debug, Default)]
pub struct FakeHost {
  state: Mutex<FakeState>,
  probes: AtomicUsize,
}

impl FakeHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_group(self, group: &str) -> Self {
    self.state.lock().unwrap().groups.insert(group.to_string());
    self
  }

  pub fn with_user(self, user: &str) -> Self {
    self.state.lock().unwrap().users.insert(user.to_string());
    self
  }

  /// Make every operation whose path (or destination) is `path` fail.
  pub fn failing_on(self, path: impl Into<PathBuf>) -> Self {
    self.state.lock().unwrap().failing.push(path.into());
    self
  }

  /// Make adding `account` to any group fail.
  pub fn failing_account(self, account: &str) -> Self {
    self.state.lock().unwrap().failing_accounts.push(account.to_string());
    self
  }

  pub fn ops(&self) -> Vec<HostOp> {
    self.state.lock().unwrap().ops.clone()
  }

  pub fn groups(&self) -> BTreeSet<String> {
    self.state.lock().unwrap().groups.clone()
  }

  pub fn users(&self) -> BTreeSet<String> {
    self.state.lock().unwrap().users.clone()
  }

  pub fn probe_count(&self) -> usize {
    self.probes.load(Ordering::SeqCst)
  }

  fn apply_path_op(&self, path: &Path, op: HostOp) -> Result<(), HostError> {
    let mut state = self.state.lock().unwrap();
    if state.failing.iter().any(|p| p == path) {
      return Err(HostError::CommandFailed {
        command: op.to_string(),
        code: Some(1),
        stderr: "Permission denied".to_string(),
      });
    }
    state.ops.push(op);
    Ok(())
  }
}

impl Host for FakeHost {
  async fn group_exists(&self, group: &str) -> Result<bool, HostError> {
    self.probes.fetch_add(1, Ordering::SeqCst);
    Ok(self.state.lock().unwrap().groups.contains(group))
  }

  async fn create_group(&self, group: &str) -> Result<(), HostError> {
    let mut state = self.state.lock().unwrap();
    if !state.groups.insert(group.to_string()) {
      return Err(HostError::CommandFailed {
        command: format!("groupadd {}", group),
        code: Some(9),
        stderr: format!("groupadd: group '{}' already exists", group),
      });
    }
    state.ops.push(HostOp::CreateGroup {
      group: group.to_string(),
    });
    Ok(())
  }

  async fn user_exists(&self, user: &str) -> Result<bool, HostError> {
    self.probes.fetch_add(1, Ordering::SeqCst);
    Ok(self.state.lock().unwrap().users.contains(user))
  }

  async fn create_system_user(&self, user: &str, group: &str) -> Result<(), HostError> {
    let mut state = self.state.lock().unwrap();
    if !state.groups.contains(group) {
      return Err(HostError::CommandFailed {
        command: format!("useradd -g {} {}", group, user),
        code: Some(6),
        stderr: format!("useradd: group '{}' does not exist", group),
      });
    }
    if !state.users.insert(user.to_string()) {
      return Err(HostError::CommandFailed {
        command: format!("useradd {}", user),
        code: Some(9),
        stderr: format!("useradd: user '{}' already exists", user),
      });
    }
    state.ops.push(HostOp::CreateSystemUser {
      user: user.to_string(),
      group: group.to_string(),
    });
    Ok(())
  }

  async fn add_to_group(&self, account: &str, group: &str) -> Result<(), HostError> {
    let mut state = self.state.lock().unwrap();
    if state.failing_accounts.iter().any(|a| a == account) {
      return Err(HostError::CommandFailed {
        command: format!("usermod -aG {} {}", group, account),
        code: Some(6),
        stderr: format!("usermod: user '{}' does not exist", account),
      });
    }
    state.ops.push(HostOp::AddToGroup {
      account: account.to_string(),
      group: group.to_string(),
    });
    Ok(())
  }

  async fn make_directory(&self, path: &Path) -> Result<(), HostError> {
    self.apply_path_op(
      path,
      HostOp::MakeDirectory {
        path: path.to_path_buf(),
      },
    )
  }

  async fn set_owner(&self, path: &Path, owner: &str, group: &str) -> Result<(), HostError> {
    self.apply_path_op(
      path,
      HostOp::SetOwner {
        path: path.to_path_buf(),
        owner: owner.to_string(),
        group: group.to_string(),
      },
    )
  }

  async fn set_permissions(&self, path: &Path, mode: &str) -> Result<(), HostError> {
    self.apply_path_op(
      path,
      HostOp::SetPermissions {
        path: path.to_path_buf(),
        mode: mode.to_string(),
      },
    )
  }

  async fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), HostError> {
    self.apply_path_op(
      dest,
      HostOp::CopyFile {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
      },
    )
  }

  async fn make_executable(&self, path: &Path) -> Result<(), HostError> {
    self.apply_path_op(
      path,
      HostOp::MakeExecutable {
        path: path.to_path_buf(),
      },
    )
  }

  async fn make_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
    self.apply_path_op(
      link,
      HostOp::MakeSymlink {
        target: target.to_path_buf(),
        link: link.to_path_buf(),
      },
    )
  }
}

/// Manifest source with a fixed answer.
pub enum StubLoader {
  Manifest(Manifest),
  Fail(fn(&str) -> LoadError),
}

impl ManifestSource for StubLoader {
  async fn load(&self, package: &str) -> Result<Manifest, LoadError> {
    match self {
      StubLoader::Manifest(manifest) => Ok(manifest.clone()),
      StubLoader::Fail(make_error) => Err(make_error(package)),
    }
  }
}
