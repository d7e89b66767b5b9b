//! Host mutations performed with the standard Unix tools.
//!
//! Each operation runs one program with an explicit argument vector; nothing
//! is interpolated into a shell string. Mutations are prefixed with `sudo`
//! when elevation is enabled. Existence probes (`getent`, `id`) always run
//! as the invoking user.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::{Host, HostError};
use crate::config::Elevation;
use crate::consts::NOLOGIN_SHELL;

const SUDO: &str = "sudo";

/// Runs host mutations as child processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHost {
  sudo: bool,
}

impl CommandHost {
  /// Create a host, resolving `elevation` against the current process.
  pub fn new(elevation: Elevation) -> Self {
    Self {
      sudo: elevation.use_sudo(),
    }
  }

  /// Returns true if mutations are run through `sudo`.
  pub fn uses_sudo(&self) -> bool {
    self.sudo
  }

  fn build(&self, program: &str, args: &[&OsStr], elevate: bool) -> (Command, String) {
    let mut parts: Vec<String> = Vec::with_capacity(args.len() + 2);
    let mut command = if elevate && self.sudo {
      parts.push(SUDO.to_string());
      let mut command = Command::new(SUDO);
      command.arg(program);
      command
    } else {
      Command::new(program)
    };
    parts.push(program.to_string());

    command.args(args).stdin(Stdio::null());
    parts.extend(args.iter().map(|arg| arg.to_string_lossy().into_owned()));

    (command, parts.join(" "))
  }

  /// Run a mutation; non-zero exit is an error.
  async fn run(&self, program: &str, args: &[&OsStr]) -> Result<(), HostError> {
    let (mut command, shown) = self.build(program, args, true);
    debug!(command = %shown, "running host command");

    let output = command.output().await.map_err(|source| HostError::Spawn {
      program: program.to_string(),
      source,
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      return Err(HostError::CommandFailed {
        command: shown,
        code: output.status.code(),
        stderr,
      });
    }

    Ok(())
  }

  /// Run an unelevated probe; the exit status is the answer.
  async fn probe(&self, program: &str, args: &[&OsStr]) -> Result<bool, HostError> {
    let (mut command, shown) = self.build(program, args, false);
    debug!(command = %shown, "probing host");

    let status = command
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .status()
      .await
      .map_err(|source| HostError::Spawn {
        program: program.to_string(),
        source,
      })?;

    Ok(status.success())
  }
}

/// Reject names the account tools would misread as options or that are empty.
fn account_name<'a>(what: &'static str, value: &'a str) -> Result<&'a OsStr, HostError> {
  if value.is_empty() || value.starts_with('-') || value.chars().any(char::is_whitespace) {
    return Err(HostError::InvalidArgument {
      what,
      value: value.to_string(),
    });
  }
  Ok(OsStr::new(value))
}

fn path_arg(path: &Path) -> Result<&OsStr, HostError> {
  if path.as_os_str().is_empty() {
    return Err(HostError::InvalidArgument {
      what: "path",
      value: String::new(),
    });
  }
  Ok(path.as_os_str())
}

impl Host for CommandHost {
  async fn group_exists(&self, group: &str) -> Result<bool, HostError> {
    let group = account_name("group name", group)?;
    self.probe("getent", &[OsStr::new("group"), group]).await
  }

  async fn create_group(&self, group: &str) -> Result<(), HostError> {
    let group = account_name("group name", group)?;
    self.run("groupadd", &[group]).await
  }

  async fn user_exists(&self, user: &str) -> Result<bool, HostError> {
    let user = account_name("user name", user)?;
    self.probe("id", &[OsStr::new("-u"), user]).await
  }

  async fn create_system_user(&self, user: &str, group: &str) -> Result<(), HostError> {
    let user = account_name("user name", user)?;
    let group = account_name("group name", group)?;
    self
      .run(
        "useradd",
        &[
          OsStr::new("-r"),
          OsStr::new("-s"),
          OsStr::new(NOLOGIN_SHELL),
          OsStr::new("-g"),
          group,
          user,
        ],
      )
      .await
  }

  async fn add_to_group(&self, account: &str, group: &str) -> Result<(), HostError> {
    let account = account_name("account name", account)?;
    let group = account_name("group name", group)?;
    self.run("usermod", &[OsStr::new("-aG"), group, account]).await
  }

  async fn make_directory(&self, path: &Path) -> Result<(), HostError> {
    let path = path_arg(path)?;
    self.run("mkdir", &[OsStr::new("-p"), OsStr::new("--"), path]).await
  }

  async fn set_owner(&self, path: &Path, owner: &str, group: &str) -> Result<(), HostError> {
    let path = path_arg(path)?;
    account_name("owner", owner)?;
    account_name("group name", group)?;
    let spec = format!("{}:{}", owner, group);
    self
      .run("chown", &[OsStr::new("-R"), OsStr::new("--"), OsStr::new(&spec), path])
      .await
  }

  async fn set_permissions(&self, path: &Path, mode: &str) -> Result<(), HostError> {
    let path = path_arg(path)?;
    if mode.trim().is_empty() {
      return Err(HostError::InvalidArgument {
        what: "permissions",
        value: mode.to_string(),
      });
    }
    self
      .run("chmod", &[OsStr::new("-R"), OsStr::new("--"), OsStr::new(mode), path])
      .await
  }

  async fn copy_file(&self, src: &Path, dest: &Path) -> Result<(), HostError> {
    let src = path_arg(src)?;
    let dest = path_arg(dest)?;
    self.run("cp", &[OsStr::new("--"), src, dest]).await
  }

  async fn make_executable(&self, path: &Path) -> Result<(), HostError> {
    let path = path_arg(path)?;
    self.run("chmod", &[OsStr::new("+x"), OsStr::new("--"), path]).await
  }

  async fn make_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
    let target = path_arg(target)?;
    let link = path_arg(link)?;
    self.run("ln", &[OsStr::new("-sfn"), OsStr::new("--"), target, link]).await
  }
}
