//! Installer configuration.
//!
//! Configuration is resolved once at startup from the environment and then
//! passed by value into the [`Installer`](crate::install::Installer). Nothing
//! in the library reads the environment after that point.
//!
//! | Variable              | Default                         |
//! |-----------------------|---------------------------------|
//! | `WHEEUP_REGISTRY_URL` | [`DEFAULT_REGISTRY_URL`]        |
//! | `WHEEUP_SCRATCH_DIR`  | [`DEFAULT_SCRATCH_DIR`]         |
//! | `WHEEUP_ELEVATE`      | `auto`                          |
//! | `USER`                | operator added to package group |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::consts::{DEFAULT_REGISTRY_URL, DEFAULT_SCRATCH_DIR, ENV_ELEVATE, ENV_REGISTRY_URL, ENV_SCRATCH_DIR};
use crate::platform;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value '{value}' for {var}: expected auto, always or never")]
  InvalidElevation { var: &'static str, value: String },
}

/// When host mutations are run through `sudo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Elevation {
  /// Use `sudo` unless already running as root.
  #[default]
  Auto,
  Always,
  Never,
}

impl Elevation {
  /// Resolve to a concrete decision for this process.
  pub fn use_sudo(self) -> bool {
    match self {
      Elevation::Auto => !platform::is_elevated(),
      Elevation::Always => true,
      Elevation::Never => false,
    }
  }
}

impl FromStr for Elevation {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "auto" | "" => Ok(Elevation::Auto),
      "always" => Ok(Elevation::Always),
      "never" => Ok(Elevation::Never),
      _ => Err(ConfigError::InvalidElevation {
        var: ENV_ELEVATE,
        value: s.to_string(),
      }),
    }
  }
}

impl fmt::Display for Elevation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Elevation::Auto => "auto",
      Elevation::Always => "always",
      Elevation::Never => "never",
    };
    write!(f, "{}", s)
  }
}

/// Process-wide settings for one installation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallConfig {
  /// Base URL manifests are fetched from (`<registry>/<package>.yml`).
  pub registry_url: String,
  /// Directory downloads are staged in.
  pub scratch_dir: PathBuf,
  /// Account added to the package group alongside root.
  pub operator: Option<String>,
  pub elevation: Elevation,
}

impl Default for InstallConfig {
  fn default() -> Self {
    Self {
      registry_url: DEFAULT_REGISTRY_URL.to_string(),
      scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
      operator: None,
      elevation: Elevation::Auto,
    }
  }
}

impl InstallConfig {
  /// Build the configuration from environment variables, falling back to
  /// compiled-in defaults.
  pub fn from_env() -> Result<Self, ConfigError> {
    let registry_url = non_empty_var(ENV_REGISTRY_URL).unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());
    let scratch_dir = non_empty_var(ENV_SCRATCH_DIR)
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR));
    let elevation = match non_empty_var(ENV_ELEVATE) {
      Some(value) => value.parse()?,
      None => Elevation::Auto,
    };

    Ok(Self {
      registry_url,
      scratch_dir,
      operator: platform::operator_name(),
      elevation,
    })
  }

  pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
    self.registry_url = url.into();
    self
  }

  pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.scratch_dir = dir.into();
    self
  }

  pub fn with_operator(mut self, operator: Option<String>) -> Self {
    self.operator = operator;
    self
  }

  pub fn with_elevation(mut self, elevation: Elevation) -> Self {
    self.elevation = elevation;
    self
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
