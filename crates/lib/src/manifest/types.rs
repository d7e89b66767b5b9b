//! Manifest types.
//!
//! The registry serves one YAML document per package:
//!
//! ```yaml
//! users: { group: string, user: string }
//! directories: [ { path, owner?, group?, permissions? } ]
//! remotes: [ { url, target } ]
//! content: [ { name, source, location, binlink? } ]
//! dependencies: [ { name, source, binary, location, binlink? } ]
//! ```
//!
//! Every top-level key is optional and unknown keys are ignored. A section
//! with the wrong shape (e.g. `directories: 5`) fails the whole document; a
//! malformed item inside a well-shaped section becomes an
//! [`Entry::Invalid`] and only fails that item.

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use super::entry::{Entry, null_as_empty, optional_scalar_string, scalar_string};

/// Errors produced while parsing a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("invalid manifest YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("manifest must be a mapping, found {found}")]
  NotAMapping { found: &'static str },
}

/// The parsed description of one package.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
  /// Service group and account to ensure exist.
  #[serde(default, rename = "users")]
  pub identity: Option<Entry<IdentitySpec>>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub directories: Vec<Entry<DirectorySpec>>,
  #[serde(default, rename = "remotes", deserialize_with = "null_as_empty")]
  pub remote_files: Vec<Entry<RemoteFileSpec>>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub content: Vec<Entry<ContentSpec>>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub dependencies: Vec<Entry<DependencySpec>>,
}

impl Manifest {
  /// Parse a manifest from YAML text.
  ///
  /// Blank or comment-only documents produce an empty manifest.
  pub fn from_yaml(text: &str) -> Result<Self, ManifestError> {
    if is_blank_document(text) {
      return Ok(Self::default());
    }

    let value: Value = serde_yaml::from_str(text)?;
    match value {
      Value::Null => Ok(Self::default()),
      Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
      other => Err(ManifestError::NotAMapping {
        found: value_kind(&other),
      }),
    }
  }

  /// Returns true when no section has any entries.
  pub fn is_empty(&self) -> bool {
    self.identity.is_none()
      && self.directories.is_empty()
      && self.remote_files.is_empty()
      && self.content.is_empty()
      && self.dependencies.is_empty()
  }

  /// Total number of entries across all sections.
  pub fn entry_count(&self) -> usize {
    usize::from(self.identity.is_some())
      + self.directories.len()
      + self.remote_files.len()
      + self.content.len()
      + self.dependencies.len()
  }
}

fn is_blank_document(text: &str) -> bool {
  text.lines().all(|line| {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line == "---"
  })
}

fn value_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Sequence(_) => "a sequence",
    Value::Mapping(_) => "a mapping",
    Value::Tagged(_) => "a tagged value",
  }
}

/// A system group and service account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentitySpec {
  #[serde(deserialize_with = "scalar_string")]
  pub group: String,
  #[serde(deserialize_with = "scalar_string")]
  pub user: String,
}

/// A directory with optional ownership and permission enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectorySpec {
  #[serde(deserialize_with = "scalar_string")]
  pub path: String,
  #[serde(default, deserialize_with = "optional_scalar_string")]
  pub owner: Option<String>,
  #[serde(default, deserialize_with = "optional_scalar_string")]
  pub group: Option<String>,
  /// Mode passed to `chmod`, e.g. `"750"` or `"u+rwx"`.
  #[serde(default, deserialize_with = "optional_scalar_string")]
  pub permissions: Option<String>,
}

impl DirectorySpec {
  /// Owner and group, only when both are present and non-empty.
  pub fn ownership(&self) -> Option<(&str, &str)> {
    match (non_empty(&self.owner), non_empty(&self.group)) {
      (Some(owner), Some(group)) => Some((owner, group)),
      _ => None,
    }
  }

  pub fn permissions(&self) -> Option<&str> {
    non_empty(&self.permissions)
  }
}

/// A file downloaded verbatim to an absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFileSpec {
  #[serde(deserialize_with = "scalar_string")]
  pub url: String,
  #[serde(deserialize_with = "scalar_string")]
  pub target: String,
}

/// An executable fetched directly by URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentSpec {
  #[serde(deserialize_with = "scalar_string")]
  pub name: String,
  #[serde(deserialize_with = "scalar_string")]
  pub source: String,
  #[serde(deserialize_with = "scalar_string")]
  pub location: String,
  #[serde(default, deserialize_with = "optional_scalar_string")]
  pub binlink: Option<String>,
}

impl ContentSpec {
  pub fn binlink(&self) -> Option<&str> {
    non_empty(&self.binlink)
  }
}

/// An executable resolved through release metadata.
///
/// `source` points at a release document listing assets; the asset whose
/// name equals `binary` supplies the real download URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencySpec {
  #[serde(deserialize_with = "scalar_string")]
  pub name: String,
  #[serde(deserialize_with = "scalar_string")]
  pub source: String,
  #[serde(deserialize_with = "scalar_string")]
  pub binary: String,
  #[serde(deserialize_with = "scalar_string")]
  pub location: String,
  #[serde(default, deserialize_with = "optional_scalar_string")]
  pub binlink: Option<String>,
}

impl DependencySpec {
  pub fn binlink(&self) -> Option<&str> {
    non_empty(&self.binlink)
  }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.trim().is_empty())
}
