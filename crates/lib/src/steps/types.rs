//! Outcome types shared by all provisioning steps.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{info, warn};

use crate::fetch::FetchError;
use crate::host::HostError;
use crate::manifest::InvalidEntry;
use crate::release::ResolveError;

/// The five manifest sections, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
  Identity,
  Directories,
  Remotes,
  Content,
  Dependencies,
}

impl StepKind {
  pub const ALL: [StepKind; 5] = [
    StepKind::Identity,
    StepKind::Directories,
    StepKind::Remotes,
    StepKind::Content,
    StepKind::Dependencies,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      StepKind::Identity => "identity",
      StepKind::Directories => "directories",
      StepKind::Remotes => "remotes",
      StepKind::Content => "content",
      StepKind::Dependencies => "dependencies",
    }
  }
}

impl fmt::Display for StepKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Coarse classification of an entry failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  /// A download or metadata request failed.
  Fetch,
  /// An entry or a release document was malformed.
  Parse,
  /// A release was fetched but did not contain the requested asset.
  AssetNotFound,
  /// A host command failed.
  HostMutation,
}

impl fmt::Display for FailureKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      FailureKind::Fetch => "fetch error",
      FailureKind::Parse => "parse error",
      FailureKind::AssetNotFound => "asset not found",
      FailureKind::HostMutation => "host mutation error",
    };
    write!(f, "{}", s)
  }
}

/// Why a single entry failed.
#[derive(Debug, Error)]
pub enum StepError {
  #[error("invalid entry: {0}")]
  InvalidEntry(String),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Host(#[from] HostError),
}

impl StepError {
  pub fn kind(&self) -> FailureKind {
    match self {
      StepError::InvalidEntry(_) => FailureKind::Parse,
      StepError::Fetch(_) => FailureKind::Fetch,
      StepError::Resolve(ResolveError::Fetch { .. } | ResolveError::EmptyMetadata { .. }) => FailureKind::Fetch,
      StepError::Resolve(ResolveError::Parse { .. }) => FailureKind::Parse,
      StepError::Resolve(ResolveError::AssetNotFound { .. }) => FailureKind::AssetNotFound,
      StepError::Host(_) => FailureKind::HostMutation,
    }
  }
}

impl From<&InvalidEntry> for StepError {
  fn from(invalid: &InvalidEntry) -> Self {
    StepError::InvalidEntry(invalid.message.clone())
  }
}

/// The result of applying one manifest entry.
#[derive(Debug)]
pub struct EntryOutcome {
  pub step: StepKind,
  /// Identifies the entry to the operator (name, path or target).
  pub entry: String,
  /// `None` when the entry was applied.
  pub error: Option<StepError>,
}

impl EntryOutcome {
  /// Build an outcome and log it.
  pub fn record(step: StepKind, entry: impl Into<String>, result: Result<(), StepError>) -> Self {
    let entry = entry.into();
    match &result {
      Ok(()) => info!(step = %step, entry = %entry, "entry applied"),
      Err(e) => warn!(step = %step, entry = %entry, kind = %e.kind(), error = %e, "entry failed"),
    }
    Self {
      step,
      entry,
      error: result.err(),
    }
  }

  pub fn is_success(&self) -> bool {
    self.error.is_none()
  }

  pub fn failure_kind(&self) -> Option<FailureKind> {
    self.error.as_ref().map(StepError::kind)
  }
}

impl Serialize for EntryOutcome {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("EntryOutcome", 5)?;
    state.serialize_field("step", &self.step)?;
    state.serialize_field("entry", &self.entry)?;
    state.serialize_field("success", &self.is_success())?;
    state.serialize_field("kind", &self.failure_kind())?;
    state.serialize_field("message", &self.error.as_ref().map(|e| e.to_string()))?;
    state.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolve_errors_map_to_distinct_kinds() {
    let not_found = StepError::from(ResolveError::AssetNotFound {
      asset: "foo-mac".to_string(),
      available: vec![],
    });
    let fetch = StepError::from(ResolveError::EmptyMetadata {
      url: "http://x".to_string(),
    });

    assert_eq!(not_found.kind(), FailureKind::AssetNotFound);
    assert_eq!(fetch.kind(), FailureKind::Fetch);
  }

  #[test]
  fn invalid_entry_is_parse_failure() {
    let err = StepError::InvalidEntry("missing field `source`".to_string());
    assert_eq!(err.kind(), FailureKind::Parse);
  }

  #[test]
  fn outcome_serializes_failure() {
    let outcome = EntryOutcome::record(
      StepKind::Content,
      "tool",
      Err(StepError::Fetch(FetchError::Status {
        url: "http://x/tool".to_string(),
        status: 500,
      })),
    );

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["step"], "content");
    assert_eq!(json["entry"], "tool");
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "fetch");
    assert_eq!(json["message"], "fetch failed for http://x/tool: HTTP 500");
  }

  #[test]
  fn outcome_serializes_success() {
    let outcome = EntryOutcome::record(StepKind::Directories, "/srv/app", Ok(()));

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], true);
    assert!(json["kind"].is_null());
    assert!(json["message"].is_null());
  }
}
