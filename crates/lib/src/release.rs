//! Release asset resolution.
//!
//! Dependencies name a release-metadata endpoint and the asset file they
//! need. The endpoint returns a document shaped like a GitHub release:
//!
//! ```json
//! { "assets": [ { "name": "tool-linux-amd64", "browser_download_url": "https://..." } ] }
//! ```
//!
//! Resolution fetches that document and returns the download URL of the
//! first asset whose name matches exactly. Any other fields are ignored.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::fetch::{FetchError, FetchText};

/// Errors raised while resolving a release asset.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// The metadata could not be retrieved.
  #[error("failed to fetch release metadata from {url}: {source}")]
  Fetch {
    url: String,
    #[source]
    source: FetchError,
  },

  /// The metadata was retrieved but the body was empty.
  #[error("release metadata from {url} is empty")]
  EmptyMetadata { url: String },

  /// The metadata is not a release document.
  #[error("invalid release metadata from {url}: {source}")]
  Parse {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  /// The release is well-formed but has no asset with the requested name.
  #[error("asset '{asset}' not found in release (available: {})", format_available(.available))]
  AssetNotFound { asset: String, available: Vec<String> },
}

fn format_available(names: &[String]) -> String {
  if names.is_empty() {
    "none".to_string()
  } else {
    names.join(", ")
  }
}

/// A release document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
  pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
  pub name: String,
  pub browser_download_url: String,
}

impl Release {
  pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }

  /// First asset named exactly `name`, in document order.
  pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
    self.assets.iter().find(|asset| asset.name == name)
  }

  pub fn asset_names(&self) -> Vec<String> {
    self.assets.iter().map(|asset| asset.name.clone()).collect()
  }
}

/// Resolve the download URL of `asset_name` from the release at `metadata_url`.
pub async fn resolve_asset_url(
  fetcher: &impl FetchText,
  metadata_url: &str,
  asset_name: &str,
) -> Result<String, ResolveError> {
  info!(url = %metadata_url, asset = %asset_name, "resolving release asset");

  let text = fetcher
    .fetch_text(metadata_url)
    .await
    .map_err(|source| ResolveError::Fetch {
      url: metadata_url.to_string(),
      source,
    })?;

  if text.trim().is_empty() {
    return Err(ResolveError::EmptyMetadata {
      url: metadata_url.to_string(),
    });
  }

  let release = Release::from_json(&text).map_err(|source| ResolveError::Parse {
    url: metadata_url.to_string(),
    source,
  })?;

  debug!(count = release.assets.len(), "release assets");

  match release.find_asset(asset_name) {
    Some(asset) => {
      debug!(url = %asset.browser_download_url, "asset resolved");
      Ok(asset.browser_download_url.clone())
    }
    None => Err(ResolveError::AssetNotFound {
      asset: asset_name.to_string(),
      available: release.asset_names(),
    }),
  }
}
