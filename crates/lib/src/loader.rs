//! Manifest loading.
//!
//! A package's manifest lives at `<registry>/<package>.yml`. The loader
//! downloads it into the scratch workspace and parses it; either failure
//! aborts the installation before anything on the host is touched.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::InstallConfig;
use crate::consts::{MANIFEST_EXTENSION, MANIFEST_SCRATCH_FILE};
use crate::fetch::{FetchError, FetchFile};
use crate::manifest::{Manifest, ManifestError};

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("invalid package name '{0}'")]
  InvalidPackageName(String),

  #[error("failed to download manifest from {url}: {source}")]
  Fetch {
    url: String,
    #[source]
    source: FetchError,
  },

  #[error("failed to read downloaded manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse manifest from {url}: {source}")]
  Parse {
    url: String,
    #[source]
    source: ManifestError,
  },
}

/// Something that can produce the manifest for a package.
#[allow(async_fn_in_trait)]
pub trait ManifestSource {
  async fn load(&self, package: &str) -> Result<Manifest, LoadError>;
}

impl<T: ManifestSource + ?Sized> ManifestSource for &T {
  async fn load(&self, package: &str) -> Result<Manifest, LoadError> {
    (**self).load(package).await
  }
}

/// Loads manifests from the package registry.
#[derive(Debug, Clone)]
pub struct RegistryLoader<F> {
  registry_url: String,
  scratch_dir: PathBuf,
  fetcher: F,
}

impl<F: FetchFile> RegistryLoader<F> {
  pub fn new(registry_url: impl Into<String>, scratch_dir: impl Into<PathBuf>, fetcher: F) -> Self {
    Self {
      registry_url: registry_url.into(),
      scratch_dir: scratch_dir.into(),
      fetcher,
    }
  }

  pub fn from_config(config: &InstallConfig, fetcher: F) -> Self {
    Self::new(config.registry_url.clone(), config.scratch_dir.clone(), fetcher)
  }

  /// The URL the manifest for `package` is fetched from.
  pub fn manifest_url(&self, package: &str) -> String {
    manifest_url(&self.registry_url, package)
  }
}

impl<F: FetchFile> ManifestSource for RegistryLoader<F> {
  async fn load(&self, package: &str) -> Result<Manifest, LoadError> {
    validate_package_name(package)?;

    let url = self.manifest_url(package);
    let dest = self.scratch_dir.join(MANIFEST_SCRATCH_FILE);
    info!(package = %package, url = %url, "fetching manifest");

    self
      .fetcher
      .fetch_file(&url, &dest)
      .await
      .map_err(|source| LoadError::Fetch {
        url: url.clone(),
        source,
      })?;

    let text = tokio::fs::read_to_string(&dest)
      .await
      .map_err(|source| LoadError::Read { path: dest.clone(), source })?;
    debug!(path = ?dest, bytes = text.len(), "manifest downloaded");

    let manifest = Manifest::from_yaml(&text).map_err(|source| LoadError::Parse { url, source })?;
    debug!(entries = manifest.entry_count(), "manifest parsed");

    Ok(manifest)
  }
}

/// Join the registry base and `<package>.yml`, tolerating a trailing slash.
pub fn manifest_url(registry_url: &str, package: &str) -> String {
  format!(
    "{}/{}.{}",
    registry_url.trim_end_matches('/'),
    package,
    MANIFEST_EXTENSION
  )
}

/// Characters that would end or re-encode the URL path.
const URL_DELIMITERS: &[char] = &['?', '#', '%'];

/// Reject names that are empty, could escape the registry directory, or would
/// change the meaning of the manifest URL.
pub fn validate_package_name(package: &str) -> Result<(), LoadError> {
  let invalid = package.trim().is_empty()
    || package.contains('/')
    || package.contains('\\')
    || package.contains("..")
    || package.contains(URL_DELIMITERS)
    || package.chars().any(char::is_whitespace);

  if invalid {
    return Err(LoadError::InvalidPackageName(package.to_string()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::StubFetcher;
  use tempfile::TempDir;

  const REGISTRY: &str = "http://registry.test/packages";

  #[test]
  fn manifest_url_joins_base_and_name() {
    assert_eq!(manifest_url(REGISTRY, "whee"), "http://registry.test/packages/whee.yml");
    assert_eq!(
      manifest_url("http://registry.test/packages/", "whee"),
      "http://registry.test/packages/whee.yml"
    );
  }

  #[test]
  fn package_names_are_validated() {
    assert!(validate_package_name("whee-db").is_ok());
    assert!(validate_package_name("whee_2.1").is_ok());

    for bad in ["", "  ", "../secrets", "a/b", "a\\b", "with space", "foo#", "foo?v=1", "foo%2e"] {
      assert!(
        matches!(validate_package_name(bad), Err(LoadError::InvalidPackageName(_))),
        "{bad:?} should be rejected"
      );
    }
  }

  #[tokio::test]
  async fn loads_and_parses_manifest() {
    let temp = TempDir::new().unwrap();
    let fetcher = StubFetcher::new().with_file(
      "http://registry.test/packages/whee.yml",
      "users:\n  group: whee\n  user: wheed\ndirectories:\n  - path: /var/lib/whee\n",
    );
    let loader = RegistryLoader::new(REGISTRY, temp.path(), &fetcher);

    let manifest = loader.load("whee").await.unwrap();

    assert!(manifest.identity.is_some());
    assert_eq!(manifest.directories.len(), 1);
    assert!(temp.path().join(MANIFEST_SCRATCH_FILE).exists());
    assert_eq!(fetcher.requests(), vec!["http://registry.test/packages/whee.yml"]);
  }

  #[tokio::test]
  async fn fetch_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let fetcher = StubFetcher::new();
    let loader = RegistryLoader::new(REGISTRY, temp.path(), &fetcher);

    let err = loader.load("missing").await.unwrap_err();

    match err {
      LoadError::Fetch { url, source } => {
        assert_eq!(url, "http://registry.test/packages/missing.yml");
        assert!(matches!(source, FetchError::Status { status: 404, .. }));
      }
      other => panic!("expected fetch error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn parse_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let fetcher = StubFetcher::new().with_file("http://registry.test/packages/bad.yml", "- just\n- a list\n");
    let loader = RegistryLoader::new(REGISTRY, temp.path(), &fetcher);

    let err = loader.load("bad").await.unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
  }

  #[tokio::test]
  async fn invalid_name_never_hits_network() {
    let temp = TempDir::new().unwrap();
    let fetcher = StubFetcher::new();
    let loader = RegistryLoader::new(REGISTRY, temp.path(), &fetcher);

    let err = loader.load("../etc/passwd").await.unwrap_err();

    assert!(matches!(err, LoadError::InvalidPackageName(_)));
    assert!(fetcher.requests().is_empty());
  }

  #[test]
  fn from_config_uses_registry_and_scratch() {
    let config = InstallConfig::default()
      .with_registry_url("http://other.test/pkgs/")
      .with_scratch_dir("/tmp/x");
    let fetcher = StubFetcher::new();
    let loader = RegistryLoader::from_config(&config, &fetcher);

    assert_eq!(loader.manifest_url("tool"), "http://other.test/pkgs/tool.yml");
    assert_eq!(loader.scratch_dir, PathBuf::from("/tmp/x"));
  }
}
