//! Network fetch capabilities.
//!
//! Downloading a file to disk and reading a document as text are separate
//! capabilities so that the manifest loader and release resolver can each be
//! tested against stub data:
//!
//! - [`FetchFile`]: download a URL to a local path (binaries, manifests)
//! - [`FetchText`]: download a URL into a string (release metadata)
//!
//! [`HttpFetcher`] implements both over HTTP(S).

mod http;

pub use http::HttpFetcher;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by fetch capabilities.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The HTTP client could not be constructed.
  #[error("failed to initialize HTTP client: {0}")]
  Client(String),

  /// The request did not complete (DNS, connect, TLS, body read).
  #[error("fetch failed for {url}: {message}")]
  Request { url: String, message: String },

  /// The server answered with a non-success status.
  #[error("fetch failed for {url}: HTTP {status}")]
  Status { url: String, status: u16 },

  /// The downloaded bytes could not be written.
  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Download a URL to a file.
#[allow(async_fn_in_trait)]
pub trait FetchFile {
  /// Fetch `url` and write the body to `dest`, creating parent directories.
  ///
  /// Any existing file at `dest` is replaced.
  async fn fetch_file(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Download a URL as text.
#[allow(async_fn_in_trait)]
pub trait FetchText {
  async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: FetchFile + ?Sized> FetchFile for &T {
  async fn fetch_file(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
    (**self).fetch_file(url, dest).await
  }
}

impl<T: FetchText + ?Sized> FetchText for &T {
  async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
    (**self).fetch_text(url).await
  }
}

/// Convert an entry name into a file name that stays inside the scratch
/// directory.
///
/// Only alphanumerics, dash, underscore and dot are kept; anything else
/// becomes `_`. Names that would still be empty or a relative path component
/// are replaced so they never resolve outside the scratch directory.
pub fn scratch_file_name(name: &str) -> String {
  let sanitized: String = name
    .chars()
    .map(|c| {
      if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
        c
      } else {
        '_'
      }
    })
    .collect();

  if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
    "download".to_string()
  } else {
    sanitized
  }
}
