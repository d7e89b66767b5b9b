//! HTTP implementation of the fetch capabilities.

use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{FetchError, FetchFile, FetchText};
use crate::consts::APP_NAME;

/// Fetches over HTTP(S) with `reqwest`, following redirects.
///
/// A `User-Agent` is always sent; release APIs such as GitHub's reject
/// requests without one.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| FetchError::Client(e.to_string()))?;
    Ok(Self { client })
  }

  async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = self.client.get(url).send().await.map_err(|e| FetchError::Request {
      url: url.to_string(),
      message: e.to_string(),
    })?;

    if !response.status().is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    let bytes = response.bytes().await.map_err(|e| FetchError::Request {
      url: url.to_string(),
      message: e.to_string(),
    })?;

    Ok(bytes.to_vec())
  }
}

impl FetchFile for HttpFetcher {
  async fn fetch_file(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
    info!(url = %url, "fetching URL");

    let bytes = self.get_bytes(url).await?;

    let write_err = |source| FetchError::Write {
      path: dest.to_path_buf(),
      source,
    };

    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut file = fs::File::create(dest).await.map_err(write_err)?;
    file.write_all(&bytes).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;

    debug!(path = ?dest, size = bytes.len(), "download complete");
    Ok(())
  }
}

impl FetchText for HttpFetcher {
  async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
    info!(url = %url, "fetching document");

    let bytes = self.get_bytes(url).await?;
    String::from_utf8(bytes).map_err(|e| FetchError::Request {
      url: url.to_string(),
      message: format!("response is not valid UTF-8: {}", e),
    })
  }
}
