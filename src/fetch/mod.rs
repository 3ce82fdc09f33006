//! Single-artifact retrieval
//!
//! A [`Fetcher`] downloads one URL into one local file. There are no retries
//! and no partial results: the caller treats every [`FetchError`] as fatal.

mod http;

pub use http::{HttpFetcher, build_client};

use crate::auth::AuthHeader;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("too many redirects fetching {url}")]
    TooManyRedirects { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to write {url} to {}: {source}", .path.display())]
    Write {
        url: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Request { url, .. }
            | FetchError::Timeout { url }
            | FetchError::TooManyRedirects { url }
            | FetchError::Status { url, .. }
            | FetchError::Write { url, .. } => url,
        }
    }
}

/// Retrieves one URL to one destination path, overwriting any existing file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the number of bytes written
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        header: Option<&AuthHeader>,
    ) -> Result<u64, FetchError>;
}
