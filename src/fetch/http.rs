//! HTTP client for downloading artifacts

use super::{FetchError, Fetcher};
use crate::auth::AuthHeader;
use crate::config::HttpConfig;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::path::Path;
use tracing::debug;

/// Build the client shared by the authorizer and the fetcher
pub fn build_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout())
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects));

    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// HTTP downloader
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download once (no retry)
    async fn download(&self, url: &str, header: Option<&AuthHeader>) -> Result<Bytes, FetchError> {
        debug!(url, "Starting download");

        let mut request = self.client.get(url);

        if let Some(header) = header {
            request = request.header(header.name().clone(), header.value().clone());
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| classify(url, e))
    }
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_redirect() {
        FetchError::TooManyRedirects { url }
    } else {
        FetchError::Request { url, source: error }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        header: Option<&AuthHeader>,
    ) -> Result<u64, FetchError> {
        let bytes = self.download(url, header).await?;

        tokio::fs::write(destination, &bytes)
            .await
            .map_err(|source| FetchError::Write {
                url: url.to_string(),
                path: destination.to_path_buf(),
                source,
            })?;

        debug!(url, path = %destination.display(), size = bytes.len(), "Download completed");

        Ok(bytes.len() as u64)
    }
}
