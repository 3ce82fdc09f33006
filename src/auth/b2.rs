//! Backblaze B2 account authorization
//!
//! Exchanges a key id / application key pair for an account token and the
//! download base URL the token is valid for.

use super::{AuthHeader, HeaderParseError, ThirdPartyScheme};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Host suffix that identifies B2 download URLs
pub const PROVIDER_DOMAIN: &str = "backblazeb2.com";

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("authorization request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("authorization rejected by {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("authorization response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("authorization response from {url} has no authorizationToken")]
    MissingToken { url: String },

    #[error("authorization token is not a usable header value: {0}")]
    InvalidToken(#[source] HeaderParseError),
}

/// Outcome of a successful account authorization
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    pub token: String,
    pub download_base_url: Option<String>,
}

impl AuthorizationResult {
    /// Scheme that attaches `Authorization: <token>` to B2 download URLs
    pub fn into_scheme(self) -> Result<ThirdPartyScheme, AuthorizationError> {
        let header =
            AuthHeader::authorization(&self.token).map_err(AuthorizationError::InvalidToken)?;
        Ok(ThirdPartyScheme::new(
            header,
            self.download_base_url,
            PROVIDER_DOMAIN,
        ))
    }
}

impl fmt::Debug for AuthorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationResult")
            .field("token", &"<redacted>")
            .field("download_base_url", &self.download_base_url)
            .finish()
    }
}

/// `b2_authorize_account` response; only the fields we need.
///
/// v2 puts `downloadUrl` at the top level, v3 nests it under
/// `apiInfo.storageApi`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeAccountResponse {
    authorization_token: Option<String>,
    download_url: Option<String>,
    api_info: Option<ApiInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInfo {
    storage_api: Option<StorageApi>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageApi {
    download_url: Option<String>,
}

pub struct B2Authorizer {
    client: Client,
    auth_url: String,
}

impl B2Authorizer {
    pub fn new(client: Client, auth_url: impl Into<String>) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
        }
    }

    /// One GET with HTTP Basic auth; no retries
    pub async fn authorize(
        &self,
        key_id: &str,
        application_key: &str,
    ) -> Result<AuthorizationResult, AuthorizationError> {
        debug!(url = %self.auth_url, "Authorizing Backblaze account");

        let response = self
            .client
            .get(&self.auth_url)
            .basic_auth(key_id, Some(application_key))
            .send()
            .await
            .map_err(|source| AuthorizationError::Request {
                url: self.auth_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthorizationError::Status {
                url: self.auth_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| AuthorizationError::Request {
                url: self.auth_url.clone(),
                source,
            })?;

        let result = parse_authorization(&self.auth_url, &body)?;

        info!(
            download_base_url = result.download_base_url.as_deref().unwrap_or("<none>"),
            "Backblaze authorization succeeded"
        );

        Ok(result)
    }
}

fn parse_authorization(url: &str, body: &[u8]) -> Result<AuthorizationResult, AuthorizationError> {
    let response: AuthorizeAccountResponse =
        serde_json::from_slice(body).map_err(|source| AuthorizationError::Decode {
            url: url.to_string(),
            source,
        })?;

    let token = response
        .authorization_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthorizationError::MissingToken {
            url: url.to_string(),
        })?;

    let download_base_url = response
        .download_url
        .or_else(|| {
            response
                .api_info
                .and_then(|info| info.storage_api)
                .and_then(|storage| storage.download_url)
        })
        .filter(|base| !base.is_empty());

    Ok(AuthorizationResult {
        token,
        download_base_url,
    })
}
