//! Bootstrap orchestration
//!
//! Runs once before the downstream process starts. Stages, strictly in order:
//!
//! 1. plan artifacts from the environment snapshot (on construction)
//! 2. ensure the working directory exists
//! 3. authorize against Backblaze B2 when credentials are configured
//! 4. fetch the primary config, additional configs, then handlers
//! 5. list the working directory (diagnostic only)
//! 6. prepare the downstream environment
//!
//! The caller then hands control over with [`Launch::exec`]. Any failure
//! before that point aborts the whole bootstrap; there are no retries.

mod launch;

pub use launch::{Launch, LaunchError};

use crate::artifacts::{self, ArtifactKind, ArtifactRequest, PlanError};
use crate::auth::b2::{AuthorizationError, B2Authorizer};
use crate::auth::{AuthHeader, CredentialBroker};
use crate::config::{Config, ConfigError, ValidationError};
use crate::env::EnvSnapshot;
use crate::fetch::{FetchError, Fetcher, HttpFetcher, build_client};
use reqwest::Client;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("configuration error: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Artifact(#[from] PlanError),

    #[error("failed to initialise HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("working directory {} is unusable: {source}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("authorization failed: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("launch failed: {0}")]
    Launch(#[from] LaunchError),
}

/// One artifact written to the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Outcome of a successful bootstrap, ready for hand-off
#[derive(Debug)]
pub struct Prepared {
    pub fetched: Vec<FetchedArtifact>,
    pub launch: Launch,
}

pub struct Bootstrap {
    config: Config,
    explicit_header: Option<AuthHeader>,
    artifacts: Vec<ArtifactRequest>,
    client: Client,
    fetcher: Arc<dyn Fetcher>,
}

impl Bootstrap {
    /// Validate the config and plan every artifact. No network access.
    pub fn new(config: Config, env: &EnvSnapshot) -> Result<Self, BootstrapError> {
        let client = build_client(&config.http).map_err(BootstrapError::HttpClient)?;
        let fetcher = Arc::new(HttpFetcher::new(client.clone()));
        Self::with_fetcher(config, env, client, fetcher)
    }

    /// Same as [`Bootstrap::new`] with a caller-supplied fetcher
    pub fn with_fetcher(
        config: Config,
        env: &EnvSnapshot,
        client: Client,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, BootstrapError> {
        config.validate()?;

        let explicit_header = config
            .auth_header
            .as_deref()
            .map(AuthHeader::parse)
            .transpose()
            .map_err(ValidationError::from)?;

        let artifacts = artifacts::plan(
            env,
            &config.bootstrap.config_dir,
            config.primary_config_url.as_deref(),
        )?;

        Ok(Self {
            config,
            explicit_header,
            artifacts,
            client,
            fetcher,
        })
    }

    /// Run every stage up to, not including, the control transfer.
    ///
    /// `args` are forwarded to the downstream process untouched.
    pub async fn prepare(
        &self,
        args: Vec<OsString>,
        env: &EnvSnapshot,
    ) -> Result<Prepared, BootstrapError> {
        let config_dir = &self.config.bootstrap.config_dir;

        ensure_working_directory(config_dir).await?;

        let broker = self.credential_broker().await?;

        let mut fetched = Vec::with_capacity(self.artifacts.len());
        for request in &self.artifacts {
            fetched.push(self.fetch_one(&broker, request).await?);
        }

        info!(
            count = fetched.len(),
            bytes = fetched.iter().map(|a| a.bytes).sum::<u64>(),
            "All artifacts fetched"
        );

        list_working_directory(config_dir).await;

        let launch = Launch::new(&self.config.bootstrap, args, env)?;
        debug!(
            var = launch.module_path_var(),
            value = %launch.module_path().to_string_lossy(),
            "Downstream environment prepared"
        );

        Ok(Prepared { fetched, launch })
    }

    async fn credential_broker(&self) -> Result<CredentialBroker, BootstrapError> {
        let third_party = match self.config.b2.credentials() {
            Some((key_id, application_key)) => {
                if self.explicit_header.is_some() {
                    info!("AUTH_HEADER is set and takes precedence over the Backblaze token");
                }

                let authorizer = B2Authorizer::new(self.client.clone(), &self.config.b2.auth_url);
                let result = authorizer.authorize(key_id, application_key).await?;
                Some(result.into_scheme()?)
            }
            None => None,
        };

        Ok(CredentialBroker::new(self.explicit_header.clone(), third_party))
    }

    async fn fetch_one(
        &self,
        broker: &CredentialBroker,
        request: &ArtifactRequest,
    ) -> Result<FetchedArtifact, BootstrapError> {
        let scheme = broker.scheme_for(&request.source_url);

        info!(
            kind = %request.kind,
            variable = %request.variable,
            url = %request.source_url,
            path = %request.destination_path.display(),
            auth = %scheme,
            "Fetching artifact"
        );

        let bytes = self
            .fetcher
            .fetch(&request.source_url, &request.destination_path, scheme.header())
            .await?;

        Ok(FetchedArtifact {
            kind: request.kind,
            path: request.destination_path.clone(),
            bytes,
        })
    }
}

/// Create the directory and any parents. `create_dir_all` already succeeds
/// when the path exists as a directory, so only a missing or blocked path fails.
async fn ensure_working_directory(dir: &Path) -> Result<(), BootstrapError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| BootstrapError::WorkingDirectory {
            path: dir.to_path_buf(),
            source,
        })
}

async fn list_working_directory(dir: &Path) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %dir.display(), %error, "Cannot list working directory");
            return;
        }
    };

    let mut count = 0usize;
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                info!(file = %entry.file_name().to_string_lossy(), size, "Working directory entry");
                count += 1;
            }
            Ok(None) => break,
            Err(error) => {
                warn!(path = %dir.display(), %error, "Cannot list working directory");
                break;
            }
        }
    }

    if count == 0 {
        warn!(path = %dir.display(), "Working directory is empty");
    }
}
