//! Configuration management for bootfetch
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `BOOTFETCH__<section>__<key>` environment overrides
//! 4. The fixed deployment variables (`CONFIG_DIR`, `LITELLM_CONFIG_URL`,
//!    `AUTH_HEADER`, Backblaze credentials)
//!
//! All layers read from an [`EnvSnapshot`], never from the live environment.
//!
//! # Usage
//!
//! ```no_run
//! use bootfetch::config::{self, Config};
//!
//! let env = config::capture_environment();
//! let config = Config::load(&env).expect("Failed to load configuration");
//! println!("Fetching into: {}", config.bootstrap.config_dir.display());
//! ```
//!
//! # Configuration File
//!
//! By default the file is `bootfetch.toml` in the current directory. This can
//! be overridden using the `BOOTFETCH_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{B2Config, BootstrapConfig, Config, HttpConfig};
pub use validation::ValidationError;

pub(crate) use sources::PRIMARY_CONFIG_URL_VAR;

use crate::env::EnvSnapshot;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

/// Load a `.env` file if present, then snapshot the process environment.
pub fn capture_environment() -> EnvSnapshot {
    // Missing .env is the common case
    let _ = dotenvy::dotenv();
    EnvSnapshot::capture()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file or an override is malformed
    /// - Validation fails (partial credentials, malformed `AUTH_HEADER`, ...)
    pub fn load(env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let config = sources::load(env)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Deployment variables are not applied; useful for testing tunables files.
    pub fn load_from_path(path: PathBuf, env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path, env)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-check invariants on a config that was built or modified in code
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}
