use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub b2: B2Config,
    /// Explicit `Name: value` header (`AUTH_HEADER`), never read from files
    #[serde(skip)]
    pub auth_header: Option<String>,
    /// Primary config URL (`LITELLM_CONFIG_URL`)
    #[serde(skip)]
    pub primary_config_url: Option<String>,
}

/// Working directory and downstream process settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Program that replaces this process once artifacts are in place
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    /// Search-path variable the downstream runtime loads handler modules from
    #[serde(default = "default_module_path_var")]
    pub module_path_var: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            entrypoint: default_entrypoint(),
            module_path_var: default_module_path_var(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("/app/config")
}

fn default_entrypoint() -> String {
    "litellm".to_string()
}

fn default_module_path_var() -> String {
    "PYTHONPATH".to_string()
}

/// HTTP client settings shared by the authorizer and the fetcher
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout; unset means the client default (none)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: None,
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("bootfetch/{}", env!("CARGO_PKG_VERSION"))
}

/// Backblaze B2 account authorization
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct B2Config {
    #[serde(default = "default_b2_auth_url")]
    pub auth_url: String,
    /// Loaded from environment only
    #[serde(skip)]
    pub key_id: Option<String>,
    /// Loaded from environment only
    #[serde(skip)]
    pub application_key: Option<String>,
}

impl B2Config {
    /// Both credential halves, if both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.key_id, &self.application_key) {
            (Some(id), Some(key)) => Some((id.as_str(), key.as_str())),
            _ => None,
        }
    }
}

impl Default for B2Config {
    fn default() -> Self {
        Self {
            auth_url: default_b2_auth_url(),
            key_id: None,
            application_key: None,
        }
    }
}

pub(crate) fn default_b2_auth_url() -> String {
    "https://api.backblazeb2.com/b2api/v2/b2_authorize_account".to_string()
}
