use super::models::Config;
use crate::env::EnvSnapshot;
use config::{ConfigError, Environment, File};
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "BOOTFETCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "bootfetch.toml";
const ENV_PREFIX: &str = "BOOTFETCH";
const ENV_SEPARATOR: &str = "__";

pub(crate) const CONFIG_DIR_VAR: &str = "CONFIG_DIR";
pub(crate) const PRIMARY_CONFIG_URL_VAR: &str = "LITELLM_CONFIG_URL";
pub(crate) const AUTH_HEADER_VAR: &str = "AUTH_HEADER";
pub(crate) const B2_KEY_ID_VARS: [&str; 2] = ["BACKBLAZE_KEY_ID", "B2_KEY_ID"];
pub(crate) const B2_APPLICATION_KEY_VARS: [&str; 2] =
    ["BACKBLAZE_APPLICATION_KEY", "B2_APPLICATION_KEY"];
pub(crate) const B2_AUTH_URL_VAR: &str = "BACKBLAZE_AUTH_URL";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. `BOOTFETCH__*` overrides from the snapshot
/// 4. Deployment variables (`CONFIG_DIR`, `AUTH_HEADER`, B2 credentials, ...)
pub fn load(env: &EnvSnapshot) -> Result<Config, ConfigError> {
    let config_path = env
        .non_empty(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path, env)?;

    load_deployment_vars(&mut config, env);

    Ok(config)
}

/// Apply the fixed deployment variables on top of the layered config.
/// Credentials and headers never come from files, only from the environment.
fn load_deployment_vars(config: &mut Config, env: &EnvSnapshot) {
    if let Some(dir) = env.non_empty(CONFIG_DIR_VAR) {
        config.bootstrap.config_dir = PathBuf::from(dir);
    }

    config.primary_config_url = env.non_empty(PRIMARY_CONFIG_URL_VAR).map(str::to_string);
    config.auth_header = env.non_empty(AUTH_HEADER_VAR).map(str::to_string);

    config.b2.key_id = env.first_non_empty(&B2_KEY_ID_VARS).map(str::to_string);
    config.b2.application_key = env
        .first_non_empty(&B2_APPLICATION_KEY_VARS)
        .map(str::to_string);

    if let Some(auth_url) = env.non_empty(B2_AUTH_URL_VAR) {
        config.b2.auth_url = auth_url.to_string();
    }
}

/// Load configuration from a specific path and environment snapshot
pub fn load_from_sources(config_path: PathBuf, env: &EnvSnapshot) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // BOOTFETCH__HTTP__REQUEST_TIMEOUT_SECS -> http.request_timeout_secs
    let overrides: config::Map<String, String> = env
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(Some(overrides)),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path, &EnvSnapshot::default()).unwrap();
        assert_eq!(config.bootstrap.config_dir, PathBuf::from("/app/config"));
        assert_eq!(config.bootstrap.entrypoint, "litellm");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[bootstrap]
config_dir = "/srv/proxy"
entrypoint = "/usr/local/bin/litellm"

[http]
request_timeout_secs = 30
user_agent = "custom-agent/1.0"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path, &EnvSnapshot::default()).unwrap();
        assert_eq!(config.bootstrap.config_dir, PathBuf::from("/srv/proxy"));
        assert_eq!(config.bootstrap.entrypoint, "/usr/local/bin/litellm");
        assert_eq!(config.bootstrap.module_path_var, "PYTHONPATH");
        assert_eq!(config.http.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.http.user_agent, "custom-agent/1.0");
    }

    #[test]
    fn test_env_overrides_beat_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        fs::write(&config_path, "[http]\nconnect_timeout_secs = 3\n").unwrap();

        let env = EnvSnapshot::from_pairs([
            ("BOOTFETCH__HTTP__CONNECT_TIMEOUT_SECS", "7"),
            ("BOOTFETCH__BOOTSTRAP__MODULE_PATH_VAR", "NODE_PATH"),
            ("UNRELATED", "ignored"),
        ]);

        let config = load_from_sources(config_path, &env).unwrap();
        assert_eq!(config.http.connect_timeout_secs, 7);
        assert_eq!(config.bootstrap.module_path_var, "NODE_PATH");
    }

    #[test]
    fn test_deployment_vars() {
        let temp_dir = TempDir::new().unwrap();
        let env = EnvSnapshot::from_pairs([
            (CONFIG_ENV_VAR, temp_dir.path().join("missing.toml").to_str().unwrap()),
            ("CONFIG_DIR", "/tmp/fetched"),
            ("LITELLM_CONFIG_URL", "https://x/y/config.yaml"),
            ("AUTH_HEADER", "Authorization: Bearer t1"),
            ("BACKBLAZE_KEY_ID", ""),
            ("B2_KEY_ID", "key-id"),
            ("BACKBLAZE_APPLICATION_KEY", "app-key"),
            ("B2_APPLICATION_KEY", "shadowed"),
            ("BACKBLAZE_AUTH_URL", "http://127.0.0.1:1/authorize"),
        ]);

        let config = load(&env).unwrap();
        assert_eq!(config.bootstrap.config_dir, PathBuf::from("/tmp/fetched"));
        assert_eq!(
            config.primary_config_url.as_deref(),
            Some("https://x/y/config.yaml")
        );
        assert_eq!(config.auth_header.as_deref(), Some("Authorization: Bearer t1"));
        assert_eq!(config.b2.credentials(), Some(("key-id", "app-key")));
        assert_eq!(config.b2.auth_url, "http://127.0.0.1:1/authorize");
    }

    #[test]
    fn test_empty_deployment_vars_are_unset() {
        let temp_dir = TempDir::new().unwrap();
        let env = EnvSnapshot::from_pairs([
            (CONFIG_ENV_VAR, temp_dir.path().join("missing.toml").to_str().unwrap()),
            ("CONFIG_DIR", ""),
            ("LITELLM_CONFIG_URL", ""),
            ("AUTH_HEADER", ""),
        ]);

        let config = load(&env).unwrap();
        assert_eq!(config.bootstrap.config_dir, PathBuf::from("/app/config"));
        assert!(config.primary_config_url.is_none());
        assert!(config.auth_header.is_none());
        assert!(config.b2.key_id.is_none());
    }
}
