use super::models::Config;
use crate::auth::{AuthHeader, HeaderParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{present} is set but {missing} is not; set both Backblaze credentials or neither")]
    PartialB2Credentials {
        present: &'static str,
        missing: &'static str,
    },

    #[error("AUTH_HEADER is malformed: {0}")]
    InvalidAuthHeader(#[from] HeaderParseError),

    #[error("Backblaze authorize URL '{url}' is invalid: {reason}")]
    InvalidAuthUrl { url: String, reason: String },

    #[error("bootstrap.{0} must not be empty")]
    EmptyField(&'static str),

    #[error("http.{0} must be positive")]
    ZeroTimeout(&'static str),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_b2(config)?;
    validate_auth_header(config)?;
    validate_bootstrap(config)?;
    validate_http(config)?;
    Ok(())
}

/// Credential halves must be configured together
fn validate_b2(config: &Config) -> Result<(), ValidationError> {
    const KEY_ID: &str = "BACKBLAZE_KEY_ID/B2_KEY_ID";
    const APPLICATION_KEY: &str = "BACKBLAZE_APPLICATION_KEY/B2_APPLICATION_KEY";

    match (&config.b2.key_id, &config.b2.application_key) {
        (Some(_), None) => Err(ValidationError::PartialB2Credentials {
            present: KEY_ID,
            missing: APPLICATION_KEY,
        }),
        (None, Some(_)) => Err(ValidationError::PartialB2Credentials {
            present: APPLICATION_KEY,
            missing: KEY_ID,
        }),
        (Some(_), Some(_)) => reqwest::Url::parse(&config.b2.auth_url)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidAuthUrl {
                url: config.b2.auth_url.clone(),
                reason: e.to_string(),
            }),
        (None, None) => Ok(()),
    }
}

fn validate_auth_header(config: &Config) -> Result<(), ValidationError> {
    if let Some(ref raw) = config.auth_header {
        AuthHeader::parse(raw)?;
    }
    Ok(())
}

fn validate_bootstrap(config: &Config) -> Result<(), ValidationError> {
    if config.bootstrap.config_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyField("config_dir"));
    }
    if config.bootstrap.entrypoint.trim().is_empty() {
        return Err(ValidationError::EmptyField("entrypoint"));
    }
    if config.bootstrap.module_path_var.trim().is_empty() {
        return Err(ValidationError::EmptyField("module_path_var"));
    }
    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout("connect_timeout_secs"));
    }
    if config.http.request_timeout_secs == Some(0) {
        return Err(ValidationError::ZeroTimeout("request_timeout_secs"));
    }
    Ok(())
}
