//! Artifact naming and planning
//!
//! Maps environment variables to download requests:
//!
//! | Variable | Local file |
//! |---|---|
//! | `LITELLM_CONFIG_URL` | `config.yaml` |
//! | `CONFIG_URL_<X>` | `lowercase(X).yaml` |
//! | `HANDLER_URL_<X>` | `lowercase(X)_handler.py` |

use crate::env::EnvSnapshot;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_URL_PREFIX: &str = "CONFIG_URL_";
pub const HANDLER_URL_PREFIX: &str = "HANDLER_URL_";
pub const PRIMARY_CONFIG_FILENAME: &str = "config.yaml";

const CONFIG_SUFFIX: &str = ".yaml";
const HANDLER_SUFFIX: &str = "_handler.py";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("{variable}: '{suffix}' is not a usable artifact name")]
    InvalidName { variable: String, suffix: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    PrimaryConfig,
    AdditionalConfig,
    Handler,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactKind::PrimaryConfig => "primary-config",
            ArtifactKind::AdditionalConfig => "config",
            ArtifactKind::Handler => "handler",
        };
        f.write_str(label)
    }
}

/// One file to download into the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub source_url: String,
    pub destination_path: PathBuf,
    pub kind: ArtifactKind,
    /// Environment variable the request came from
    pub variable: String,
}

/// Local filename for a prefixed variable: prefix stripped, lower-cased,
/// kind suffix appended.
///
/// Any suffix is kept as-is apart from case, except ones that could leave the
/// working directory: empty, containing a path separator or NUL, or made
/// only of dots.
pub fn derive_filename(variable: &str, prefix: &str, kind: ArtifactKind) -> Result<String, PlanError> {
    let suffix = variable.strip_prefix(prefix).unwrap_or(variable);

    if !is_contained(suffix) {
        return Err(PlanError::InvalidName {
            variable: variable.to_string(),
            suffix: suffix.to_string(),
        });
    }

    let stem = suffix.to_lowercase();
    Ok(match kind {
        ArtifactKind::PrimaryConfig => PRIMARY_CONFIG_FILENAME.to_string(),
        ArtifactKind::AdditionalConfig => format!("{stem}{CONFIG_SUFFIX}"),
        ArtifactKind::Handler => format!("{stem}{HANDLER_SUFFIX}"),
    })
}

fn is_contained(suffix: &str) -> bool {
    !suffix.is_empty()
        && !suffix.contains(['/', '\\', '\0'])
        && !suffix.chars().all(|c| c == '.')
}

/// Every artifact to fetch, in fetch order: primary config, additional
/// configs, then handlers, each group sorted by variable name.
///
/// Variables with empty values are skipped. Two variables resolving to the
/// same file both stay in the plan; the later fetch overwrites the earlier.
pub fn plan(
    env: &EnvSnapshot,
    config_dir: &Path,
    primary_config_url: Option<&str>,
) -> Result<Vec<ArtifactRequest>, PlanError> {
    let mut requests = Vec::new();

    if let Some(url) = primary_config_url {
        requests.push(ArtifactRequest {
            source_url: url.to_string(),
            destination_path: config_dir.join(PRIMARY_CONFIG_FILENAME),
            kind: ArtifactKind::PrimaryConfig,
            variable: crate::config::PRIMARY_CONFIG_URL_VAR.to_string(),
        });
    }

    for (prefix, kind) in [
        (CONFIG_URL_PREFIX, ArtifactKind::AdditionalConfig),
        (HANDLER_URL_PREFIX, ArtifactKind::Handler),
    ] {
        for (variable, url) in env.with_prefix(prefix) {
            if url.is_empty() {
                tracing::debug!(variable, "Skipping empty artifact URL");
                continue;
            }

            let filename = derive_filename(variable, prefix, kind)?;
            requests.push(ArtifactRequest {
                source_url: url.to_string(),
                destination_path: config_dir.join(filename),
                kind,
                variable: variable.to_string(),
            });
        }
    }

    Ok(requests)
}
