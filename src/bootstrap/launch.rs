//! Downstream process hand-off

use crate::config::BootstrapConfig;
use crate::env::EnvSnapshot;
use std::env::JoinPathsError;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cannot add {} to {var}: {source}", .dir.display())]
    ModulePath {
        var: String,
        dir: PathBuf,
        #[source]
        source: JoinPathsError,
    },

    #[error("failed to execute {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Fully prepared downstream invocation
#[derive(Debug, Clone)]
pub struct Launch {
    program: String,
    args: Vec<OsString>,
    module_path_var: String,
    module_path: OsString,
}

impl Launch {
    /// Put the working directory first on the module search path, keeping
    /// any existing entries after it.
    pub fn new(
        config: &BootstrapConfig,
        args: Vec<OsString>,
        env: &EnvSnapshot,
    ) -> Result<Self, LaunchError> {
        let existing = env
            .get_os(&config.module_path_var)
            .filter(|value| !value.is_empty());
        let module_path =
            prepend_path(&config.config_dir, existing).map_err(|source| LaunchError::ModulePath {
                var: config.module_path_var.clone(),
                dir: config.config_dir.clone(),
                source,
            })?;

        Ok(Self {
            program: config.entrypoint.clone(),
            args,
            module_path_var: config.module_path_var.clone(),
            module_path,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn module_path_var(&self) -> &str {
        &self.module_path_var
    }

    pub fn module_path(&self) -> &OsStr {
        &self.module_path
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(&self.module_path_var, &self.module_path);
        command
    }

    /// Replace the current process image. Only returns on failure.
    #[cfg(unix)]
    pub fn exec(self) -> LaunchError {
        use std::os::unix::process::CommandExt;

        let source = self.command().exec();
        LaunchError::Exec {
            program: self.program,
            source,
        }
    }

    /// Without exec: run the child and exit with its status code.
    #[cfg(not(unix))]
    pub fn exec(self) -> LaunchError {
        match self.command().status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(source) => LaunchError::Exec {
                program: self.program,
                source,
            },
        }
    }
}

fn prepend_path(dir: &Path, existing: Option<&OsStr>) -> Result<OsString, JoinPathsError> {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(existing) = existing {
        entries.extend(std::env::split_paths(existing));
    }
    std::env::join_paths(entries)
}
