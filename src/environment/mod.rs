//! Virtual environment integration
//!
//! This module provides:
//! - Discovery of the project virtualenv (pyvenv.cfg)
//! - Process invocation of external tools
//! - pip as the package manager of the environment
//! - pyenv-based interpreter selection and venv creation

mod pip;
mod python;

pub use pip::{parse_freeze_output, PackageManager, SystemPip};
pub use python::{
    create_venv, pyenv_available_versions, pyenv_version, requires_python, select_python,
};

use crate::error::EnvironmentError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Marker file of a virtualenv root
pub const PYVENV_CFG: &str = "pyvenv.cfg";

/// How many parent directories are searched for a virtualenv
const MAX_PARENT_LEVELS: usize = 2;

/// Finds the virtualenv root at `start` or one of its nearest parents
pub fn find_venv_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(MAX_PARENT_LEVELS + 1)
        .find(|dir| dir.join(PYVENV_CFG).is_file())
        .map(Path::to_path_buf)
}

/// Returns true if `root` already holds a virtualenv
pub fn has_venv(root: &Path) -> bool {
    root.join(PYVENV_CFG).is_file()
}

/// Runs a command and returns its stdout
pub(crate) async fn run_command(
    program: &str,
    args: &[&str],
    working_dir: &Path,
) -> Result<String, EnvironmentError> {
    let command_str = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(command = %command_str, dir = %working_dir.display(), "running command");

    let output = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EnvironmentError::CommandNotFound {
                program: program.to_string(),
            },
            _ => EnvironmentError::SpawnError {
                command: command_str.clone(),
                source: e,
            },
        })?;

    if !output.status.success() {
        return Err(EnvironmentError::CommandFailed {
            command: command_str,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
