//! pip integration
//!
//! The package manager of the project virtualenv: installs and removes
//! packages and lists what is installed.

use super::run_command;
use crate::domain::Requirement;
use crate::error::{EnvironmentError, RequirementError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Operations on the packages of an environment
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Raw `name==version` listing of installed packages
    async fn freeze(&self) -> Result<String, EnvironmentError>;

    /// Install or upgrade a package from a requirement string
    async fn install(&self, requirement: &str) -> Result<(), EnvironmentError>;

    /// Uninstall a package by name
    async fn uninstall(&self, name: &str) -> Result<(), EnvironmentError>;
}

/// pip of a virtualenv, invoked as a child process
#[derive(Debug, Clone)]
pub struct SystemPip {
    root: PathBuf,
}

impl SystemPip {
    /// pip of the virtualenv rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the pip executable inside the virtualenv
    pub fn executable(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts").join("pip.exe")
        } else {
            self.root.join("bin").join("pip")
        }
    }

    async fn pip(&self, args: &[&str]) -> Result<String, EnvironmentError> {
        let exe = self.executable();
        run_command(&exe.to_string_lossy(), args, &self.root).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl PackageManager for SystemPip {
    async fn freeze(&self) -> Result<String, EnvironmentError> {
        self.pip(&["freeze"]).await
    }

    async fn install(&self, requirement: &str) -> Result<(), EnvironmentError> {
        self.pip(&["install", "-U", requirement]).await.map(|_| ())
    }

    async fn uninstall(&self, name: &str) -> Result<(), EnvironmentError> {
        self.pip(&["uninstall", "-y", name]).await.map(|_| ())
    }
}

/// Parses `pip freeze` output into requirements
///
/// Blank lines, comments and editable installs (`-e ...`) are skipped.
pub fn parse_freeze_output(output: &str) -> Result<Vec<Requirement>, RequirementError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !(line.is_empty() || line.starts_with('#') || line.starts_with("-e")))
        .map(Requirement::parse)
        .collect()
}
