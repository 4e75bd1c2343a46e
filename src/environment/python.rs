//! Interpreter selection and virtualenv creation via pyenv

use super::run_command;
use crate::error::EnvironmentError;
use regex::Regex;
use semver::Version;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

// Plain CPython releases as listed by `pyenv install --list`: `3.12` or `3.12.1`
static PYTHON_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.(\d+)(?:\.(\d+))?\s*$").unwrap());

/// Version string of pyenv, or `None` if pyenv is not installed
pub async fn pyenv_version(working_dir: &Path) -> Option<String> {
    run_command("pyenv", &["--version"], working_dir)
        .await
        .ok()
        .map(|out| out.trim().to_string())
}

/// Interpreter versions pyenv can install, in listing order
pub async fn pyenv_available_versions(working_dir: &Path) -> Result<Vec<String>, EnvironmentError> {
    let listing = run_command("pyenv", &["install", "--list"], working_dir).await?;
    Ok(listing
        .lines()
        .filter(|line| PYTHON_VERSION_RE.is_match(line))
        .map(|line| line.trim().to_string())
        .collect())
}

fn as_semver(version: &str) -> Option<Version> {
    let caps = PYTHON_VERSION_RE.captures(version)?;
    Some(Version::new(
        caps.get(1)?.as_str().parse().ok()?,
        caps.get(2)?.as_str().parse().ok()?,
        caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?,
    ))
}

/// Picks the requested version if available, otherwise the newest one
pub fn select_python(available: &[String], requested: Option<&str>) -> Option<String> {
    if let Some(requested) = requested.map(str::trim) {
        if available.iter().any(|v| v == requested) {
            return Some(requested.to_string());
        }
    }
    available
        .iter()
        .filter_map(|v| as_semver(v).map(|parsed| (parsed, v)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v.clone())
}

/// `requires-python` value for an interpreter version, e.g. `>=3.10`
pub fn requires_python(version: &str) -> Option<String> {
    let parsed = as_semver(version)?;
    Some(format!(">={}.{}", parsed.major, parsed.minor))
}

/// Installs `version` with pyenv, pins it locally and creates a venv in `root`
pub async fn create_venv(root: &Path, version: &str) -> Result<(), EnvironmentError> {
    info!(version, root = %root.display(), "preparing project environment");
    run_command("pyenv", &["install", "-s", version], root).await?;
    run_command("pyenv", &["local", version], root).await?;
    run_command("python", &["-m", "venv", "."], root).await?;
    Ok(())
}
