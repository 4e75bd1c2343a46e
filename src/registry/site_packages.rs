//! Installed distribution metadata
//!
//! Reads `Requires-Dist` headers from the `*.dist-info/METADATA` files of a
//! virtualenv's site-packages, so freezing needs no network access.

use crate::domain::{normalize_name, PackageName};
use crate::error::MetadataError;
use crate::registry::MetadataSource;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const METADATA_FILE: &str = "METADATA";
const DIST_INFO_SUFFIX: &str = ".dist-info";

/// Metadata source reading the installed distributions of a virtualenv
#[derive(Debug, Clone)]
pub struct SitePackages {
    root: PathBuf,
}

/// Headers of a core metadata file that matter here
#[derive(Debug, Default, PartialEq, Eq)]
struct CoreMetadata {
    name: Option<String>,
    requires_dist: Vec<String>,
}

impl SitePackages {
    /// Metadata source for the virtualenv rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// site-packages directories of the virtualenv
    ///
    /// POSIX layouts keep them under `lib/pythonX.Y` (and sometimes
    /// `lib64`), Windows under `Lib`.
    pub fn site_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for lib in ["lib", "lib64"] {
            let Ok(entries) = fs::read_dir(self.root.join(lib)) else {
                continue;
            };
            let mut versions: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .filter(|entry| entry.file_name().to_string_lossy().starts_with("python"))
                .map(|entry| entry.path().join("site-packages"))
                .filter(|path| path.is_dir())
                .collect();
            versions.sort();
            dirs.extend(versions);
        }
        let windows = self.root.join("Lib").join("site-packages");
        if windows.is_dir() && !dirs.contains(&windows) {
            dirs.push(windows);
        }
        dirs
    }

    fn find_metadata(&self, name: &PackageName) -> Option<CoreMetadata> {
        for site_dir in self.site_dirs() {
            let Ok(entries) = fs::read_dir(&site_dir) else {
                continue;
            };
            let mut dist_infos: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .is_some_and(|n| n.to_string_lossy().ends_with(DIST_INFO_SUFFIX))
                })
                .collect();
            dist_infos.sort();

            for dist_info in dist_infos {
                let Some(metadata) = read_metadata(&dist_info.join(METADATA_FILE)) else {
                    continue;
                };
                if metadata
                    .name
                    .as_deref()
                    .is_some_and(|n| normalize_name(n) == name.canonical())
                {
                    debug!(path = %dist_info.display(), "found installed metadata");
                    return Some(metadata);
                }
            }
        }
        None
    }
}

fn read_metadata(path: &Path) -> Option<CoreMetadata> {
    fs::read_to_string(path)
        .ok()
        .map(|content| parse_core_metadata(&content))
}

/// Parses the RFC 822 style header block of a METADATA file
fn parse_core_metadata(content: &str) -> CoreMetadata {
    let mut metadata = CoreMetadata::default();
    for line in content.lines() {
        if line.trim().is_empty() {
            // The body (long description) starts after the first blank line
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" if metadata.name.is_none() => metadata.name = Some(value.to_string()),
            "Requires-Dist" if !value.is_empty() => {
                metadata.requires_dist.push(value.to_string())
            }
            _ => {}
        }
    }
    metadata
}

#[async_trait]
impl MetadataSource for SitePackages {
    fn source_name(&self) -> &'static str {
        "site-packages"
    }

    async fn requires(&self, name: &PackageName) -> Result<Vec<String>, MetadataError> {
        self.find_metadata(name)
            .map(|metadata| metadata.requires_dist)
            .ok_or_else(|| {
                MetadataError::unavailable(
                    name.as_str(),
                    format!("no installed distribution under {}", self.root.display()),
                )
            })
    }
}
