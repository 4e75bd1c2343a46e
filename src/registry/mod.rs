//! Package metadata sources
//!
//! This module provides:
//! - The lookup seam used by snapshots to read a package's declared dependencies
//! - Installed `*.dist-info` metadata of the project virtualenv
//! - The PyPI JSON API, behind an HTTP client with retry logic

mod client;
mod pypi;
mod site_packages;

pub use client::HttpClient;
pub use pypi::{PyPiMetadata, PYPI_API_URL};
pub use site_packages::SitePackages;

use crate::domain::PackageName;
use crate::error::MetadataError;
use async_trait::async_trait;

/// Lookup of the dependencies a package itself declares (`Requires-Dist`)
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Name used in messages
    fn source_name(&self) -> &'static str;

    /// Raw requirement strings published by `name`, in declared order
    async fn requires(&self, name: &PackageName) -> Result<Vec<String>, MetadataError>;
}
