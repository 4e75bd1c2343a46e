//! PyPI JSON API metadata source
//!
//! Reads a package's declared dependencies from the index.
//! API endpoint: https://pypi.org/pypi/{package}/json

use crate::domain::PackageName;
use crate::error::MetadataError;
use crate::registry::{HttpClient, MetadataSource};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// PyPI API base URL
pub const PYPI_API_URL: &str = "https://pypi.org/pypi";

/// Metadata source backed by a PyPI-compatible JSON API
pub struct PyPiMetadata {
    client: HttpClient,
    base_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPiResponse {
    info: PackageInfo,
}

/// Latest-release information
#[derive(Debug, Deserialize)]
struct PackageInfo {
    /// `Requires-Dist` values; null when the package declares none
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

impl PyPiMetadata {
    /// Metadata source for pypi.org
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, PYPI_API_URL)
    }

    /// Metadata source for another index exposing the same JSON API
    pub fn with_base_url(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.base_url, package)
    }
}

#[async_trait]
impl MetadataSource for PyPiMetadata {
    fn source_name(&self) -> &'static str {
        "PyPI"
    }

    async fn requires(&self, name: &PackageName) -> Result<Vec<String>, MetadataError> {
        let url = self.build_url(name.canonical());
        debug!(%url, "fetching package metadata");
        let response: PyPiResponse = self
            .client
            .get_json(&url, name.as_str(), self.source_name())
            .await
            .map_err(|e| MetadataError::unavailable(name.as_str(), e.to_string()))?;

        Ok(response.info.requires_dist.unwrap_or_default())
    }
}
