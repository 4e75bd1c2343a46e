//! Project manifest handling
//!
//! This module provides:
//! - The in-memory manifest: a default dependency group plus named optional groups
//! - The storage seam used to load and save the raw document
//! - pyproject.toml storage with project defaults
//! - Atomic file writing

mod pyproject_toml;
mod writer;

pub use pyproject_toml::{
    ensure_defaults, read_manifest, set_requires_python, write_manifest, PyprojectToml,
    PYPROJECT_FILE,
};
pub use writer::{atomic_write, create_dir_if_absent, write_if_absent};

use crate::domain::DependencyGroup;
use crate::error::ManifestError;
use std::collections::BTreeMap;
use toml_edit::DocumentMut;

/// Storage of the raw manifest document
///
/// Implementations must round-trip keys they do not understand, along
/// with their comments and layout.
pub trait ManifestStore {
    /// Load the document, or a fresh template if none exists yet
    fn load(&self) -> Result<DocumentMut, ManifestError>;

    /// Persist the document
    fn save(&self, document: &DocumentMut) -> Result<(), ManifestError>;
}

/// Declared dependencies of a project
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Required runtime dependencies
    pub dependencies: DependencyGroup,
    /// Optional dependency groups keyed by group name
    pub optional: BTreeMap<String, DependencyGroup>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// An optional group; `None` when it was never populated
    pub fn optional_group(&self, name: &str) -> Option<&DependencyGroup> {
        self.optional.get(name)
    }
}
