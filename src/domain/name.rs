//! Package and extra names
//!
//! Names compare case- and separator-insensitively: `Foo_Bar`, `foo-bar` and
//! `FOO.bar` are the same package.

use crate::error::RequirementError;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9](?:[a-z0-9._-]*[a-z0-9])?$").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

/// Canonical form of a package or extra name
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RE
        .replace_all(name.trim(), "-")
        .to_ascii_lowercase()
}

/// Returns true if `name` is a valid package or extra identifier
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// A package name as written, with its canonical form for comparison
#[derive(Debug, Clone)]
pub struct PackageName {
    raw: String,
    canonical: String,
}

impl PackageName {
    /// Validates and wraps a package name
    pub fn new(name: &str) -> Result<Self, RequirementError> {
        let name = name.trim();
        if !is_valid_name(name) {
            return Err(RequirementError::malformed(
                name,
                "invalid package name",
            ));
        }
        Ok(Self {
            raw: name.to_string(),
            canonical: normalize_name(name),
        })
    }

    /// The name as it was written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized name used for identity
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for PackageName {}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
