//! Parsed dependency requirement

use super::{MarkerTree, PackageName, VersionSpecifier};
use crate::error::RequirementError;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A dependency line such as `requests[security]>=2.8.1; python_version < "3"`
///
/// Equality and hashing look at the package name only: a requirement set is
/// a set of packages, not of constraint variants. Use
/// [`Requirement::is_identical`] to compare every field.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: PackageName,
    /// Requested extras, sorted
    pub extras: BTreeSet<String>,
    /// Version constraints in written order, without duplicates
    pub specifiers: Vec<VersionSpecifier>,
    /// Direct reference (`name @ url`)
    pub url: Option<String>,
    pub marker: Option<MarkerTree>,
}

impl Requirement {
    /// A bare requirement on `name`
    pub fn new(name: PackageName) -> Self {
        Self {
            name,
            extras: BTreeSet::new(),
            specifiers: Vec::new(),
            url: None,
            marker: None,
        }
    }

    /// Parses a requirement string
    pub fn parse(input: &str) -> Result<Self, RequirementError> {
        crate::parser::parse_requirement(input)
    }

    /// Canonical package name, the requirement's identity
    pub fn key(&self) -> &str {
        self.name.canonical()
    }

    /// Returns true if extras were requested
    pub fn has_extras(&self) -> bool {
        !self.extras.is_empty()
    }

    /// Full field comparison, including the name's spelling
    pub fn is_identical(&self, other: &Requirement) -> bool {
        self.name.as_str() == other.name.as_str()
            && self.extras == other.extras
            && self.specifiers == other.specifiers
            && self.url == other.url
            && self.marker == other.marker
    }

    /// Installed version if this is a single `==` pin, as in `pip freeze` output
    pub fn pinned_version(&self) -> Option<&str> {
        match self.specifiers.as_slice() {
            [spec] if spec.is_pinned() => Some(spec.version.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())?;

        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }

        if let Some(ref url) = self.url {
            write!(f, " @ {}", url)?;
            if let Some(ref marker) = self.marker {
                // A space keeps `;` from being read as part of the URL
                write!(f, " ; {}", marker)?;
            }
            return Ok(());
        }

        let specifiers: Vec<String> = self.specifiers.iter().map(ToString::to_string).collect();
        f.write_str(&specifiers.join(","))?;

        if let Some(ref marker) = self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}
