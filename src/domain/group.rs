//! Dependency groups and group selection

use super::Requirement;
use std::collections::BTreeMap;
use std::fmt;

/// Reserved group name meaning "every optional group"
pub const ALL_GROUPS: &str = "all";

/// Which dependency groups an operation targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupSelector {
    /// The project's required dependencies
    Default,
    /// One optional group, together with the default group
    Named(String),
    /// Every optional group, together with the default group
    All,
}

impl GroupSelector {
    /// Interprets a user-supplied group name; empty means the default group
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") => GroupSelector::Default,
            Some(ALL_GROUPS) => GroupSelector::All,
            Some(name) => GroupSelector::Named(name.to_string()),
        }
    }

    /// Group name as used in file names and messages
    pub fn name(&self) -> Option<&str> {
        match self {
            GroupSelector::Default => None,
            GroupSelector::Named(name) => Some(name),
            GroupSelector::All => Some(ALL_GROUPS),
        }
    }

    /// Snapshot file name for this selection
    pub fn requirements_file(&self) -> String {
        match self.name() {
            Some(name) => format!("requirements-{}.txt", name),
            None => "requirements.txt".to_string(),
        }
    }
}

impl fmt::Display for GroupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => f.write_str("main"),
        }
    }
}

/// A set of requirements keyed by canonical package name
#[derive(Debug, Clone, Default)]
pub struct DependencyGroup {
    entries: BTreeMap<String, Requirement>,
}

impl DependencyGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `requirement`, replacing any entry for the same package
    pub fn insert(&mut self, requirement: Requirement) -> Option<Requirement> {
        self.entries
            .insert(requirement.key().to_string(), requirement)
    }

    /// Inserts `requirement` only if the package is not present yet
    pub fn insert_if_absent(&mut self, requirement: Requirement) -> bool {
        if self.entries.contains_key(requirement.key()) {
            return false;
        }
        self.entries
            .insert(requirement.key().to_string(), requirement);
        true
    }

    /// Removes the entry for the same package as `requirement`
    pub fn remove(&mut self, requirement: &Requirement) -> Option<Requirement> {
        self.entries.remove(requirement.key())
    }

    pub fn contains(&self, requirement: &Requirement) -> bool {
        self.entries.contains_key(requirement.key())
    }

    /// Looks up an entry by any spelling of the package name
    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.entries.get(&super::normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requirements in canonical-name order
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.entries.values()
    }

    /// Adds every requirement of `other`, replacing on identity
    pub fn extend_from(&mut self, other: &DependencyGroup) {
        for requirement in other.iter() {
            self.insert(requirement.clone());
        }
    }

    /// Canonical text of every requirement, in canonical-name order
    pub fn to_lines(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<Requirement> for DependencyGroup {
    fn from_iter<I: IntoIterator<Item = Requirement>>(iter: I) -> Self {
        let mut group = DependencyGroup::new();
        for requirement in iter {
            group.insert(requirement);
        }
        group
    }
}
