//! pyproject.toml storage for Python projects
//!
//! Handles:
//! - project.dependencies (PEP 621) as the default group
//! - project.optional-dependencies (PEP 621) as named groups
//! - Project defaults the tool relies on (build-system, name, authors)
//!
//! The document is edited in place with `toml_edit`, so comments and
//! layout outside the rewritten dependency arrays survive a save.

use super::{atomic_write, Manifest, ManifestStore};
use crate::domain::{DependencyGroup, Requirement};
use crate::error::ManifestError;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{value, Array, DocumentMut, InlineTable, Item, Table, TableLike};

/// File name of the project manifest
pub const PYPROJECT_FILE: &str = "pyproject.toml";

const DEPENDENCIES_KEY: &str = "dependencies";
const OPTIONAL_DEPENDENCIES_KEY: &str = "optional-dependencies";

/// Indent of entries in a multi-line dependency array
const ARRAY_INDENT: &str = "\n    ";

const PYPROJECT_TEMPLATE: &str = r#"[build-system]
requires = ["setuptools"]
build-backend = "setuptools.build_meta"

[project]
name = ""
version = "0.1.0"
description = ""
readme = "README.md"
requires-python = ""
license = { text = "MIT License" }
authors = []
keywords = []
classifiers = []
dependencies = []

[project.optional-dependencies]
"#;

/// pyproject.toml at a project root
#[derive(Debug, Clone)]
pub struct PyprojectToml {
    path: PathBuf,
}

impl PyprojectToml {
    /// Storage for `<root>/pyproject.toml`
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(PYPROJECT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn parse(&self, content: &str) -> Result<DocumentMut, ManifestError> {
        content
            .parse::<DocumentMut>()
            .map_err(|e| ManifestError::toml_parse_error(&self.path, e.to_string()))
    }
}

impl ManifestStore for PyprojectToml {
    fn load(&self) -> Result<DocumentMut, ManifestError> {
        if !self.exists() {
            return self.parse(PYPROJECT_TEMPLATE);
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| ManifestError::read_error(&self.path, e))?;
        self.parse(&content)
    }

    fn save(&self, document: &DocumentMut) -> Result<(), ManifestError> {
        atomic_write(&self.path, &document.to_string())
            .map_err(|e| ManifestError::write_error(&self.path, e))
    }
}

/// Fills in the keys the tool expects, leaving existing values alone
pub fn ensure_defaults(document: &mut DocumentMut, project_name: &str, author: &str) {
    if !document.get("build-system").is_some_and(Item::is_table) {
        let mut build = Table::new();
        build["requires"] = value(Array::from_iter(["setuptools"]));
        build["build-backend"] = value("setuptools.build_meta");
        document.insert("build-system", Item::Table(build));
    }

    let project = project_table(document);

    let has_name = project
        .get("name")
        .and_then(Item::as_str)
        .is_some_and(|name| !name.is_empty());
    if !has_name {
        project["name"] = value(project_name);
    }

    let has_authors = project
        .get("authors")
        .and_then(Item::as_array)
        .is_some_and(|authors| !authors.is_empty());
    if !has_authors {
        let mut entry = InlineTable::new();
        entry.insert("name", author.into());
        entry.insert("email", "".into());
        let mut authors = Array::new();
        authors.push(entry);
        project["authors"] = value(authors);
    }

    if !project
        .get(OPTIONAL_DEPENDENCIES_KEY)
        .is_some_and(Item::is_table_like)
    {
        project.insert(OPTIONAL_DEPENDENCIES_KEY, Item::Table(Table::new()));
    }
}

/// Sets `project.requires-python`
pub fn set_requires_python(document: &mut DocumentMut, requires: &str) {
    project_table(document)["requires-python"] = value(requires);
}

/// Extracts the dependency groups from a document
pub fn read_manifest(document: &DocumentMut) -> Result<Manifest, ManifestError> {
    let mut manifest = Manifest::new();
    let Some(project) = document.get("project").and_then(Item::as_table_like) else {
        return Ok(manifest);
    };

    if let Some(deps) = project.get(DEPENDENCIES_KEY) {
        manifest.dependencies = read_group(deps, "project.dependencies")?;
    }

    if let Some(optional) = project.get(OPTIONAL_DEPENDENCIES_KEY) {
        let section = "project.optional-dependencies";
        let groups = optional
            .as_table_like()
            .ok_or_else(|| ManifestError::InvalidEntry {
                section: section.to_string(),
                message: "expected a table of dependency lists".to_string(),
            })?;
        for (name, deps) in groups.iter() {
            let group = read_group(deps, &format!("{}.{}", section, name))?;
            manifest.optional.insert(name.to_string(), group);
        }
    }

    Ok(manifest)
}

/// Writes the dependency groups back into a document
///
/// Group contents are written in canonical-name order. Arrays whose
/// contents did not change are left as they are; everything else in the
/// document keeps its position, comments and formatting.
pub fn write_manifest(document: &mut DocumentMut, manifest: &Manifest) {
    let project = project_table(document);
    set_group(project, DEPENDENCIES_KEY, &manifest.dependencies);

    let optional = project
        .entry(OPTIONAL_DEPENDENCIES_KEY)
        .or_insert(Item::Table(Table::new()));
    if !optional.is_table_like() {
        *optional = Item::Table(Table::new());
    }
    let Some(groups) = optional.as_table_like_mut() else {
        return;
    };

    let stale: Vec<String> = groups
        .iter()
        .map(|(name, _)| name.to_string())
        .filter(|name| !manifest.optional.contains_key(name))
        .collect();
    for name in stale {
        groups.remove(&name);
    }
    for (name, group) in &manifest.optional {
        set_group(groups, name, group);
    }
}

fn project_table(document: &mut DocumentMut) -> &mut Table {
    let item = document
        .entry("project")
        .or_insert(Item::Table(Table::new()));
    if !item.is_table() {
        let converted = std::mem::take(item).into_table().unwrap_or_default();
        *item = Item::Table(converted);
    }
    match item {
        Item::Table(project) => project,
        _ => unreachable!("project table inserted above"),
    }
}

fn read_group(item: &Item, section: &str) -> Result<DependencyGroup, ManifestError> {
    let entries = item.as_array().ok_or_else(|| ManifestError::InvalidEntry {
        section: section.to_string(),
        message: "expected an array of requirement strings".to_string(),
    })?;

    let mut group = DependencyGroup::new();
    for entry in entries {
        let text = entry.as_str().ok_or_else(|| ManifestError::InvalidEntry {
            section: section.to_string(),
            message: format!("expected a string, found {}", entry.type_name()),
        })?;
        let requirement =
            Requirement::parse(text).map_err(|source| ManifestError::InvalidRequirement {
                section: section.to_string(),
                source,
            })?;
        group.insert(requirement);
    }
    Ok(group)
}

/// Replaces the array at `key` unless it already lists the group
///
/// A multi-line array stays multi-line.
fn set_group(table: &mut dyn TableLike, key: &str, group: &DependencyGroup) {
    let lines = group.to_lines();
    let mut multiline = false;
    if let Some(current) = table.get(key).and_then(Item::as_array) {
        let unchanged = current.len() == lines.len()
            && current
                .iter()
                .zip(&lines)
                .all(|(entry, line)| entry.as_str() == Some(line.as_str()));
        if unchanged {
            return;
        }
        multiline = current.iter().any(|entry| {
            entry
                .decor()
                .prefix()
                .and_then(|prefix| prefix.as_str())
                .is_some_and(|prefix| prefix.contains('\n'))
        });
    }

    let mut array: Array = lines.into_iter().collect();
    if multiline && !array.is_empty() {
        for entry in array.iter_mut() {
            entry.decor_mut().set_prefix(ARRAY_INDENT);
        }
        array.set_trailing("\n");
        array.set_trailing_comma(true);
    }
    table.insert(key, value(array));
}
