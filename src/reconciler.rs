//! Dependency reconciliation
//!
//! Keeps the manifest's dependency groups free of duplicates and computes
//! which installed packages belong to a group.

use crate::domain::{DependencyGroup, GroupSelector, Requirement, ALL_GROUPS};
use crate::environment::{parse_freeze_output, PackageManager};
use crate::error::ReconcileError;
use crate::manifest::Manifest;
use crate::registry::MetadataSource;
use std::collections::HashSet;
use tracing::debug;

/// Owner of the declared dependency groups of one project
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    manifest: Manifest,
}

impl Reconciler {
    pub fn new(manifest: Manifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Records a requirement in a dependency group
    ///
    /// Without a group the requirement becomes a required dependency and is
    /// removed from every optional group. With a group only that group is
    /// touched. Either way an existing entry for the same package is replaced.
    pub fn add_requirement(
        &mut self,
        text: &str,
        group: Option<&str>,
    ) -> Result<Requirement, ReconcileError> {
        let requirement = Requirement::parse(text)?;

        match GroupSelector::from_name(group) {
            GroupSelector::All => {
                return Err(ReconcileError::ReservedGroup {
                    name: ALL_GROUPS.to_string(),
                });
            }
            GroupSelector::Default => {
                self.purge_optional(&requirement);
                debug!(package = requirement.key(), "adding required dependency");
                self.manifest.dependencies.insert(requirement.clone());
            }
            GroupSelector::Named(name) => {
                debug!(package = requirement.key(), group = %name, "adding optional dependency");
                self.manifest
                    .optional
                    .entry(name)
                    .or_default()
                    .insert(requirement.clone());
            }
        }

        Ok(requirement)
    }

    /// Removes a package from every dependency group
    ///
    /// Returns false if the package was not declared anywhere.
    pub fn remove_requirement(&mut self, text: &str) -> Result<bool, ReconcileError> {
        let requirement = Requirement::parse(text)?;
        let mut removed = self.manifest.dependencies.remove(&requirement).is_some();
        removed |= self.purge_optional(&requirement);
        debug!(package = requirement.key(), removed, "removing dependency");
        Ok(removed)
    }

    // Drops `requirement` from the optional groups, and groups left empty
    fn purge_optional(&mut self, requirement: &Requirement) -> bool {
        let mut removed = false;
        self.manifest.optional.retain(|name, group| {
            if group.remove(requirement).is_some() {
                debug!(package = requirement.key(), group = %name, "purged from group");
                removed = true;
                return !group.is_empty();
            }
            true
        });
        removed
    }

    /// Declared requirements of a selection, the default group included
    pub fn required(&self, selector: &GroupSelector) -> DependencyGroup {
        let mut required = self.manifest.dependencies.clone();
        match selector {
            GroupSelector::Default => {}
            GroupSelector::Named(name) => {
                if let Some(group) = self.manifest.optional_group(name) {
                    required.extend_from(group);
                }
            }
            GroupSelector::All => {
                for group in self.manifest.optional.values() {
                    required.extend_from(group);
                }
            }
        }
        required
    }

    /// Installed packages that belong to a selection
    ///
    /// The declared requirements are expanded by one level with the
    /// dependencies each package publishes: those guarded by a requested
    /// extra for requirements with extras, and the unconditional ones
    /// otherwise. The result is the installed packages whose name is in
    /// that set, sorted by their text.
    pub async fn compute_snapshot(
        &self,
        selector: &GroupSelector,
        lister: &dyn PackageManager,
        metadata: &dyn MetadataSource,
    ) -> Result<Vec<Requirement>, ReconcileError> {
        let mut required = self.required(selector);

        let expansion = expand(&required, metadata).await?;
        for requirement in expansion {
            required.insert_if_absent(requirement);
        }

        let installed = parse_freeze_output(&lister.freeze().await?)?;
        let mut seen = HashSet::new();
        let mut snapshot: Vec<Requirement> = installed
            .into_iter()
            .filter(|package| required.contains(package))
            .filter(|package| seen.insert(package.key().to_string()))
            .collect();
        snapshot.sort_by_cached_key(ToString::to_string);

        debug!(
            group = %selector,
            required = required.len(),
            packages = snapshot.len(),
            "computed snapshot"
        );
        Ok(snapshot)
    }
}

/// Published dependencies pulled in by the requirements of `required`
async fn expand(
    required: &DependencyGroup,
    metadata: &dyn MetadataSource,
) -> Result<Vec<Requirement>, ReconcileError> {
    let mut expansion = Vec::new();
    for declared in required.iter() {
        for text in metadata.requires(&declared.name).await? {
            let published = Requirement::parse(&text)?;
            if applies_to(declared, &published) {
                debug!(
                    package = declared.key(),
                    dependency = published.key(),
                    "including published dependency"
                );
                expansion.push(published);
            }
        }
    }
    Ok(expansion)
}

fn applies_to(declared: &Requirement, published: &Requirement) -> bool {
    let marker = published.marker.as_ref();
    if declared.has_extras() {
        marker.is_some_and(|m| m.mentions_any_extra(&declared.extras))
    } else {
        marker.is_none_or(|m| !m.has_extra_clause())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageName;
    use crate::error::{EnvironmentError, MetadataError};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakePip {
        freeze: String,
    }

    #[async_trait]
    impl PackageManager for FakePip {
        async fn freeze(&self) -> Result<String, EnvironmentError> {
            Ok(self.freeze.clone())
        }

        async fn install(&self, _requirement: &str) -> Result<(), EnvironmentError> {
            Ok(())
        }

        async fn uninstall(&self, _name: &str) -> Result<(), EnvironmentError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeMetadata {
        requires: HashMap<String, Vec<String>>,
    }

    impl FakeMetadata {
        fn with(mut self, package: &str, requires: &[&str]) -> Self {
            self.requires.insert(
                package.to_string(),
                requires.iter().map(|s| s.to_string()).collect(),
            );
            self
        }
    }

    #[async_trait]
    impl MetadataSource for FakeMetadata {
        fn source_name(&self) -> &'static str {
            "fake"
        }

        async fn requires(&self, name: &PackageName) -> Result<Vec<String>, MetadataError> {
            Ok(self
                .requires
                .get(name.canonical())
                .cloned()
                .unwrap_or_default())
        }
    }

    struct FailingMetadata;

    #[async_trait]
    impl MetadataSource for FailingMetadata {
        fn source_name(&self) -> &'static str {
            "failing"
        }

        async fn requires(&self, name: &PackageName) -> Result<Vec<String>, MetadataError> {
            Err(MetadataError::unavailable(name.as_str(), "not installed"))
        }
    }

    fn pip(freeze: &str) -> FakePip {
        FakePip {
            freeze: freeze.to_string(),
        }
    }

    fn lines(snapshot: &[Requirement]) -> Vec<String> {
        snapshot.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests>=2.0", None).unwrap();
        reconciler.add_requirement("Requests<3", None).unwrap();

        let deps = &reconciler.manifest().dependencies;
        assert_eq!(deps.len(), 1);
        assert_eq!(deps.get("requests").unwrap().to_string(), "Requests<3");
    }

    #[test]
    fn test_add_to_group_replaces_within_group() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("pytest", Some("dev")).unwrap();
        reconciler.add_requirement("pytest>=8", Some("dev")).unwrap();

        let dev = reconciler.manifest().optional_group("dev").unwrap();
        assert_eq!(dev.to_lines(), vec!["pytest>=8"]);
        assert!(reconciler.manifest().dependencies.is_empty());
    }

    #[test]
    fn test_add_to_group_leaves_default_untouched() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests==2.31.0", None).unwrap();
        reconciler.add_requirement("requests", Some("dev")).unwrap();

        assert_eq!(
            reconciler.manifest().dependencies.to_lines(),
            vec!["requests==2.31.0"]
        );
        assert_eq!(
            reconciler.manifest().optional_group("dev").unwrap().to_lines(),
            vec!["requests"]
        );
    }

    #[test]
    fn test_add_promotes_out_of_optional_groups() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("pytest", Some("dev")).unwrap();
        reconciler.add_requirement("black", Some("dev")).unwrap();
        reconciler.add_requirement("pytest", Some("test")).unwrap();
        reconciler.add_requirement("pytest==8.0", None).unwrap();

        let manifest = reconciler.manifest();
        assert_eq!(manifest.dependencies.to_lines(), vec!["pytest==8.0"]);
        assert_eq!(
            manifest.optional_group("dev").unwrap().to_lines(),
            vec!["black"]
        );
        assert!(manifest.optional_group("test").is_none());
    }

    #[test]
    fn test_add_rejects_reserved_group() {
        let mut reconciler = Reconciler::default();
        let err = reconciler.add_requirement("pytest", Some("all")).unwrap_err();
        assert!(matches!(err, ReconcileError::ReservedGroup { .. }));
        assert!(reconciler.manifest().optional.is_empty());
    }

    #[test]
    fn test_add_empty_group_name_means_default() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("six", Some("")).unwrap();
        assert_eq!(reconciler.manifest().dependencies.len(), 1);
    }

    #[test]
    fn test_add_malformed_leaves_manifest_unchanged() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("six", None).unwrap();
        let err = reconciler.add_requirement("six[", None).unwrap_err();
        assert!(matches!(err, ReconcileError::Requirement(_)));
        assert_eq!(reconciler.manifest().dependencies.to_lines(), vec!["six"]);
    }

    #[test]
    fn test_remove_purges_everywhere() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests", None).unwrap();
        reconciler.add_requirement("pytest", Some("dev")).unwrap();
        reconciler.add_requirement("black", Some("dev")).unwrap();
        reconciler.add_requirement("Pytest", Some("test")).unwrap();

        assert!(reconciler.remove_requirement("pytest>=1").unwrap());

        let manifest = reconciler.manifest();
        assert_eq!(manifest.dependencies.to_lines(), vec!["requests"]);
        assert_eq!(
            manifest.optional_group("dev").unwrap().to_lines(),
            vec!["black"]
        );
        assert!(manifest.optional_group("test").is_none());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests", None).unwrap();
        assert!(!reconciler.remove_requirement("flask").unwrap());
        assert_eq!(reconciler.manifest().dependencies.len(), 1);
    }

    #[test]
    fn test_required_selection() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests", None).unwrap();
        reconciler.add_requirement("pytest", Some("dev")).unwrap();
        reconciler.add_requirement("sphinx", Some("docs")).unwrap();

        assert_eq!(
            reconciler.required(&GroupSelector::Default).to_lines(),
            vec!["requests"]
        );
        assert_eq!(
            reconciler
                .required(&GroupSelector::Named("dev".to_string()))
                .to_lines(),
            vec!["pytest", "requests"]
        );
        assert_eq!(
            reconciler
                .required(&GroupSelector::Named("missing".to_string()))
                .to_lines(),
            vec!["requests"]
        );
        assert_eq!(
            reconciler.required(&GroupSelector::All).to_lines(),
            vec!["pytest", "requests", "sphinx"]
        );
    }

    #[tokio::test]
    async fn test_snapshot_with_extras() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("a", None).unwrap();
        reconciler.add_requirement("b[feat]", None).unwrap();

        let metadata = FakeMetadata::default().with(
            "b",
            &["c; extra == \"feat\"", "d; extra == \"other\""],
        );
        let lister = pip("a==1.0\nb==2.0\nc==3.0\nd==4.0\ne==5.0\n");

        let snapshot = reconciler
            .compute_snapshot(&GroupSelector::Default, &lister, &metadata)
            .await
            .unwrap();
        assert_eq!(lines(&snapshot), vec!["a==1.0", "b==2.0", "c==3.0"]);
    }

    #[tokio::test]
    async fn test_snapshot_unconditional_transitive() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("a", None).unwrap();

        let metadata = FakeMetadata::default().with(
            "a",
            &["x>=1", "y; python_version < \"3.8\"", "z; extra == \"test\""],
        );
        let lister = pip("a==1.0\nx==1.5\ny==0.3\nz==2.0\n");

        let snapshot = reconciler
            .compute_snapshot(&GroupSelector::Default, &lister, &metadata)
            .await
            .unwrap();
        assert_eq!(lines(&snapshot), vec!["a==1.0", "x==1.5", "y==0.3"]);
    }

    #[tokio::test]
    async fn test_snapshot_extra_clause_in_compound_marker() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("b[Feat_X]", None).unwrap();

        let metadata = FakeMetadata::default().with(
            "b",
            &[
                "c; python_version >= \"3.8\" and extra == \"feat-x\"",
                "d; (extra == \"other\" or extra == \"feat.x\")",
            ],
        );
        let lister = pip("b==2.0\nc==3.0\nd==4.0\n");

        let snapshot = reconciler
            .compute_snapshot(&GroupSelector::Default, &lister, &metadata)
            .await
            .unwrap();
        assert_eq!(lines(&snapshot), vec!["b==2.0", "c==3.0", "d==4.0"]);
    }

    #[tokio::test]
    async fn test_snapshot_is_one_level_deep() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("a", None).unwrap();

        let metadata = FakeMetadata::default()
            .with("a", &["b"])
            .with("b", &["c"]);
        let lister = pip("a==1.0\nb==1.0\nc==1.0\n");

        let snapshot = reconciler
            .compute_snapshot(&GroupSelector::Default, &lister, &metadata)
            .await
            .unwrap();
        assert_eq!(lines(&snapshot), vec!["a==1.0", "b==1.0"]);
    }

    #[tokio::test]
    async fn test_snapshot_group_selection() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests", None).unwrap();
        reconciler.add_requirement("pytest", Some("dev")).unwrap();
        reconciler.add_requirement("sphinx", Some("docs")).unwrap();

        let metadata = FakeMetadata::default();
        let lister = pip("pytest==8.0.0\nrequests==2.31.0\nsphinx==7.2.6\n");

        let default = reconciler
            .compute_snapshot(&GroupSelector::Default, &lister, &metadata)
            .await
            .unwrap();
        assert_eq!(lines(&default), vec!["requests==2.31.0"]);

        let dev = reconciler
            .compute_snapshot(&GroupSelector::Named("dev".to_string()), &lister, &metadata)
            .await
            .unwrap();
        assert_eq!(lines(&dev), vec!["pytest==8.0.0", "requests==2.31.0"]);

        let all = reconciler
            .compute_snapshot(&GroupSelector::All, &lister, &metadata)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_snapshot_matches_names_canonically() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("zope_interface", None).unwrap();

        let snapshot = reconciler
            .compute_snapshot(
                &GroupSelector::Default,
                &pip("zope.interface==6.1\nzope.interface==6.1\n"),
                &FakeMetadata::default(),
            )
            .await
            .unwrap();
        assert_eq!(lines(&snapshot), vec!["zope.interface==6.1"]);
    }

    #[tokio::test]
    async fn test_snapshot_skips_uninstalled() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests", None).unwrap();
        reconciler.add_requirement("flask", None).unwrap();

        let snapshot = reconciler
            .compute_snapshot(
                &GroupSelector::Default,
                &pip("requests==2.31.0\n"),
                &FakeMetadata::default(),
            )
            .await
            .unwrap();
        assert_eq!(lines(&snapshot), vec!["requests==2.31.0"]);
    }

    #[tokio::test]
    async fn test_snapshot_metadata_failure_aborts() {
        let mut reconciler = Reconciler::default();
        reconciler.add_requirement("requests", None).unwrap();

        let err = reconciler
            .compute_snapshot(
                &GroupSelector::Default,
                &pip("requests==2.31.0\n"),
                &FailingMetadata,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Metadata(_)));
    }

    #[tokio::test]
    async fn test_snapshot_of_empty_manifest() {
        let reconciler = Reconciler::default();
        let snapshot = reconciler
            .compute_snapshot(
                &GroupSelector::All,
                &pip("requests==2.31.0\n"),
                &FailingMetadata,
            )
            .await
            .unwrap();
        assert!(snapshot.is_empty());
    }
}
