//! Project workflows
//!
//! This module provides:
//! - Loading and saving the project manifest around a reconciler
//! - Environment bootstrap (pyenv interpreter, venv, scaffold)
//! - install / uninstall / freeze as used by the command line

use crate::domain::{GroupSelector, Requirement, ALL_GROUPS};
use crate::environment::{
    create_venv, has_venv, pyenv_available_versions, pyenv_version, requires_python,
    select_python, PackageManager,
};
use crate::error::{AppError, EnvironmentError, ManifestError, ReconcileError};
use crate::manifest::{
    atomic_write, ensure_defaults, read_manifest, set_requires_python, write_manifest,
    ManifestStore, PyprojectToml, PYPROJECT_FILE,
};
use crate::progress::Progress;
use crate::reconciler::Reconciler;
use crate::registry::MetadataSource;
use crate::scaffold::{self, FileOutcome, Ide};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;
use tracing::{info, warn};

/// Result of `init`
#[derive(Debug)]
pub struct InitReport {
    pub root: PathBuf,
    /// `pyenv --version` output
    pub pyenv: String,
    pub python: String,
    pub files: Vec<FileOutcome>,
}

/// Result of `install`
#[derive(Debug)]
pub struct InstallReport {
    pub added: Vec<Requirement>,
    pub group: GroupSelector,
}

/// Result of `uninstall`
#[derive(Debug, Default)]
pub struct UninstallReport {
    /// Packages removed from the manifest
    pub removed: Vec<String>,
    /// Packages that were not declared in any group
    pub undeclared: Vec<String>,
}

/// Result of `freeze`
#[derive(Debug)]
pub struct FreezeReport {
    pub path: PathBuf,
    pub group: GroupSelector,
    pub packages: Vec<Requirement>,
}

/// A project directory with its loaded manifest
pub struct Project<S: ManifestStore = PyprojectToml> {
    root: PathBuf,
    store: S,
    document: DocumentMut,
    reconciler: Reconciler,
    show_progress: bool,
}

impl Project<PyprojectToml> {
    /// Opens the project at `root`, backed by its pyproject.toml
    pub fn open(root: &Path) -> Result<Self, AppError> {
        Self::with_store(root, PyprojectToml::new(root))
    }
}

impl<S: ManifestStore> Project<S> {
    /// Opens the project at `root` with a custom manifest store
    ///
    /// A missing manifest starts from the template, and the keys the tool
    /// relies on are filled in.
    pub fn with_store(root: &Path, store: S) -> Result<Self, AppError> {
        let mut document = store.load()?;
        ensure_defaults(
            &mut document,
            &scaffold::project_name(root),
            &scaffold::current_user(),
        );
        let manifest = read_manifest(&document)?;

        Ok(Self {
            root: root.to_path_buf(),
            store,
            document,
            reconciler: Reconciler::new(manifest),
            show_progress: false,
        })
    }

    /// Enable spinners for long-running steps
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn document(&self) -> &DocumentMut {
        &self.document
    }

    /// Writes the dependency groups back to the manifest store
    pub fn save(&mut self) -> Result<(), ManifestError> {
        write_manifest(&mut self.document, self.reconciler.manifest());
        self.store.save(&self.document)
    }

    /// Records the interpreter, creates the layout and writes the manifest
    pub fn scaffold(
        &mut self,
        python: &str,
        ide: Option<Ide>,
    ) -> Result<Vec<FileOutcome>, AppError> {
        if let Some(requires) = requires_python(python) {
            set_requires_python(&mut self.document, &requires);
        }

        let io_error = |e| ManifestError::write_error(&self.root, e);
        let mut outcomes = scaffold::create_directories(&self.root).map_err(io_error)?;
        self.save()?;
        outcomes.push(FileOutcome {
            name: PYPROJECT_FILE.to_string(),
            created: true,
        });

        let author = scaffold::current_user();
        let io_error = |e| ManifestError::write_error(&self.root, e);
        outcomes.extend(scaffold::create_files(&self.root, &author, ide).map_err(io_error)?);
        Ok(outcomes)
    }

    /// Installs packages and records them in a dependency group
    ///
    /// Every package is parsed before anything is installed. Without a
    /// package manager only the manifest is updated. The manifest is saved
    /// even when a later package fails, so the packages installed before
    /// the failure stay recorded.
    pub async fn install(
        &mut self,
        packages: &[String],
        group: Option<&str>,
        pip: Option<&dyn PackageManager>,
    ) -> Result<InstallReport, AppError> {
        for text in packages {
            Requirement::parse(text)?;
        }
        let selector = GroupSelector::from_name(group);
        if selector == GroupSelector::All {
            return Err(ReconcileError::ReservedGroup {
                name: ALL_GROUPS.to_string(),
            }
            .into());
        }

        let mut added = Vec::new();
        let mut failure = None;
        for text in packages {
            if let Some(pip) = pip {
                let mut progress = Progress::new(self.show_progress);
                progress.spinner(&format!("Installing {}...", text));
                let result = pip.install(text).await;
                progress.finish_and_clear();
                if let Err(e) = result {
                    failure = Some(AppError::from(e));
                    break;
                }
            }
            match self.reconciler.add_requirement(text, group) {
                Ok(requirement) => {
                    info!(package = %requirement, group = %selector, "recorded dependency");
                    added.push(requirement);
                }
                Err(e) => {
                    failure = Some(e.into());
                    break;
                }
            }
        }

        self.save()?;
        if let Some(err) = failure {
            if !added.is_empty() {
                warn!(count = added.len(), "saved dependencies recorded before the failure");
            }
            return Err(err);
        }

        Ok(InstallReport {
            added,
            group: selector,
        })
    }

    /// Uninstalls packages and removes them from every dependency group
    pub async fn uninstall(
        &mut self,
        packages: &[String],
        pip: Option<&dyn PackageManager>,
    ) -> Result<UninstallReport, AppError> {
        let requirements = packages
            .iter()
            .map(|text| Requirement::parse(text))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = UninstallReport::default();
        let mut failure = None;
        for (text, requirement) in packages.iter().zip(&requirements) {
            if let Some(pip) = pip {
                let mut progress = Progress::new(self.show_progress);
                progress.spinner(&format!("Uninstalling {}...", requirement.name));
                let result = pip.uninstall(requirement.name.as_str()).await;
                progress.finish_and_clear();
                if let Err(e) = result {
                    failure = Some(AppError::from(e));
                    break;
                }
            }
            let name = requirement.name.to_string();
            match self.reconciler.remove_requirement(text) {
                Ok(true) => report.removed.push(name),
                Ok(false) => {
                    warn!(package = %name, "package is not declared in any group");
                    report.undeclared.push(name);
                }
                Err(e) => {
                    failure = Some(e.into());
                    break;
                }
            }
        }

        self.save()?;
        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Writes the installed packages of a group to its requirements file
    pub async fn freeze(
        &self,
        group: &GroupSelector,
        pip: &dyn PackageManager,
        metadata: &dyn MetadataSource,
    ) -> Result<FreezeReport, AppError> {
        let mut progress = Progress::new(self.show_progress);
        progress.spinner(&format!(
            "Reading package metadata from {}...",
            metadata.source_name()
        ));
        let snapshot = self.reconciler.compute_snapshot(group, pip, metadata).await;
        progress.finish_and_clear();
        let packages = snapshot?;

        let path = self.root.join(group.requirements_file());
        let mut content = packages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        atomic_write(&path, &content).map_err(|e| ManifestError::write_error(&path, e))?;
        info!(path = %path.display(), packages = packages.len(), "wrote snapshot");

        Ok(FreezeReport {
            path,
            group: group.clone(),
            packages,
        })
    }
}

/// Bootstraps a new project: interpreter, venv, layout and manifest
pub async fn init(
    root: &Path,
    python: Option<&str>,
    ide: Option<Ide>,
    show_progress: bool,
) -> Result<InitReport, AppError> {
    let pyenv = pyenv_version(Path::new("."))
        .await
        .ok_or_else(|| EnvironmentError::CommandNotFound {
            program: "pyenv".to_string(),
        })?;

    if has_venv(root) {
        return Err(EnvironmentError::VenvExists {
            path: root.to_path_buf(),
        }
        .into());
    }
    fs::create_dir_all(root).map_err(|e| EnvironmentError::io(root, e))?;

    let mut progress = Progress::new(show_progress);
    progress.spinner("Listing available python versions...");
    let available = pyenv_available_versions(root).await;
    progress.finish_and_clear();
    let python = select_python(&available?, python).ok_or(EnvironmentError::NoPythonVersion)?;

    progress.spinner(&format!("Preparing project environment with python {}...", python));
    let created = create_venv(root, &python).await;
    progress.finish_and_clear();
    created?;

    let mut project = Project::open(root)?.with_progress(show_progress);
    let files = project.scaffold(&python, ide)?;

    Ok(InitReport {
        root: root.to_path_buf(),
        pyenv,
        python,
        files,
    })
}
