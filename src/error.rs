//! Application error types using thiserror
//!
//! Error hierarchy:
//! - RequirementError: Unparseable requirement text
//! - MetadataError: A package's own metadata could not be read
//! - ReconcileError: Failures of dependency group mutation and snapshots
//! - ManifestError: Issues with pyproject.toml reading, parsing and writing
//! - EnvironmentError: Failures invoking pip, pyenv or python
//! - RegistryError: Issues with the package index HTTP API
//! - ConfigError: Issues with CLI configuration

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Dependency reconciliation errors
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Virtual environment and process errors
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RequirementError> for AppError {
    fn from(err: RequirementError) -> Self {
        AppError::Reconcile(ReconcileError::Requirement(err))
    }
}

impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        AppError::Reconcile(ReconcileError::Metadata(err))
    }
}

/// A requirement string that does not follow the dependency specifier grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("malformed requirement '{input}': {message}")]
    Malformed { input: String, message: String },
}

/// Errors raised while reading a package's published dependencies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata unavailable for package '{package}': {message}")]
    Unavailable { package: String, message: String },
}

/// Errors of the dependency reconciler
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Requirement(#[from] RequirementError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The installed package listing could not be produced
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// Group names that cannot receive requirements
    #[error("'{name}' is a reserved group name and cannot hold dependencies")]
    ReservedGroup { name: String },
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse TOML in {path}: {message}")]
    TomlParseError { path: PathBuf, message: String },

    /// A dependency group holds something other than requirement strings
    #[error("invalid entry in {section}: {message}")]
    InvalidEntry { section: String, message: String },

    /// A dependency group entry failed to parse
    #[error("invalid requirement in {section}: {source}")]
    InvalidRequirement {
        section: String,
        #[source]
        source: RequirementError,
    },
}

/// Errors related to the virtual environment and external tools
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// Executable not found on PATH or in the virtualenv
    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    /// Command exited unsuccessfully
    #[error("command '{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Command could not be spawned
    #[error("failed to run '{command}': {source}")]
    SpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// No pyvenv.cfg near the working directory
    #[error("cannot find virtual environment from {path}, run `reqsync init <dir>` first")]
    VenvNotFound { path: PathBuf },

    /// init called on a directory that already holds a venv
    #[error("project environment already exists at {path}")]
    VenvExists { path: PathBuf },

    /// pyenv lists no usable interpreter
    #[error("cannot find an installable python version")]
    NoPythonVersion,

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to package index communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid path
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: PathBuf, message: String },
}

impl RequirementError {
    /// Creates a new Malformed error
    pub fn malformed(input: impl Into<String>, message: impl Into<String>) -> Self {
        RequirementError::Malformed {
            input: input.into(),
            message: message.into(),
        }
    }
}

impl MetadataError {
    /// Creates a new Unavailable error
    pub fn unavailable(package: impl Into<String>, message: impl Into<String>) -> Self {
        MetadataError::Unavailable {
            package: package.into(),
            message: message.into(),
        }
    }
}

impl ManifestError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new TomlParseError
    pub fn toml_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::TomlParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl EnvironmentError {
    /// Creates a new Io error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EnvironmentError::Io {
            path: path.into(),
            source,
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }
}
