//! CLI argument parsing module for reqsync

use crate::domain::{is_valid_name, GroupSelector};
use crate::scaffold::Ide;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Group that `--dev` stands for
pub const DEV_GROUP: &str = "dev";

/// Validate a dependency group name given on the command line
fn parse_group_name(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty group name".to_string());
    }
    if !is_valid_name(s) {
        return Err(format!("invalid group name: {}", s));
    }
    Ok(s.to_string())
}

/// Python project environment and dependency manager
#[derive(Parser, Debug, Clone)]
#[command(
    name = "reqsync",
    version,
    about = "Keep pyproject.toml dependencies and requirements snapshots in sync with a virtualenv"
)]
pub struct CliArgs {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Project directory (default: the nearest virtualenv up to two levels above)
    #[arg(short = 'C', long = "project", global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a virtualenv with pyenv and lay out a new project, e.g. `reqsync init . 3.12.1`
    Init(InitArgs),
    /// Install packages and record them in pyproject.toml
    Install(InstallArgs),
    /// Uninstall packages and remove them from pyproject.toml
    Uninstall(UninstallArgs),
    /// Write the installed packages of a group to a requirements file
    Freeze(FreezeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Project directory
    pub dir: PathBuf,

    /// Python version to install (default: newest available)
    pub python: Option<String>,

    /// Generate an IDE configuration file
    #[arg(short, long, value_enum)]
    pub ide: Option<Ide>,
}

#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// Requirements to install; quote specifiers in the shell, e.g. 'requests<3,>=2.19'
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Add packages to the dev group
    #[arg(short, long, conflicts_with = "group")]
    pub dev: bool,

    /// Add packages to an optional dependency group
    #[arg(short, long, value_parser = parse_group_name)]
    pub group: Option<String>,

    /// Only update pyproject.toml, do not run pip
    #[arg(long)]
    pub manifest_only: bool,
}

impl InstallArgs {
    /// Target group name; `None` means the required dependencies
    pub fn group(&self) -> Option<&str> {
        if self.dev {
            Some(DEV_GROUP)
        } else {
            self.group.as_deref()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct UninstallArgs {
    /// Packages to uninstall
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Only update pyproject.toml, do not run pip
    #[arg(long)]
    pub manifest_only: bool,
}

/// Where published package dependencies are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MetadataKind {
    /// Installed distributions in the virtualenv
    #[default]
    Local,
    /// The package index JSON API
    Pypi,
}

#[derive(Args, Debug, Clone)]
pub struct FreezeArgs {
    /// Snapshot the dev group
    #[arg(short, long, conflicts_with_all = ["all", "group"])]
    pub dev: bool,

    /// Snapshot every group
    #[arg(short, long, conflicts_with = "group")]
    pub all: bool,

    /// Snapshot one optional group (default: required dependencies only)
    #[arg(short, long, value_parser = parse_group_name)]
    pub group: Option<String>,

    /// Source of package dependency metadata
    #[arg(long, value_enum, default_value_t = MetadataKind::Local)]
    pub metadata: MetadataKind,

    /// Index JSON API base URL used with `--metadata pypi`
    #[arg(long, env = "REQSYNC_INDEX_URL", value_name = "URL")]
    pub index_url: Option<String>,
}

impl FreezeArgs {
    /// Groups selected by the flags
    pub fn selector(&self) -> GroupSelector {
        if self.all {
            GroupSelector::All
        } else if self.dev {
            GroupSelector::Named(DEV_GROUP.to_string())
        } else {
            GroupSelector::from_name(self.group.as_deref())
        }
    }
}

impl CliArgs {
    /// Default tracing filter directive for the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ALL_GROUPS;
    use clap::Parser;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("reqsync").chain(args.iter().copied()))
    }

    #[test]
    fn test_init_args() {
        let args = parse(&["init", "demo", "3.12.1", "--ide", "vscode"]);
        let Command::Init(init) = args.command else {
            panic!("expected init");
        };
        assert_eq!(init.dir, PathBuf::from("demo"));
        assert_eq!(init.python.as_deref(), Some("3.12.1"));
        assert_eq!(init.ide, Some(Ide::Vscode));
    }

    #[test]
    fn test_init_defaults() {
        let args = parse(&["init", "."]);
        let Command::Init(init) = args.command else {
            panic!("expected init");
        };
        assert!(init.python.is_none());
        assert!(init.ide.is_none());
    }

    #[test]
    fn test_install_args() {
        let args = parse(&["install", "requests<3,>=2.19", "six"]);
        let Command::Install(install) = args.command else {
            panic!("expected install");
        };
        assert_eq!(install.packages, vec!["requests<3,>=2.19", "six"]);
        assert_eq!(install.group(), None);
        assert!(!install.manifest_only);
    }

    #[test]
    fn test_install_dev_and_group() {
        let args = parse(&["install", "-d", "pytest"]);
        let Command::Install(install) = args.command else {
            panic!("expected install");
        };
        assert_eq!(install.group(), Some("dev"));

        let args = parse(&["install", "--group", "docs", "sphinx", "--manifest-only"]);
        let Command::Install(install) = args.command else {
            panic!("expected install");
        };
        assert_eq!(install.group(), Some("docs"));
        assert!(install.manifest_only);
    }

    #[test]
    fn test_install_requires_packages() {
        assert!(CliArgs::try_parse_from(["reqsync", "install"]).is_err());
    }

    #[test]
    fn test_install_dev_conflicts_with_group() {
        let result = CliArgs::try_parse_from(["reqsync", "install", "-d", "-g", "docs", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_group_name() {
        let result = CliArgs::try_parse_from(["reqsync", "install", "-g", "my group", "x"]);
        assert!(result.is_err());
        assert!(parse_group_name("  ").is_err());
        assert_eq!(parse_group_name(" docs ").unwrap(), "docs");
    }

    #[test]
    fn test_uninstall_args() {
        let args = parse(&["uninstall", "-y", "requests"]);
        let Command::Uninstall(uninstall) = args.command else {
            panic!("expected uninstall");
        };
        assert!(uninstall.yes);
        assert_eq!(uninstall.packages, vec!["requests"]);
    }

    #[test]
    fn test_freeze_selector() {
        let selector = |args: &[&str]| {
            let Command::Freeze(freeze) = parse(args).command else {
                panic!("expected freeze");
            };
            freeze.selector()
        };
        assert_eq!(selector(&["freeze"]), GroupSelector::Default);
        assert_eq!(
            selector(&["freeze", "--dev"]),
            GroupSelector::Named("dev".to_string())
        );
        assert_eq!(selector(&["freeze", "-a"]), GroupSelector::All);
        assert_eq!(
            selector(&["freeze", "-g", "docs"]),
            GroupSelector::Named("docs".to_string())
        );
        assert_eq!(selector(&["freeze", "-g", ALL_GROUPS]), GroupSelector::All);
    }

    #[test]
    fn test_freeze_conflicts() {
        assert!(CliArgs::try_parse_from(["reqsync", "freeze", "-a", "-g", "docs"]).is_err());
        assert!(CliArgs::try_parse_from(["reqsync", "freeze", "-d", "-a"]).is_err());
    }

    #[test]
    fn test_freeze_metadata_source() {
        let Command::Freeze(freeze) = parse(&["freeze"]).command else {
            panic!("expected freeze");
        };
        assert_eq!(freeze.metadata, MetadataKind::Local);

        let Command::Freeze(freeze) = parse(&[
            "freeze",
            "--metadata",
            "pypi",
            "--index-url",
            "https://mirror.example/pypi",
        ])
        .command
        else {
            panic!("expected freeze");
        };
        assert_eq!(freeze.metadata, MetadataKind::Pypi);
        assert_eq!(
            freeze.index_url.as_deref(),
            Some("https://mirror.example/pypi")
        );
    }

    #[test]
    fn test_global_flags() {
        let args = parse(&["freeze", "--verbose", "-C", "/work/demo", "--json"]);
        assert!(args.verbose);
        assert!(args.json);
        assert_eq!(args.project, Some(PathBuf::from("/work/demo")));
        assert_eq!(args.log_level(), "debug");

        let args = parse(&["-q", "freeze"]);
        assert!(args.quiet);
        assert_eq!(args.log_level(), "error");

        assert_eq!(parse(&["freeze"]).log_level(), "warn");
    }
}
