//! reqsync - Python project environment and dependency manager CLI tool
//!
//! Keeps the dependencies declared in pyproject.toml in step with what is
//! installed in the project virtualenv:
//! - init: pyenv interpreter, virtualenv and project layout
//! - install / uninstall: pip plus manifest bookkeeping
//! - freeze: requirements snapshots of dependency groups

use clap::Parser;
use colored::Colorize;
use reqsync::cli::{CliArgs, Command, FreezeArgs, InstallArgs, MetadataKind, UninstallArgs};
use reqsync::environment::{find_venv_root, PackageManager, SystemPip};
use reqsync::error::{ConfigError, EnvironmentError};
use reqsync::output::{create_formatter, OutputConfig, OutputFormatter};
use reqsync::project::{self, Project};
use reqsync::registry::{HttpClient, MetadataSource, PyPiMetadata, SitePackages};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter that overrides the flags
const LOG_ENV: &str = "REQSYNC_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &CliArgs) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<()> {
    let formatter = create_formatter(OutputConfig::from_cli(args.json, args.verbose, args.quiet));
    let show_progress = !args.quiet && !args.json;

    match &args.command {
        Command::Init(init) => {
            let root = match &args.project {
                Some(base) => base.join(&init.dir),
                None => init.dir.clone(),
            };
            let report =
                project::init(&root, init.python.as_deref(), init.ide, show_progress).await?;
            formatter.format_init(&report, &mut io::stdout().lock())?;
        }
        Command::Install(install) => {
            let root = locate_project(args.project.as_deref())?;
            cmd_install(&root, install, formatter.as_ref(), show_progress).await?;
        }
        Command::Uninstall(uninstall) => {
            let root = locate_project(args.project.as_deref())?;
            cmd_uninstall(&root, uninstall, formatter.as_ref(), show_progress).await?;
        }
        Command::Freeze(freeze) => {
            let root = locate_project(args.project.as_deref())?;
            cmd_freeze(&root, freeze, formatter.as_ref(), show_progress).await?;
        }
    }

    Ok(())
}

/// Finds the virtualenv root from `-C` or the working directory
fn locate_project(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    let start = match explicit {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(ConfigError::InvalidPath {
                    path: dir.to_path_buf(),
                    message: "not a directory".to_string(),
                }
                .into());
            }
            dir.to_path_buf()
        }
        None => std::env::current_dir()?,
    };

    let root = find_venv_root(&start).ok_or(EnvironmentError::VenvNotFound { path: start })?;
    info!(root = %root.display(), "working on project");
    Ok(root)
}

async fn cmd_install(
    root: &Path,
    args: &InstallArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> anyhow::Result<()> {
    let mut project = Project::open(root)?.with_progress(show_progress);
    let pip = SystemPip::new(root);
    let pip = (!args.manifest_only).then_some(&pip as &dyn PackageManager);

    let report = project.install(&args.packages, args.group(), pip).await?;
    formatter.format_install(&report, &mut io::stdout().lock())?;
    Ok(())
}

async fn cmd_uninstall(
    root: &Path,
    args: &UninstallArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> anyhow::Result<()> {
    if !args.yes && !confirm(&format!("Do you want to remove {}?", args.packages.join(" ")))? {
        return Ok(());
    }

    let mut project = Project::open(root)?.with_progress(show_progress);
    let pip = SystemPip::new(root);
    let pip = (!args.manifest_only).then_some(&pip as &dyn PackageManager);

    let report = project.uninstall(&args.packages, pip).await?;
    formatter.format_uninstall(&report, &mut io::stdout().lock())?;
    Ok(())
}

async fn cmd_freeze(
    root: &Path,
    args: &FreezeArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> anyhow::Result<()> {
    let metadata: Box<dyn MetadataSource> = match args.metadata {
        MetadataKind::Local => Box::new(SitePackages::new(root)),
        MetadataKind::Pypi => {
            let client = HttpClient::new()?;
            Box::new(match &args.index_url {
                Some(url) => PyPiMetadata::with_base_url(client, url),
                None => PyPiMetadata::new(client),
            })
        }
    };

    let project = Project::open(root)?.with_progress(show_progress);
    let pip = SystemPip::new(root);
    let report = project
        .freeze(&args.selector(), &pip, metadata.as_ref())
        .await?;
    formatter.format_freeze(&report, &mut io::stdout().lock())?;
    Ok(())
}

/// Asks a yes/no question on stderr; anything but `y`/`yes` declines
fn confirm(question: &str) -> io::Result<bool> {
    eprint!("{} [y/N] ", question);
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
