//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Step-by-step init output with created and skipped files
//! - Install/uninstall confirmation lines naming the target group
//! - Snapshot location, and its packages in verbose mode

use crate::domain::GroupSelector;
use crate::output::{OutputFormatter, Verbosity};
use crate::project::{FreezeReport, InitReport, InstallReport, UninstallReport};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_color(verbosity, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn success(&self, message: &str) -> String {
        if self.color {
            message.green().to_string()
        } else {
            message.to_string()
        }
    }

    fn heading(&self, message: &str) -> String {
        if self.color {
            message.bold().to_string()
        } else {
            message.to_string()
        }
    }

    fn dimmed(&self, message: &str) -> String {
        if self.color {
            message.dimmed().to_string()
        } else {
            message.to_string()
        }
    }

    /// Where packages were recorded, e.g. `dev of optional-dependencies`
    fn target(group: &GroupSelector) -> String {
        match group.name() {
            Some(name) => format!("{} of optional-dependencies", name),
            None => "dependencies".to_string(),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_init(&self, report: &InitReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        writeln!(writer, "{}", self.heading(&format!("Using {}", report.pyenv)))?;
        writeln!(writer, "Working on {}", report.root.display())?;
        writeln!(
            writer,
            "Preparing project environment with python {}",
            report.python
        )?;
        for file in &report.files {
            let line = format!("    {}", file);
            if file.created {
                writeln!(writer, "{}", line)?;
            } else {
                writeln!(writer, "{}", self.dimmed(&line))?;
            }
        }
        writeln!(
            writer,
            "{}",
            self.success("Successfully initialized virtual environment")
        )
    }

    fn format_install(
        &self,
        report: &InstallReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        if self.verbosity == Verbosity::Verbose {
            for requirement in &report.added {
                writeln!(writer, "  {}", requirement)?;
            }
        }
        let names: Vec<String> = report.added.iter().map(|r| r.name.to_string()).collect();
        writeln!(
            writer,
            "{}",
            self.success(&format!(
                "Successfully added {} to {}",
                names.join(" "),
                Self::target(&report.group)
            ))
        )
    }

    fn format_uninstall(
        &self,
        report: &UninstallReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        for name in &report.undeclared {
            writeln!(
                writer,
                "  {}",
                self.dimmed(&format!("{} (not declared in pyproject.toml)", name))
            )?;
        }
        if report.removed.is_empty() {
            return writeln!(writer, "No dependencies removed");
        }
        writeln!(
            writer,
            "{}",
            self.success(&format!(
                "Successfully removed {} from dependencies",
                report.removed.join(" ")
            ))
        )
    }

    fn format_freeze(&self, report: &FreezeReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        let file_name = report
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(writer, "Creating snapshot to {}", file_name)?;
        if self.verbosity == Verbosity::Verbose {
            for package in &report.packages {
                writeln!(writer, "  {}", package)?;
            }
        }
        writeln!(
            writer,
            "{}",
            self.success(&format!(
                "Done! {} packages in {} snapshot",
                report.packages.len(),
                report.group
            ))
        )
    }
}
