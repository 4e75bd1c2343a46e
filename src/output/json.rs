//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of command results
//! - Requirements rendered in their canonical text form

use crate::output::{OutputFormatter, Verbosity};
use crate::project::{FreezeReport, InitReport, InstallReport, UninstallReport};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn write<T: Serialize>(&self, value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

/// JSON representation of one scaffolded path
#[derive(Serialize)]
struct JsonFile<'a> {
    name: &'a str,
    created: bool,
}

/// JSON representation of an init result
#[derive(Serialize)]
struct JsonInit<'a> {
    root: String,
    python: &'a str,
    files: Vec<JsonFile<'a>>,
}

/// JSON representation of an install result
#[derive(Serialize)]
struct JsonInstall {
    /// Group name, absent for required dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    added: Vec<String>,
}

/// JSON representation of an uninstall result
#[derive(Serialize)]
struct JsonUninstall {
    removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    undeclared: Vec<String>,
}

/// JSON representation of a freeze result
#[derive(Serialize)]
struct JsonFreeze {
    path: String,
    group: String,
    count: usize,
    /// Snapshot lines (omitted in quiet mode)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    packages: Vec<String>,
}

impl OutputFormatter for JsonFormatter {
    fn format_init(&self, report: &InitReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonInit {
            root: report.root.display().to_string(),
            python: &report.python,
            files: report
                .files
                .iter()
                .map(|file| JsonFile {
                    name: &file.name,
                    created: file.created,
                })
                .collect(),
        };
        self.write(&output, writer)
    }

    fn format_install(
        &self,
        report: &InstallReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonInstall {
            group: report.group.name().map(str::to_string),
            added: report.added.iter().map(ToString::to_string).collect(),
        };
        self.write(&output, writer)
    }

    fn format_uninstall(
        &self,
        report: &UninstallReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonUninstall {
            removed: report.removed.clone(),
            undeclared: report.undeclared.clone(),
        };
        self.write(&output, writer)
    }

    fn format_freeze(&self, report: &FreezeReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let packages = if self.verbosity == Verbosity::Quiet {
            Vec::new()
        } else {
            report.packages.iter().map(ToString::to_string).collect()
        };
        let output = JsonFreeze {
            path: report.path.display().to_string(),
            group: report.group.to_string(),
            count: report.packages.len(),
            packages,
        };
        self.write(&output, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GroupSelector, Requirement};
    use std::path::PathBuf;

    fn to_json(output: Vec<u8>) -> serde_json::Value {
        serde_json::from_slice(&output).unwrap()
    }

    fn freeze_report() -> FreezeReport {
        FreezeReport {
            path: PathBuf::from("/work/demo/requirements.txt"),
            group: GroupSelector::Default,
            packages: vec![Requirement::parse("requests==2.31.0").unwrap()],
        }
    }

    #[test]
    fn test_format_freeze() {
        let formatter = JsonFormatter::new(Verbosity::Normal);
        let mut output = Vec::new();
        formatter.format_freeze(&freeze_report(), &mut output).unwrap();

        let json = to_json(output);
        assert_eq!(json["group"], "main");
        assert_eq!(json["count"], 1);
        assert_eq!(json["packages"][0], "requests==2.31.0");
    }

    #[test]
    fn test_format_freeze_quiet() {
        let formatter = JsonFormatter::new(Verbosity::Quiet);
        let mut output = Vec::new();
        formatter.format_freeze(&freeze_report(), &mut output).unwrap();

        let json = to_json(output);
        assert_eq!(json["count"], 1);
        assert!(json.get("packages").is_none());
    }

    #[test]
    fn test_format_install() {
        let formatter = JsonFormatter::new(Verbosity::Normal);
        let report = InstallReport {
            added: vec![Requirement::parse("pytest>=8").unwrap()],
            group: GroupSelector::Named("dev".to_string()),
        };
        let mut output = Vec::new();
        formatter.format_install(&report, &mut output).unwrap();

        let json = to_json(output);
        assert_eq!(json["group"], "dev");
        assert_eq!(json["added"][0], "pytest>=8");
    }

    #[test]
    fn test_format_install_default_group() {
        let formatter = JsonFormatter::new(Verbosity::Normal);
        let report = InstallReport {
            added: Vec::new(),
            group: GroupSelector::Default,
        };
        let mut output = Vec::new();
        formatter.format_install(&report, &mut output).unwrap();
        assert!(to_json(output).get("group").is_none());
    }

    #[test]
    fn test_format_uninstall() {
        let formatter = JsonFormatter::new(Verbosity::Normal);
        let report = UninstallReport {
            removed: vec!["requests".to_string()],
            undeclared: Vec::new(),
        };
        let mut output = Vec::new();
        formatter.format_uninstall(&report, &mut output).unwrap();

        let json = to_json(output);
        assert_eq!(json["removed"][0], "requests");
        assert!(json.get("undeclared").is_none());
    }
}
