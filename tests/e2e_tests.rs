//! End-to-end tests for the reqsync CLI
//!
//! These tests verify:
//! - Help and argument validation
//! - Virtualenv discovery failures and exit codes
//! - Manifest-only install/uninstall against a real pyproject.toml

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn reqsync() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("reqsync");
    cmd.env_remove("REQSYNC_LOG").env_remove("REQSYNC_INDEX_URL");
    cmd
}

/// A directory that looks like a virtualenv root
fn create_venv_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(
        temp_dir.path().join("pyvenv.cfg"),
        "home = /usr/bin\nversion = 3.12.1\n",
    )
    .unwrap();
    temp_dir
}

#[test]
fn test_help_lists_commands() {
    reqsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("freeze"));
}

#[test]
fn test_version_flag() {
    reqsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("reqsync "));
}

#[test]
fn test_freeze_without_venv_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    reqsync()
        .args(["freeze", "-C"])
        .arg(temp_dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot find virtual environment"));
}

#[test]
fn test_invalid_project_dir_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    reqsync()
        .args(["install", "--manifest-only", "six", "-C"])
        .arg(temp_dir.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_conflicting_freeze_flags() {
    reqsync()
        .args(["freeze", "--all", "--group", "docs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_install_manifest_only() {
    let temp_dir = create_venv_dir();
    reqsync()
        .args(["install", "--manifest-only", "requests>=2.28", "Flask", "-C"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Successfully added requests Flask to dependencies",
        ));

    reqsync()
        .args(["install", "--manifest-only", "-d", "pytest", "-C"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("dev of optional-dependencies"));

    let content = fs::read_to_string(temp_dir.path().join("pyproject.toml")).unwrap();
    let document: toml::Table = toml::from_str(&content).unwrap();
    let project = document["project"].as_table().unwrap();
    let deps: Vec<&str> = project["dependencies"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(deps, vec!["Flask", "requests>=2.28"]);
    assert_eq!(
        project["optional-dependencies"]["dev"][0].as_str(),
        Some("pytest")
    );
    assert_eq!(
        document["build-system"]["build-backend"].as_str(),
        Some("setuptools.build_meta")
    );
}

#[test]
fn test_install_from_nested_dir() {
    let temp_dir = create_venv_dir();
    let nested = temp_dir.path().join("src").join("pkg");
    fs::create_dir_all(&nested).unwrap();

    reqsync()
        .current_dir(&nested)
        .args(["-q", "install", "--manifest-only", "six"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(temp_dir.path().join("pyproject.toml").is_file());
    assert!(!nested.join("pyproject.toml").exists());
}

#[test]
fn test_install_malformed_requirement() {
    let temp_dir = create_venv_dir();
    reqsync()
        .args(["install", "--manifest-only", "six", "bad[", "-C"])
        .arg(temp_dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("malformed requirement 'bad['"));

    assert!(!temp_dir.path().join("pyproject.toml").exists());
}

#[test]
fn test_install_reserved_group() {
    let temp_dir = create_venv_dir();
    reqsync()
        .args(["install", "--manifest-only", "-g", "all", "six", "-C"])
        .arg(temp_dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reserved group name"));
}

#[test]
fn test_uninstall_manifest_only() {
    let temp_dir = create_venv_dir();
    fs::write(
        temp_dir.path().join("pyproject.toml"),
        "[project]\nname = \"demo\"\ndependencies = [\"requests\", \"six\"]\n\n\
         [project.optional-dependencies]\ndev = [\"six\"]\n",
    )
    .unwrap();

    reqsync()
        .args(["uninstall", "-y", "--manifest-only", "six", "-C"])
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully removed six"));

    let content = fs::read_to_string(temp_dir.path().join("pyproject.toml")).unwrap();
    let document: toml::Table = toml::from_str(&content).unwrap();
    let project = document["project"].as_table().unwrap();
    assert_eq!(project["dependencies"].as_array().unwrap().len(), 1);
    assert!(project["optional-dependencies"].get("dev").is_none());
}

#[test]
fn test_uninstall_declined() {
    let temp_dir = create_venv_dir();
    fs::write(
        temp_dir.path().join("pyproject.toml"),
        "[project]\nname = \"demo\"\ndependencies = [\"six\"]\n",
    )
    .unwrap();

    reqsync()
        .args(["uninstall", "--manifest-only", "six", "-C"])
        .arg(temp_dir.path())
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Do you want to remove six?"));

    let content = fs::read_to_string(temp_dir.path().join("pyproject.toml")).unwrap();
    assert!(content.contains("six"));
}

#[test]
fn test_install_json_output() {
    let temp_dir = create_venv_dir();
    let output = reqsync()
        .args(["--json", "install", "--manifest-only", "-g", "docs", "sphinx", "-C"])
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["group"], "docs");
    assert_eq!(json["added"][0], "sphinx");
}
