//! Project layout and template files
//!
//! Creates the source and test directories and the files a new project
//! starts with. Existing files are never overwritten.

use crate::manifest::{atomic_write, create_dir_if_absent, write_if_absent};
use chrono::{Datelike, Local};
use serde_json::json;
use std::fmt;
use std::io;
use std::path::Path;

pub const SRC_DIR: &str = "src";
pub const TEST_DIR: &str = "test";
pub const README_FILE: &str = "README.md";
pub const LICENSE_FILE: &str = "LICENSE";
pub const GITIGNORE_FILE: &str = ".gitignore";
const VSCODE_DIR: &str = ".vscode";
const VSCODE_SETTINGS_FILE: &str = "settings.json";

const README_TEMPLATE: &str = "\
# Example Package

This is a simple example package. You can use
[Github-flavored Markdown](https://guides.github.com/features/mastering-markdown/)
to write your content.
";

const LICENSE_TEMPLATE: &str = "\
MIT License

Copyright (c) {year} {fullname}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
";

const GITIGNORE_TEMPLATE: &str = "\
__pycache__
*.log
*.gz
*.egg-info
.pytest_cache
.python-version
.vscode
pyvenv.cfg
bin
dist
include
lib
lib64
share
";

/// Editors with a generated settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Ide {
    Vscode,
}

/// What happened to one scaffolded path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub name: String,
    pub created: bool,
}

impl FileOutcome {
    fn new(name: impl Into<String>, created: bool) -> Self {
        Self {
            name: name.into(),
            created,
        }
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.created {
            write!(f, "{} created", self.name)
        } else {
            write!(f, "{} already exists, skipping", self.name)
        }
    }
}

/// Login name of the current user, used as author and license holder
pub fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Name of the project rooted at `root`: its directory name
pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn license_text(year: i32, fullname: &str) -> String {
    LICENSE_TEMPLATE
        .replace("{year}", &year.to_string())
        .replace("{fullname}", fullname)
}

fn vscode_settings() -> String {
    let settings = json!({
        "files.exclude": {
            ".vscode": true,
            ".python-version": true,
            ".gitignore": true,
            "pyvenv.cfg": true,
            "**/.pytest_cache": true,
            "**/*.egg-info": true,
            "**/__pycache__": true,
            "**/.git": true
        },
        "python.formatting.provider": "black",
        "python.formatting.blackArgs": ["--skip-string-normalization"],
        "editor.formatOnSave": true,
        "editor.codeActionsOnSave": {
            "source.organizeImports": true
        }
    });
    // json! objects serialize infallibly
    let mut text = serde_json::to_string_pretty(&settings).unwrap_or_default();
    text.push('\n');
    text
}

/// Creates the `src` and `test` directories
pub fn create_directories(root: &Path) -> io::Result<Vec<FileOutcome>> {
    [SRC_DIR, TEST_DIR]
        .iter()
        .map(|dir| Ok(FileOutcome::new(*dir, create_dir_if_absent(&root.join(dir))?)))
        .collect()
}

/// Writes README, LICENSE, .gitignore and the IDE settings when missing
pub fn create_files(root: &Path, author: &str, ide: Option<Ide>) -> io::Result<Vec<FileOutcome>> {
    let year = Local::now().year();
    let mut outcomes = vec![
        FileOutcome::new(
            README_FILE,
            write_if_absent(&root.join(README_FILE), README_TEMPLATE)?,
        ),
        FileOutcome::new(
            LICENSE_FILE,
            write_if_absent(&root.join(LICENSE_FILE), &license_text(year, author))?,
        ),
        FileOutcome::new(
            GITIGNORE_FILE,
            write_if_absent(&root.join(GITIGNORE_FILE), GITIGNORE_TEMPLATE)?,
        ),
    ];

    if ide == Some(Ide::Vscode) {
        let dir = root.join(VSCODE_DIR);
        outcomes.push(FileOutcome::new(VSCODE_DIR, create_dir_if_absent(&dir)?));
        let settings = dir.join(VSCODE_SETTINGS_FILE);
        let created = !settings.exists();
        if created {
            atomic_write(&settings, &vscode_settings())?;
        }
        outcomes.push(FileOutcome::new(VSCODE_SETTINGS_FILE, created));
    }

    Ok(outcomes)
}
