//! Atomic file writing
//!
//! Every file the tool produces (pyproject.toml, requirements snapshots,
//! scaffolding templates) goes through a temp file in the target directory
//! that is renamed over the destination, so readers never see a half-written
//! file. A replaced file keeps its permissions; a new file gets the same
//! mode a plain create would give it.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Writes `content` to `path` atomically, creating parent directories
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let existing = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let mut tmp = temp_file_in(dir)?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Temp file created with the default file mode (0666 minus umask)
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    Builder::new()
        .prefix(".reqsync")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new().prefix(".reqsync").tempfile_in(dir)
}

/// Writes `content` only if `path` does not exist yet
///
/// Returns false when the file was left untouched.
pub fn write_if_absent(path: &Path, content: &str) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, content)?;
    Ok(true)
}

/// Creates `path` as a directory if missing
///
/// Returns false when the directory already existed.
pub fn create_dir_if_absent(path: &Path) -> io::Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requirements.txt");

        atomic_write(&path, "a==1.0\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a==1.0\n");

        atomic_write(&path, "b==2.0\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "b==2.0\n");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".vscode").join("settings.json");
        atomic_write(&path, "{}").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        atomic_write(&dir.path().join("out.txt"), "x").unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pyproject.toml");
        fs::write(&path, "[project]\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        atomic_write(&path, "[project]\nname = \"demo\"\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_gets_default_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain.txt");
        fs::write(&plain, "x").unwrap();
        let expected = fs::metadata(&plain).unwrap().permissions().mode() & 0o777;

        let readme = dir.path().join("README.md");
        assert!(write_if_absent(&readme, "# demo\n").unwrap());
        let mode = fs::metadata(&readme).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, expected);
    }

    #[test]
    fn test_write_if_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("README.md");

        assert!(write_if_absent(&path, "first").unwrap());
        assert!(!write_if_absent(&path, "second").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_create_dir_if_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("src");

        assert!(create_dir_if_absent(&path).unwrap());
        assert!(!create_dir_if_absent(&path).unwrap());
        assert!(path.is_dir());
    }
}
