use blkinfo_core::{BlkError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Canonical, symlink-free absolute form of `path` (POSIX `realpath`).
pub fn resolve_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(BlkError::InvalidArgument("a path is not given".to_string()));
    }
    fs::canonicalize(path).map_err(|err| BlkError::from_io(path, err))
}

pub(crate) fn read_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map(|value| value.trim().to_string())
        .map_err(|err| BlkError::from_io(path, err))
}

pub(crate) fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let text = read_string(path)?;
    if text.is_empty() {
        return Ok(Vec::new());
    }
    Ok(text.lines().map(str::to_string).collect())
}

/// Sorted entry names of a directory; a missing directory yields no names.
pub(crate) fn list_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(BlkError::from_io(path, err)),
    };
    sorted_names(path, entries)
}

/// Sorted entry names of a directory that must exist.
pub(crate) fn list_names_required(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let entries = fs::read_dir(path).map_err(|err| BlkError::from_io(path, err))?;
    sorted_names(path, entries)
}

fn sorted_names(path: &Path, entries: fs::ReadDir) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| BlkError::from_io(path, err))?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_path() {
        assert!(matches!(
            resolve_path(""),
            Err(BlkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolves_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::write(root.join("sda1"), "").unwrap();
        fs::create_dir(root.join("by-uuid")).unwrap();
        std::os::unix::fs::symlink("../sda1", root.join("by-uuid/abcd")).unwrap();

        let resolved = resolve_path(root.join("by-uuid/abcd")).unwrap();
        assert_eq!(resolved, root.join("sda1"));
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_path(dir.path().join("nope/sda")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_names(dir.path().join("holders")).unwrap().is_empty());
        assert!(list_names_required(dir.path().join("holders"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn lists_sorted_and_reads_trimmed_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sdb")).unwrap();
        fs::create_dir(dir.path().join("sda")).unwrap();
        fs::write(dir.path().join("uevent"), "MAJOR=8\nMINOR=0\n\n").unwrap();
        fs::write(dir.path().join("empty"), "\n").unwrap();

        assert_eq!(list_names(dir.path()).unwrap(), vec!["empty", "sda", "sdb", "uevent"]);
        assert_eq!(
            read_lines(dir.path().join("uevent")).unwrap(),
            vec!["MAJOR=8", "MINOR=0"]
        );
        assert!(read_lines(dir.path().join("empty")).unwrap().is_empty());
    }
}
