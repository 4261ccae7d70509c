//! Duplicate detection by canonical path.

use crate::interpreter::Interpreter;
use std::path::{Component, Path, PathBuf};

/// True if `candidate` names the same executable as an existing interpreter.
///
/// Paths are compared after resolving symlinks, so a binary reached through
/// two PATH entries, or through both the registry and PATH, is registered
/// once.
pub fn already_registered(existing: &[Interpreter], candidate: &Path) -> bool {
    let key = canonical_key(candidate);
    existing
        .iter()
        .any(|interpreter| canonical_key(&interpreter.command) == key)
}

/// The comparison key for a path.
///
/// Falls back to the absolute, lexically normalized path when the file
/// cannot be resolved, e.g. a stale settings entry.
pub fn canonical_key(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::new();
    }
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize_lexically(&absolute)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_same_file_through_dot_segments_is_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let bin = temp_dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let python = bin.join("python3");
        File::create(&python).unwrap();

        let existing = vec![Interpreter::new("Python", &python)];
        let detour = bin.join(".").join("..").join("bin").join("python3");
        assert!(already_registered(&existing, &detour));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_duplicate_of_target() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("python3.12");
        File::create(&target).unwrap();
        let link = temp_dir.path().join("python3");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let existing = vec![Interpreter::new("Python 3.12", &target)];
        assert!(already_registered(&existing, &link));
    }

    #[test]
    fn test_different_files_are_not_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("python3.11");
        let b = temp_dir.path().join("python3.12");
        File::create(&a).unwrap();
        File::create(&b).unwrap();

        let existing = vec![Interpreter::new("Python 3.11", &a)];
        assert!(!already_registered(&existing, &b));
        assert!(!already_registered(&[], &a));
    }

    #[test]
    fn test_missing_paths_compare_lexically() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone").join("python");
        let existing = vec![Interpreter::new("Stale", &missing)];

        assert!(already_registered(
            &existing,
            &temp_dir.path().join("gone").join(".").join("python")
        ));

        let present = temp_dir.path().join("python");
        File::create(&present).unwrap();
        assert!(!already_registered(&existing, &present));
    }

    #[test]
    fn test_empty_command_never_matches_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let python = temp_dir.path().join("python");
        File::create(&python).unwrap();

        let existing = vec![Interpreter::new("Python", PathBuf::new())];
        assert!(!already_registered(&existing, &python));
    }
}
