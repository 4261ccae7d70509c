//! Platform-specific path utilities.
//!
//! Provides the settings location and the PATH primitives used by discovery:
//! enumerating PATH directories and searching them for a named executable.

use crate::config::AppConfig;
use crate::error::{PyterpError, Result};
use crate::platform::permissions::is_executable;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Append the platform executable suffix to a program name.
///
/// # Platform Behavior
/// - **Linux/macOS**: unchanged (`python`)
/// - **Windows**: `.exe` appended (`python.exe`)
pub fn with_executable_suffix(name: &str) -> String {
    #[cfg(windows)]
    {
        format!("{name}.exe")
    }
    #[cfg(not(windows))]
    {
        name.to_string()
    }
}

/// Get the pyterp configuration directory.
///
/// # Platform Behavior
/// - **Linux**: `~/.config/pyterp` (XDG_CONFIG_HOME)
/// - **Windows**: `%APPDATA%\pyterp`
/// - **macOS**: `~/Library/Application Support/pyterp`
pub fn pyterp_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| PyterpError::Config {
        message: "Could not determine platform config directory".to_string(),
    })?;
    Ok(config_dir.join(AppConfig::APP_CONFIG_DIR_NAME))
}

/// Get the default settings file.
///
/// Returns `{pyterp_config_dir}/settings.json`.
pub fn default_settings_path() -> Result<PathBuf> {
    Ok(pyterp_config_dir()?.join(AppConfig::SETTINGS_FILENAME))
}

/// An ordered list of directories searched for executables.
///
/// Usually built from the `PATH` environment variable; tests construct one
/// explicitly so discovery never depends on the machine running them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs
                .into_iter()
                .map(Into::into)
                .filter(|dir: &PathBuf| !dir.as_os_str().is_empty())
                .collect(),
        }
    }

    /// Directories from the process `PATH` variable.
    pub fn from_env() -> Self {
        Self::from_path_var(std::env::var_os("PATH").as_deref())
    }

    /// Directories from a raw `PATH`-style value.
    pub fn from_path_var(value: Option<&OsStr>) -> Self {
        match value {
            Some(value) => Self::new(std::env::split_paths(value)),
            None => Self::default(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// First executable named `name` (plus the platform suffix) on the path.
    pub fn search(&self, name: &str) -> Option<PathBuf> {
        let file_name = with_executable_suffix(name);
        self.dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| is_executable_file(candidate))
    }

    /// Every executable named `name` on the path, in PATH order.
    pub fn find_all(&self, name: &str) -> Vec<PathBuf> {
        let file_name = with_executable_suffix(name);
        let mut found: Vec<PathBuf> = Vec::new();
        for candidate in self.dirs.iter().map(|dir| dir.join(&file_name)) {
            if is_executable_file(&candidate) && !found.contains(&candidate) {
                found.push(candidate);
            }
        }
        found
    }
}

fn is_executable_file(path: &Path) -> bool {
    path.is_file() && is_executable(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::permissions::set_executable;
    use std::fs::File;
    use tempfile::TempDir;

    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(with_executable_suffix(name));
        File::create(&path).unwrap();
        set_executable(&path).unwrap();
        path
    }

    #[test]
    fn test_default_settings_path_ends_with_settings_json() {
        // Hosts without a home directory have no config dir.
        if let Ok(path) = default_settings_path() {
            assert!(path.ends_with("pyterp/settings.json"), "{path:?}");
        }
    }

    #[test]
    fn test_from_path_var_skips_empty_entries() {
        let joined = std::env::join_paths([
            PathBuf::from("/usr/local/bin"),
            PathBuf::new(),
            PathBuf::from("/usr/bin"),
        ])
        .unwrap();
        let search = SearchPath::from_path_var(Some(&joined));
        assert_eq!(
            search.dirs(),
            &[PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")]
        );
        assert!(SearchPath::from_path_var(None).dirs().is_empty());
    }

    #[test]
    fn test_search_returns_first_match() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        make_executable(second.path(), "python");
        let expected = make_executable(first.path(), "python");

        let search = SearchPath::new([first.path(), second.path()]);
        assert_eq!(search.search("python"), Some(expected));
        assert_eq!(search.search("ruby"), None);
    }

    #[test]
    fn test_find_all_keeps_path_order_without_repeats() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let a = make_executable(first.path(), "python");
        let b = make_executable(second.path(), "python");

        let search = SearchPath::new([first.path(), second.path(), first.path()]);
        assert_eq!(search.find_all("python"), vec![a, b]);
    }

    #[cfg(unix)]
    #[test]
    fn test_search_ignores_non_executable_files() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("python")).unwrap();
        let search = SearchPath::new([dir.path()]);
        assert_eq!(search.search("python"), None);
    }
}
