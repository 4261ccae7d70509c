//! Platform-specific executable checks.

use crate::error::{PyterpError, Result};
use std::path::Path;
use tracing::debug;

/// Make a file executable.
///
/// # Platform Behavior
/// - **Linux/macOS**: Sets mode 0o755
/// - **Windows**: No-op (executability is determined by file extension)
pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata =
            std::fs::metadata(path).map_err(|e| PyterpError::io_with_path(e, path))?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| PyterpError::io_with_path(e, path))?;
        debug!("Set executable permissions on: {}", path.display());
    }

    #[cfg(not(unix))]
    {
        if !path.exists() {
            return Err(PyterpError::io_with_path(
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                path,
            ));
        }
        debug!("Skipping executable bit for: {}", path.display());
    }

    Ok(())
}

/// Check if a file can be executed.
///
/// # Platform Behavior
/// - **Linux/macOS**: Any execute bit is set
/// - **Windows**: The extension is one of .exe, .bat, .cmd, .com
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                matches!(ext.as_str(), "exe" | "bat" | "cmd" | "com")
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_set_executable() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("python3");
        File::create(&file_path).unwrap();

        set_executable(&file_path).unwrap();

        #[cfg(unix)]
        assert!(is_executable(&file_path));
    }

    #[test]
    fn test_set_executable_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(set_executable(&temp_dir.path().join("missing")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_plain_file_is_not_executable() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("python");
        File::create(&file_path).unwrap();
        assert!(!is_executable(&file_path));
    }

    #[cfg(windows)]
    #[test]
    fn test_is_executable_by_extension() {
        assert!(is_executable(Path::new("python.exe")));
        assert!(!is_executable(Path::new("python.txt")));
    }
}
