//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific behavior live in this module rather
//! than being scattered through discovery and storage code.
//!
//! - `paths` - config directory, executable suffixes, PATH lookup
//! - `permissions` - executable checks
//! - `process` - bounded synchronous process invocation

pub mod paths;
pub mod permissions;
pub mod process;

pub use paths::{default_settings_path, pyterp_config_dir, with_executable_suffix, SearchPath};
pub use permissions::{is_executable, set_executable};
pub use process::{run_merged, CommandOutcome};

/// Capabilities of the host that gate discovery strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostInfo {
    pub windows: bool,
}

impl HostInfo {
    /// The host this binary was compiled for.
    pub fn current() -> Self {
        Self {
            windows: cfg!(windows),
        }
    }
}

impl Default for HostInfo {
    fn default() -> Self {
        Self::current()
    }
}

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}
