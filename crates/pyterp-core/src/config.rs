//! Centralized configuration for pyterp.
//!
//! Constants for the persisted settings schema, interpreter discovery and
//! platform paths.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "pyterp";
    pub const APP_CONFIG_DIR_NAME: &'static str = "pyterp";
    pub const SETTINGS_FILENAME: &'static str = "settings.json";
    /// Environment variable overriding the settings file location.
    pub const SETTINGS_ENV: &'static str = "PYTERP_SETTINGS";
}

/// Persisted settings schema.
///
/// The key names are fixed constants shared with existing settings files,
/// including their spelling.
pub struct SettingsConfig;

impl SettingsConfig {
    pub const GROUP_KEY: &'static str = "Python";
    pub const INTERPRETER_KEY: &'static str = "Interpeter";
    pub const DEFAULT_KEY: &'static str = "DefaultInterpeter";
    pub const CORRUPT_SUFFIX: &'static str = "corrupt";
}

/// Interpreter discovery.
pub struct DiscoveryConfig;

impl DiscoveryConfig {
    /// Flag passed to a candidate executable to read its display name.
    pub const VERSION_FLAG: &'static str = "--version";
    pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(10);

    pub const PATH_FALLBACK_NAME: &'static str = "Python from Path";
    pub const WINDOWED_SUFFIX: &'static str = " (Windowed)";
    /// Name given to interpreters added by hand before the user renames them.
    pub const NEW_INTERPRETER_NAME: &'static str = "Python";

    pub const CONSOLE_EXECUTABLE: &'static str = "python";
    pub const WINDOWED_EXECUTABLE: &'static str = "pythonw";

    /// Commands searched on PATH, in order, to pick the initial default.
    pub const DEFAULT_COMMANDS: &'static [&'static str] = &["python", "python3"];

    /// File names accepted by the PATH scan on non-Windows hosts:
    /// `python`, `python3`, `python3.9`, `python3.12`.
    pub const PATH_NAME_PATTERN: &'static str =
        r"^python(?:[1-9](?:\.(?:[0-9]|[1-9][0-9]))?)?$";

    pub const REGISTRY_ROOT: &'static str = r"SOFTWARE\Python\PythonCore";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_reasonable() {
        assert!(DiscoveryConfig::VERSION_PROBE_TIMEOUT > Duration::ZERO);
        assert!(DiscoveryConfig::PROBE_POLL_INTERVAL < DiscoveryConfig::VERSION_PROBE_TIMEOUT);
    }

    #[test]
    fn test_path_name_pattern_compiles() {
        assert!(regex::Regex::new(DiscoveryConfig::PATH_NAME_PATTERN).is_ok());
    }
}
