//! Deriving a display name by running the interpreter.

use crate::config::DiscoveryConfig;
use crate::interpreter::Interpreter;
use crate::platform::process::run_merged;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Reads the version banner of a candidate executable.
pub trait VersionProbe: Send + Sync {
    /// The trimmed `--version` output, or `None` when the executable could
    /// not be run, failed, timed out or printed nothing.
    fn version(&self, executable: &Path) -> Option<String>;
}

/// Runs the executable with `--version` as a child process.
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    timeout: Duration,
}

impl ProcessProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new(DiscoveryConfig::VERSION_PROBE_TIMEOUT)
    }
}

impl VersionProbe for ProcessProbe {
    fn version(&self, executable: &Path) -> Option<String> {
        let outcome = run_merged(executable, &[DiscoveryConfig::VERSION_FLAG], self.timeout);
        let version = outcome.success_output().map(str::to_string);
        if version.is_none() {
            debug!("No version banner from {}: {:?}", executable.display(), outcome);
        }
        version
    }
}

/// Build an interpreter for `executable`, named after its version banner.
///
/// Falls back to `default_name` when the probe yields nothing; a broken
/// interpreter is still registered.
pub fn interpreter_for_executable(
    probe: &dyn VersionProbe,
    executable: &Path,
    default_name: &str,
    windowed: bool,
) -> Interpreter {
    let mut name = probe
        .version(executable)
        .unwrap_or_else(|| default_name.to_string());
    if windowed {
        name.push_str(DiscoveryConfig::WINDOWED_SUFFIX);
    }
    Interpreter::new(name, executable)
}
