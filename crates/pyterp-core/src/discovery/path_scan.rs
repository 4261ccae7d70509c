//! Interpreters found on the PATH.

use super::dedup::already_registered;
use super::probe::{interpreter_for_executable, VersionProbe};
use super::DiscoveryStrategy;
use crate::config::DiscoveryConfig;
use crate::interpreter::Interpreter;
use crate::platform::{is_executable, HostInfo, SearchPath};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

static PATH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DiscoveryConfig::PATH_NAME_PATTERN).expect("python file name regex must compile")
});

/// Scans every PATH directory for Python executables.
///
/// On Windows only `python.exe` and `pythonw.exe` are considered. Elsewhere
/// any file named `python`, `pythonN`, `pythonN.M` or `pythonN.MM` matches.
pub struct PathScan {
    search_path: SearchPath,
}

impl PathScan {
    pub fn new(search_path: SearchPath) -> Self {
        Self { search_path }
    }

    /// Matching executables in one directory, sorted by file name.
    fn matches_in(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping PATH entry {}: {}", dir.display(), e);
                return Vec::new();
            }
        };
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| PATH_NAME_RE.is_match(name))
                    .unwrap_or(false)
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_executable(path))
            .collect();
        matches.sort();
        matches
    }

    fn discover_windows(&self, known: &mut Vec<Interpreter>, probe: &dyn VersionProbe) {
        for (program, windowed) in [
            (DiscoveryConfig::CONSOLE_EXECUTABLE, false),
            (DiscoveryConfig::WINDOWED_EXECUTABLE, true),
        ] {
            for executable in self.search_path.find_all(program) {
                add_if_new(known, probe, &executable, windowed);
            }
        }
    }

    fn discover_unix(&self, known: &mut Vec<Interpreter>, probe: &dyn VersionProbe) {
        for dir in self.search_path.dirs() {
            for executable in self.matches_in(dir) {
                add_if_new(known, probe, &executable, false);
            }
        }
    }
}

fn add_if_new(
    known: &mut Vec<Interpreter>,
    probe: &dyn VersionProbe,
    executable: &Path,
    windowed: bool,
) {
    if !executable.exists() || already_registered(known, executable) {
        return;
    }
    let interpreter = interpreter_for_executable(
        probe,
        executable,
        DiscoveryConfig::PATH_FALLBACK_NAME,
        windowed,
    );
    info!(
        "Found {} at {}",
        interpreter.name,
        interpreter.command.display()
    );
    known.push(interpreter);
}

impl DiscoveryStrategy for PathScan {
    fn name(&self) -> &'static str {
        "path"
    }

    fn is_available(&self, _host: &HostInfo) -> bool {
        true
    }

    fn discover(&self, host: &HostInfo, known: &mut Vec<Interpreter>, probe: &dyn VersionProbe) {
        if host.windows {
            self.discover_windows(known, probe);
        } else {
            self.discover_unix(known, probe);
        }
    }
}
