//! Interpreter discovery.
//!
//! Discovery is an ordered list of strategies, each gated by a host
//! capability. Every strategy appends interpreters it finds to the list of
//! already known ones and skips executables that are already registered.

pub mod dedup;
pub mod install_db;
pub mod path_scan;
pub mod probe;

pub use dedup::{already_registered, canonical_key};
pub use install_db::{InstallDatabase, InstallRecord, RegistryScan, SystemInstallDatabase};
pub use path_scan::PathScan;
pub use probe::{interpreter_for_executable, ProcessProbe, VersionProbe};

use crate::interpreter::Interpreter;
use crate::platform::{HostInfo, SearchPath};
use tracing::debug;

/// A source of candidate interpreters.
pub trait DiscoveryStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the strategy applies to `host`.
    fn is_available(&self, host: &HostInfo) -> bool;

    /// Append newly found interpreters to `known`.
    fn discover(&self, host: &HostInfo, known: &mut Vec<Interpreter>, probe: &dyn VersionProbe);
}

/// The installation registry scan followed by the PATH scan.
pub fn default_strategies(search_path: SearchPath) -> Vec<Box<dyn DiscoveryStrategy>> {
    vec![
        Box::new(RegistryScan::new(Box::new(SystemInstallDatabase))),
        Box::new(PathScan::new(search_path)),
    ]
}

/// Run every available strategy once, in order.
pub fn run_strategies(
    strategies: &[Box<dyn DiscoveryStrategy>],
    host: &HostInfo,
    probe: &dyn VersionProbe,
    known: &mut Vec<Interpreter>,
) {
    for strategy in strategies {
        if !strategy.is_available(host) {
            debug!("Skipping {} discovery on this host", strategy.name());
            continue;
        }
        let before = known.len();
        strategy.discover(host, known, probe);
        debug!(
            "{} discovery added {} interpreter(s)",
            strategy.name(),
            known.len() - before
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NoVersion;

    impl VersionProbe for NoVersion {
        fn version(&self, _executable: &Path) -> Option<String> {
            None
        }
    }

    struct Counting {
        windows_only: bool,
        calls: Arc<AtomicUsize>,
    }

    impl DiscoveryStrategy for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn is_available(&self, host: &HostInfo) -> bool {
            !self.windows_only || host.windows
        }

        fn discover(&self, _host: &HostInfo, known: &mut Vec<Interpreter>, _probe: &dyn VersionProbe) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            known.push(Interpreter::new("fake", "/fake/python"));
        }
    }

    #[test]
    fn test_unavailable_strategies_are_skipped() {
        let windows_calls = Arc::new(AtomicUsize::new(0));
        let everywhere_calls = Arc::new(AtomicUsize::new(0));
        let strategies: Vec<Box<dyn DiscoveryStrategy>> = vec![
            Box::new(Counting {
                windows_only: true,
                calls: windows_calls.clone(),
            }),
            Box::new(Counting {
                windows_only: false,
                calls: everywhere_calls.clone(),
            }),
        ];

        let mut known = Vec::new();
        run_strategies(&strategies, &HostInfo { windows: false }, &NoVersion, &mut known);

        assert_eq!(windows_calls.load(Ordering::SeqCst), 0);
        assert_eq!(everywhere_calls.load(Ordering::SeqCst), 1);
        assert_eq!(known.len(), 1);
    }

    #[test]
    fn test_default_strategies_order() {
        let strategies = default_strategies(SearchPath::default());
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["registry", "path"]);
    }
}
