//! Interpreters recorded in the Windows installation registry.
//!
//! Each `HKLM\SOFTWARE\Python\PythonCore\<version>` key describes one
//! installation. Reading the registry is isolated behind `InstallDatabase`
//! so the record-to-interpreter logic can be exercised on any host.

use super::dedup::already_registered;
use super::probe::{interpreter_for_executable, VersionProbe};
use super::DiscoveryStrategy;
use crate::config::DiscoveryConfig;
use crate::interpreter::Interpreter;
use crate::platform::{with_executable_suffix, HostInfo};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One installation entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRecord {
    /// Name of the version key, e.g. `3.12`.
    pub version: String,
    /// `DisplayName`, possibly empty.
    pub display_name: String,
    /// `InstallPath\ExecutablePath`
    pub executable_path: Option<PathBuf>,
    /// `InstallPath\WindowedExecutablePath`
    pub windowed_executable_path: Option<PathBuf>,
    /// Default value of `InstallPath`.
    pub install_path: Option<PathBuf>,
}

/// Source of installation records.
pub trait InstallDatabase: Send + Sync {
    fn installations(&self) -> Vec<InstallRecord>;
}

/// Reads `HKEY_LOCAL_MACHINE\SOFTWARE\Python\PythonCore`.
///
/// Yields nothing on hosts without a registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInstallDatabase;

impl InstallDatabase for SystemInstallDatabase {
    fn installations(&self) -> Vec<InstallRecord> {
        #[cfg(windows)]
        {
            windows_reader::read_python_core()
        }
        #[cfg(not(windows))]
        {
            Vec::new()
        }
    }
}

/// Registers interpreters listed in an installation database.
pub struct RegistryScan {
    database: Box<dyn InstallDatabase>,
}

impl RegistryScan {
    pub fn new(database: Box<dyn InstallDatabase>) -> Self {
        Self { database }
    }

    fn add_record(
        &self,
        record: &InstallRecord,
        known: &mut Vec<Interpreter>,
        probe: &dyn VersionProbe,
    ) {
        if let Some(executable) = &record.executable_path {
            add_named(known, executable, record.display_name.clone());
        }
        if let Some(executable) = &record.windowed_executable_path {
            add_named(
                known,
                executable,
                format!("{}{}", record.display_name, DiscoveryConfig::WINDOWED_SUFFIX),
            );
        }
        if let Some(dir) = &record.install_path {
            let fallback = format!("Python {}", record.version);
            for (program, windowed) in [
                (DiscoveryConfig::CONSOLE_EXECUTABLE, false),
                (DiscoveryConfig::WINDOWED_EXECUTABLE, true),
            ] {
                let executable = dir.join(with_executable_suffix(program));
                if executable.exists() && !already_registered(known, &executable) {
                    let interpreter =
                        interpreter_for_executable(probe, &executable, &fallback, windowed);
                    info!("Found {} at {}", interpreter.name, executable.display());
                    known.push(interpreter);
                }
            }
        }
    }
}

fn add_named(known: &mut Vec<Interpreter>, executable: &Path, name: String) {
    if !executable.exists() {
        debug!("Registered executable {} does not exist", executable.display());
        return;
    }
    if already_registered(known, executable) {
        return;
    }
    info!("Found {} at {}", name, executable.display());
    known.push(Interpreter::new(name, executable));
}

impl DiscoveryStrategy for RegistryScan {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn is_available(&self, host: &HostInfo) -> bool {
        host.windows
    }

    fn discover(&self, _host: &HostInfo, known: &mut Vec<Interpreter>, probe: &dyn VersionProbe) {
        for record in self.database.installations() {
            debug!("Installation record {:?}", record);
            self.add_record(&record, known, probe);
        }
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
mod windows_reader {
    //! Minimal registry reader over the Win32 API.

    use super::InstallRecord;
    use crate::config::DiscoveryConfig;
    use std::ffi::OsString;
    use std::os::windows::ffi::{OsStrExt, OsStringExt};
    use std::path::PathBuf;
    use std::ptr;
    use tracing::debug;
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegEnumKeyExW, RegGetValueW, RegOpenKeyExW, HKEY, HKEY_LOCAL_MACHINE,
        KEY_READ, RRF_RT_REG_SZ,
    };

    const MAX_KEY_LEN: usize = 256;

    fn wide(s: &str) -> Vec<u16> {
        std::ffi::OsStr::new(s)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    struct Key(HKEY);

    impl Drop for Key {
        fn drop(&mut self) {
            // SAFETY: the handle came from a successful RegOpenKeyExW and is
            // closed exactly once.
            unsafe {
                RegCloseKey(self.0);
            }
        }
    }

    fn open(parent: HKEY, path: &str) -> Option<Key> {
        let path = wide(path);
        let mut handle: HKEY = ptr::null_mut();
        // SAFETY: `path` is NUL-terminated and outlives the call; `handle`
        // is a valid out pointer.
        let status = unsafe { RegOpenKeyExW(parent, path.as_ptr(), 0, KEY_READ, &mut handle) };
        (status == ERROR_SUCCESS).then_some(Key(handle))
    }

    fn subkeys(key: &Key) -> Vec<String> {
        let mut names = Vec::new();
        let mut index = 0u32;
        loop {
            let mut buf = [0u16; MAX_KEY_LEN];
            let mut len = buf.len() as u32;
            // SAFETY: `buf` holds `len` u16s; the optional out pointers are null.
            let status = unsafe {
                RegEnumKeyExW(
                    key.0,
                    index,
                    buf.as_mut_ptr(),
                    &mut len,
                    ptr::null(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            };
            if status != ERROR_SUCCESS {
                break;
            }
            names.push(
                OsString::from_wide(&buf[..len as usize])
                    .to_string_lossy()
                    .into_owned(),
            );
            index += 1;
        }
        names
    }

    /// A `REG_SZ` value; `value = None` reads the key's default value.
    fn string_value(key: &Key, subkey: &str, value: Option<&str>) -> Option<String> {
        let subkey = wide(subkey);
        let value = value.map(wide);
        let value_ptr = value.as_ref().map_or(ptr::null(), |v| v.as_ptr());

        let mut size = 0u32;
        // SAFETY: size query with a null data pointer; strings are NUL-terminated.
        let status = unsafe {
            RegGetValueW(
                key.0,
                subkey.as_ptr(),
                value_ptr,
                RRF_RT_REG_SZ,
                ptr::null_mut(),
                ptr::null_mut(),
                &mut size,
            )
        };
        if status != ERROR_SUCCESS || size == 0 {
            return None;
        }

        let mut buf = vec![0u16; (size as usize).div_ceil(2)];
        // SAFETY: `buf` is at least `size` bytes long.
        let status = unsafe {
            RegGetValueW(
                key.0,
                subkey.as_ptr(),
                value_ptr,
                RRF_RT_REG_SZ,
                ptr::null_mut(),
                buf.as_mut_ptr().cast(),
                &mut size,
            )
        };
        if status != ERROR_SUCCESS {
            return None;
        }
        let chars = buf
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(buf.len());
        Some(OsString::from_wide(&buf[..chars]).to_string_lossy().into_owned())
    }

    pub(super) fn read_python_core() -> Vec<InstallRecord> {
        let Some(root) = open(HKEY_LOCAL_MACHINE, DiscoveryConfig::REGISTRY_ROOT) else {
            debug!("No {} key", DiscoveryConfig::REGISTRY_ROOT);
            return Vec::new();
        };
        subkeys(&root)
            .into_iter()
            .filter_map(|version| {
                let key = open(root.0, &version)?;
                let non_empty = |s: String| (!s.is_empty()).then_some(s);
                Some(InstallRecord {
                    display_name: string_value(&key, "", Some("DisplayName")).unwrap_or_default(),
                    executable_path: string_value(&key, "InstallPath", Some("ExecutablePath"))
                        .and_then(non_empty)
                        .map(PathBuf::from),
                    windowed_executable_path: string_value(
                        &key,
                        "InstallPath",
                        Some("WindowedExecutablePath"),
                    )
                    .and_then(non_empty)
                    .map(PathBuf::from),
                    install_path: string_value(&key, "InstallPath", None)
                        .and_then(non_empty)
                        .map(PathBuf::from),
                    version,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    struct Records(Vec<InstallRecord>);

    impl InstallDatabase for Records {
        fn installations(&self) -> Vec<InstallRecord> {
            self.0.clone()
        }
    }

    struct FixedVersion(&'static str);

    impl VersionProbe for FixedVersion {
        fn version(&self, _executable: &Path) -> Option<String> {
            (!self.0.is_empty()).then(|| self.0.to_string())
        }
    }

    fn touch(path: &Path) -> PathBuf {
        File::create(path).unwrap();
        path.to_path_buf()
    }

    #[test]
    fn test_only_available_on_windows_hosts() {
        let scan = RegistryScan::new(Box::new(Records(Vec::new())));
        assert!(scan.is_available(&HostInfo { windows: true }));
        assert!(!scan.is_available(&HostInfo { windows: false }));
    }

    #[test]
    fn test_executable_paths_use_display_name() {
        let dir = TempDir::new().unwrap();
        let console = touch(&dir.path().join("python-console"));
        let windowed = touch(&dir.path().join("python-windowed"));
        let scan = RegistryScan::new(Box::new(Records(vec![InstallRecord {
            version: "3.12".into(),
            display_name: "Python 3.12 (64-bit)".into(),
            executable_path: Some(console.clone()),
            windowed_executable_path: Some(windowed.clone()),
            install_path: None,
        }])));

        let mut known = Vec::new();
        scan.discover(&HostInfo { windows: true }, &mut known, &FixedVersion(""));

        assert_eq!(known.len(), 2);
        assert_eq!(known[0].name, "Python 3.12 (64-bit)");
        assert_eq!(known[0].command, console);
        assert_eq!(known[1].name, "Python 3.12 (64-bit) (Windowed)");
        assert_eq!(known[1].command, windowed);
    }

    #[test]
    fn test_install_path_is_probed_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        let console = touch(&dir.path().join(with_executable_suffix("python")));
        let windowed = touch(&dir.path().join(with_executable_suffix("pythonw")));
        let scan = RegistryScan::new(Box::new(Records(vec![InstallRecord {
            version: "3.9".into(),
            display_name: "Python 3.9".into(),
            executable_path: Some(console.clone()),
            windowed_executable_path: None,
            install_path: Some(dir.path().to_path_buf()),
        }])));

        let mut known = Vec::new();
        scan.discover(&HostInfo { windows: true }, &mut known, &FixedVersion(""));

        // python.exe was already registered through ExecutablePath.
        assert_eq!(known.len(), 2);
        assert_eq!(known[0].command, console);
        assert_eq!(known[1].command, windowed);
        assert_eq!(known[1].name, "Python 3.9 (Windowed)");
    }

    #[test]
    fn test_install_path_uses_version_banner() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join(with_executable_suffix("python")));
        let scan = RegistryScan::new(Box::new(Records(vec![InstallRecord {
            version: "3.11".into(),
            install_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        }])));

        let mut known = Vec::new();
        scan.discover(&HostInfo { windows: true }, &mut known, &FixedVersion("Python 3.11.9"));
        assert_eq!(known.len(), 1);
        assert_eq!(known[0].name, "Python 3.11.9");
    }

    #[test]
    fn test_missing_executables_are_ignored() {
        let dir = TempDir::new().unwrap();
        let scan = RegistryScan::new(Box::new(Records(vec![InstallRecord {
            version: "3.8".into(),
            display_name: "Python 3.8".into(),
            executable_path: Some(dir.path().join("gone.exe")),
            windowed_executable_path: Some(dir.path().join("gonew.exe")),
            install_path: Some(dir.path().join("missing-dir")),
        }])));

        let mut known = Vec::new();
        scan.discover(&HostInfo { windows: true }, &mut known, &FixedVersion(""));
        assert!(known.is_empty());
    }

    #[test]
    fn test_system_database_is_empty_off_windows() {
        #[cfg(not(windows))]
        assert!(SystemInstallDatabase.installations().is_empty());
    }
}
