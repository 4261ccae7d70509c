//! Key-value settings backends.

use super::atomic::{atomic_read_json, atomic_write_json};
use super::SettingsBackend;
use crate::config::SettingsConfig;
use crate::error::{PyterpError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Groups = BTreeMap<String, Map<String, Value>>;

/// Settings persisted as one JSON object of groups:
/// `{ "<group>": { "<key>": <value> } }`.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    groups: Groups,
}

impl JsonFileSettings {
    /// Open the settings file, treating a missing file as empty.
    ///
    /// A file that does not parse is moved aside to `<name>.corrupt` so the
    /// next save does not silently destroy it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let groups = match atomic_read_json::<Value>(&path) {
            Ok(Some(value)) => groups_from_value(value, &path),
            Ok(None) => {
                debug!("No settings file at {}, starting empty", path.display());
                Groups::new()
            }
            Err(PyterpError::Json { message, .. }) => {
                let aside = path.with_extension(SettingsConfig::CORRUPT_SUFFIX);
                warn!("{}; moving it to {}", message, aside.display());
                fs::rename(&path, &aside).map_err(|e| PyterpError::io_with_path(e, &path))?;
                Groups::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { path, groups })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn groups_from_value(value: Value, path: &Path) -> Groups {
    let Value::Object(root) = value else {
        warn!("Settings file {} is not a JSON object, ignoring it", path.display());
        return Groups::new();
    };
    root.into_iter()
        .filter_map(|(name, group)| match group {
            Value::Object(entries) => Some((name, entries)),
            _ => {
                warn!("Settings group {} is not an object, ignoring it", name);
                None
            }
        })
        .collect()
}

impl SettingsBackend for JsonFileSettings {
    fn value(&self, group: &str, key: &str) -> Option<Value> {
        self.groups.get(group).and_then(|g| g.get(key)).cloned()
    }

    fn set_value(&mut self, group: &str, key: &str, value: Value) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn sync(&mut self) -> Result<()> {
        atomic_write_json(&self.path, &self.groups)
    }
}

/// In-process settings, for tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    groups: Groups,
    syncs: usize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `sync` was called.
    pub fn sync_count(&self) -> usize {
        self.syncs
    }
}

impl SettingsBackend for MemorySettings {
    fn value(&self, group: &str, key: &str) -> Option<Value> {
        self.groups.get(group).and_then(|g| g.get(key)).cloned()
    }

    fn set_value(&mut self, group: &str, key: &str, value: Value) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn sync(&mut self) -> Result<()> {
        self.syncs += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_opens_empty() {
        let temp_dir = TempDir::new().unwrap();
        let settings = JsonFileSettings::open(temp_dir.path().join("settings.json")).unwrap();
        assert!(settings.value("Python", "DefaultInterpeter").is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = JsonFileSettings::open(&path).unwrap();
        settings.set_value("Python", "DefaultInterpeter", json!("x"));
        settings.set_value("Other", "Key", json!([1, 2]));
        settings.sync().unwrap();

        let reopened = JsonFileSettings::open(&path).unwrap();
        assert_eq!(reopened.value("Python", "DefaultInterpeter"), Some(json!("x")));
        assert_eq!(reopened.value("Other", "Key"), Some(json!([1, 2])));
        assert!(reopened.value("Python", "Key").is_none());
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{\"Python\": [truncated").unwrap();

        let settings = JsonFileSettings::open(&path).unwrap();
        assert!(settings.value("Python", "Interpeter").is_none());
        assert!(!path.exists());
        assert!(temp_dir.path().join("settings.corrupt").exists());
    }

    #[test]
    fn test_non_object_groups_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"Python": 3, "Kept": {"k": "v"}}"#).unwrap();

        let settings = JsonFileSettings::open(&path).unwrap();
        assert!(settings.value("Python", "k").is_none());
        assert_eq!(settings.value("Kept", "k"), Some(json!("v")));
    }

    #[test]
    fn test_memory_settings_counts_syncs() {
        let mut settings = MemorySettings::new();
        settings.set_value("Python", "DefaultInterpeter", json!("x"));
        settings.sync().unwrap();
        assert_eq!(settings.sync_count(), 1);
        assert_eq!(settings.value("Python", "DefaultInterpeter"), Some(json!("x")));
    }
}
