//! Loading and saving the interpreter list and default id.

use super::SettingsBackend;
use crate::config::SettingsConfig;
use crate::error::Result;
use crate::interpreter::Interpreter;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Interpreter list and default id as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSettings {
    pub interpreters: Vec<Interpreter>,
    pub default_id: String,
}

impl SavedSettings {
    pub fn new(interpreters: Vec<Interpreter>, default_id: impl Into<String>) -> Self {
        Self {
            interpreters,
            default_id: default_id.into(),
        }
    }
}

/// Read the `Python` group.
///
/// Entries that are not a triple of strings are skipped; they never fail the
/// whole load.
pub fn load(backend: &dyn SettingsBackend) -> SavedSettings {
    let interpreters = match backend.value(SettingsConfig::GROUP_KEY, SettingsConfig::INTERPRETER_KEY)
    {
        Some(Value::Array(entries)) => entries.iter().filter_map(interpreter_from_value).collect(),
        Some(other) => {
            debug!("Ignoring non-list interpreter setting: {}", other);
            Vec::new()
        }
        None => Vec::new(),
    };

    let default_id = backend
        .value(SettingsConfig::GROUP_KEY, SettingsConfig::DEFAULT_KEY)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();

    SavedSettings {
        interpreters,
        default_id,
    }
}

/// Write the `Python` group and sync the backend.
pub fn save(backend: &mut dyn SettingsBackend, saved: &SavedSettings) -> Result<()> {
    stage(backend, saved);
    backend.sync()
}

/// Write the `Python` group without syncing.
///
/// Interpreters whose command is not valid UTF-8 cannot be stored as a
/// string and are left out.
pub fn stage(backend: &mut dyn SettingsBackend, saved: &SavedSettings) {
    let entries: Vec<Value> = saved
        .interpreters
        .iter()
        .filter_map(interpreter_to_value)
        .collect();
    backend.set_value(
        SettingsConfig::GROUP_KEY,
        SettingsConfig::INTERPRETER_KEY,
        Value::Array(entries),
    );
    backend.set_value(
        SettingsConfig::GROUP_KEY,
        SettingsConfig::DEFAULT_KEY,
        Value::String(saved.default_id.clone()),
    );
}

fn interpreter_to_value(interpreter: &Interpreter) -> Option<Value> {
    let Some(command) = interpreter.command.to_str() else {
        debug!(
            "Not saving {}: command {} is not valid UTF-8",
            interpreter.id,
            interpreter.command.display()
        );
        return None;
    };
    Some(Value::Array(vec![
        Value::String(interpreter.id.clone()),
        Value::String(interpreter.name.clone()),
        Value::String(command.to_string()),
    ]))
}

fn interpreter_from_value(value: &Value) -> Option<Interpreter> {
    let fields = match value.as_array() {
        Some(fields) if fields.len() == 3 => fields,
        _ => {
            debug!("Skipping malformed interpreter entry: {}", value);
            return None;
        }
    };
    match (fields[0].as_str(), fields[1].as_str(), fields[2].as_str()) {
        (Some(id), Some(name), Some(command)) => {
            Some(Interpreter::with_id(id, name, PathBuf::from(command)))
        }
        _ => {
            debug!("Skipping interpreter entry with non-string fields: {}", value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;
    use serde_json::json;

    fn sample() -> Vec<Interpreter> {
        vec![
            Interpreter::with_id("{a}", "Python 3.11.4", "/usr/bin/python3.11"),
            Interpreter::with_id("{b}", "Python from Path", "/usr/local/bin/python3"),
        ]
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut backend = MemorySettings::new();
        let saved = SavedSettings::new(sample(), "{b}");
        save(&mut backend, &saved).unwrap();
        assert_eq!(load(&backend), saved);
        assert_eq!(backend.sync_count(), 1);
    }

    #[test]
    fn test_saved_layout_uses_fixed_keys() {
        let mut backend = MemorySettings::new();
        save(&mut backend, &SavedSettings::new(sample(), "{a}")).unwrap();

        assert_eq!(
            backend.value("Python", "Interpeter"),
            Some(json!([
                ["{a}", "Python 3.11.4", "/usr/bin/python3.11"],
                ["{b}", "Python from Path", "/usr/local/bin/python3"]
            ]))
        );
        assert_eq!(backend.value("Python", "DefaultInterpeter"), Some(json!("{a}")));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let mut backend = MemorySettings::new();
        backend.set_value(
            "Python",
            "Interpeter",
            json!([
                ["{a}", "A", "/a"],
                ["{short}", "missing path"],
                ["{long}", "B", "/b", "extra"],
                "not a list",
                ["{num}", 7, "/c"],
                ["{d}", "D", "/d"]
            ]),
        );

        let loaded = load(&backend);
        let ids: Vec<&str> = loaded.interpreters.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["{a}", "{d}"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_commands_are_not_saved() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut interpreters = sample();
        interpreters.push(Interpreter::with_id(
            "{bad}",
            "Broken",
            PathBuf::from(OsStr::from_bytes(b"/opt/\xff/python")),
        ));
        let mut backend = MemorySettings::new();
        save(&mut backend, &SavedSettings::new(interpreters, "{a}")).unwrap();

        assert_eq!(load(&backend), SavedSettings::new(sample(), "{a}"));
    }

    #[test]
    fn test_missing_or_wrong_typed_values_load_empty() {
        let empty = MemorySettings::new();
        assert_eq!(load(&empty), SavedSettings::default());

        let mut wrong = MemorySettings::new();
        wrong.set_value("Python", "Interpeter", json!({"a": 1}));
        wrong.set_value("Python", "DefaultInterpeter", json!(42));
        assert_eq!(load(&wrong), SavedSettings::default());
    }
}
