//! Settings persistence.
//!
//! `SettingsBackend` is the key-value primitive (group + key to a JSON
//! value). `store` maps the interpreter list and default id onto it.

mod atomic;
mod backend;
pub mod store;

pub use backend::{JsonFileSettings, MemorySettings};
pub use store::{load, save, stage, SavedSettings};

use crate::error::Result;
use serde_json::Value;

/// Persistent key-value storage with one level of group nesting.
pub trait SettingsBackend: Send {
    /// Read `key` inside `group`.
    fn value(&self, group: &str, key: &str) -> Option<Value>;

    /// Stage `value` for `key` inside `group`. Visible to `value` at once,
    /// persisted on `sync`.
    fn set_value(&mut self, group: &str, key: &str, value: Value);

    /// Flush staged values to durable storage.
    fn sync(&mut self) -> Result<()>;
}
