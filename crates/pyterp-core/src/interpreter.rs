//! The interpreter record.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A registered Python interpreter.
///
/// The id is assigned once at creation and never changes, independent of
/// the display name or the executable path. `Interpreter::default()` is the
/// empty sentinel returned when no default is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Interpreter {
    pub id: String,
    pub name: String,
    pub command: PathBuf,
}

impl Interpreter {
    /// Create an interpreter with a fresh unique id.
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            command: command.into(),
        }
    }

    /// Create an interpreter with a known id, e.g. when reloading settings.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            command: command.into(),
        }
    }

    /// True for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn command(&self) -> &Path {
        &self.command
    }
}

/// Generate an interpreter id: a v4 UUID in braces.
pub fn new_id() -> String {
    format!("{{{}}}", Uuid::new_v4())
}

/// Look up an interpreter by id.
///
/// An empty id never matches, so the sentinel cannot be "found".
pub fn find_by_id<'a>(interpreters: &'a [Interpreter], id: &str) -> Option<&'a Interpreter> {
    if id.is_empty() {
        return None;
    }
    interpreters.iter().find(|interpreter| interpreter.id == id)
}
