//! Editing session over the interpreter list.
//!
//! A draft is a detached copy of the registry state. Edits accumulate in the
//! draft and are committed in one `InterpreterRegistry::apply` call, so
//! observers see a single change.

use crate::config::DiscoveryConfig;
use crate::error::{PyterpError, Result};
use crate::interpreter::{find_by_id, Interpreter};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpreterDraft {
    interpreters: Vec<Interpreter>,
    default_id: String,
}

impl InterpreterDraft {
    pub fn new(interpreters: Vec<Interpreter>, default_id: impl Into<String>) -> Self {
        Self {
            interpreters,
            default_id: default_id.into(),
        }
    }

    pub fn interpreters(&self) -> &[Interpreter] {
        &self.interpreters
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn get(&self, id: &str) -> Option<&Interpreter> {
        find_by_id(&self.interpreters, id)
    }

    /// Append a blank interpreter with a fresh id, named `Python`, and
    /// return it for editing.
    pub fn add(&mut self) -> &mut Interpreter {
        self.push(Interpreter::new(
            DiscoveryConfig::NEW_INTERPRETER_NAME,
            PathBuf::new(),
        ))
    }

    /// Append a fully specified interpreter with a fresh id.
    pub fn add_named(&mut self, name: impl Into<String>, command: impl Into<PathBuf>) -> &mut Interpreter {
        self.push(Interpreter::new(name, command))
    }

    fn push(&mut self, interpreter: Interpreter) -> &mut Interpreter {
        self.interpreters.push(interpreter);
        let last = self.interpreters.len() - 1;
        &mut self.interpreters[last]
    }

    /// Remove an interpreter.
    ///
    /// Removing the default leaves the default id dangling;
    /// `default_interpreter` then resolves to the empty sentinel.
    pub fn remove(&mut self, id: &str) -> Result<Interpreter> {
        let index = self.position(id)?;
        Ok(self.interpreters.remove(index))
    }

    /// Replace the interpreter with the same id, keeping its position.
    pub fn update(&mut self, interpreter: Interpreter) -> Result<()> {
        let index = self.position(&interpreter.id)?;
        self.interpreters[index] = interpreter;
        Ok(())
    }

    /// Edit one interpreter in place.
    pub fn edit<F>(&mut self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut String, &mut PathBuf),
    {
        let index = self.position(id)?;
        let interpreter = &mut self.interpreters[index];
        f(&mut interpreter.name, &mut interpreter.command);
        Ok(())
    }

    pub fn make_default(&mut self, id: &str) -> Result<()> {
        self.position(id)?;
        self.default_id = id.to_string();
        Ok(())
    }

    pub fn into_parts(self) -> (Vec<Interpreter>, String) {
        (self.interpreters, self.default_id)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.interpreters
            .iter()
            .position(|interpreter| !id.is_empty() && interpreter.id == id)
            .ok_or_else(|| PyterpError::InterpreterNotFound { id: id.to_string() })
    }
}
