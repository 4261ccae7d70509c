//! Command implementations.
//!
//! Each command writes its result to `out`; errors propagate to `main` and
//! end the process with a non-zero status.

use anyhow::{bail, Result};
use pyterp_core::discovery::{default_strategies, run_strategies};
use pyterp_core::{HostInfo, Interpreter, InterpreterRegistry, ProcessProbe, SearchPath};
use std::io::Write;
use std::path::PathBuf;

fn write_interpreter(out: &mut impl Write, interpreter: &Interpreter, marker: &str) -> Result<()> {
    writeln!(
        out,
        "{} {}  {}  {}",
        marker,
        interpreter.id,
        interpreter.name,
        interpreter.command.display()
    )?;
    Ok(())
}

pub fn list(registry: &InterpreterRegistry, out: &mut impl Write) -> Result<()> {
    let default_id = registry.default_id();
    let interpreters = registry.interpreters();
    if interpreters.is_empty() {
        writeln!(out, "No interpreters registered")?;
        return Ok(());
    }
    for interpreter in &interpreters {
        let marker = if interpreter.id == default_id { "*" } else { " " };
        write_interpreter(out, interpreter, marker)?;
    }
    Ok(())
}

pub fn show_default(registry: &InterpreterRegistry, out: &mut impl Write) -> Result<()> {
    let default = registry.default_interpreter();
    if default.is_empty() {
        writeln!(out, "No default interpreter")?;
    } else {
        write_interpreter(out, &default, "*")?;
    }
    Ok(())
}

pub fn add(
    registry: &InterpreterRegistry,
    out: &mut impl Write,
    name: String,
    path: PathBuf,
    make_default: bool,
) -> Result<()> {
    let added = registry.add_interpreter(name, path, make_default)?;
    writeln!(out, "Added {}", added.id)?;
    Ok(())
}

pub fn edit(
    registry: &InterpreterRegistry,
    out: &mut impl Write,
    id: &str,
    name: Option<String>,
    path: Option<PathBuf>,
) -> Result<()> {
    if name.is_none() && path.is_none() {
        bail!("Nothing to change: pass --name and/or --path");
    }
    registry.modify(|draft| {
        draft.edit(id, |current_name, current_command| {
            if let Some(name) = name {
                *current_name = name;
            }
            if let Some(path) = path {
                *current_command = path;
            }
        })
    })?;
    writeln!(out, "Updated {}", id)?;
    Ok(())
}

pub fn remove(registry: &InterpreterRegistry, out: &mut impl Write, id: &str) -> Result<()> {
    let removed = registry.remove_interpreter(id)?;
    writeln!(out, "Removed {} ({})", removed.id, removed.name)?;
    Ok(())
}

pub fn set_default(registry: &InterpreterRegistry, out: &mut impl Write, id: &str) -> Result<()> {
    registry.make_default(id)?;
    writeln!(out, "Default is now {}", id)?;
    Ok(())
}

/// Run discovery against an empty list and print what was found.
pub fn discover(out: &mut impl Write) -> Result<()> {
    let strategies = default_strategies(SearchPath::from_env());
    let mut found = Vec::new();
    run_strategies(
        &strategies,
        &HostInfo::current(),
        &ProcessProbe::default(),
        &mut found,
    );
    if found.is_empty() {
        writeln!(out, "No interpreters found")?;
    }
    for interpreter in &found {
        writeln!(out, "{}  {}", interpreter.name, interpreter.command.display())?;
    }
    Ok(())
}
