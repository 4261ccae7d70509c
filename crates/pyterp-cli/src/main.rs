//! Pyterp CLI - inspect and edit the Python interpreter registry.
//!
//! Every command except `discover` initializes the registry (loading settings
//! and, unless disabled, running discovery) and then runs against it.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pyterp_core::{
    default_settings_path, AppConfig, InterpreterRegistry, JsonFileSettings, RegistryBuilder,
};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pyterp")]
#[command(about = "Discover and manage Python interpreters")]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = AppConfig::SETTINGS_ENV, global = true)]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Only use persisted interpreters, skip discovery
    #[arg(long, global = true)]
    no_discovery: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered interpreters, the default marked with `*`
    List,

    /// Show the default interpreter
    ShowDefault,

    /// Register an interpreter by hand
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        path: PathBuf,

        /// Make the new interpreter the default
        #[arg(long)]
        default: bool,
    },

    /// Change the name or path of an interpreter
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Remove an interpreter
    Remove { id: String },

    /// Make an interpreter the default
    SetDefault { id: String },

    /// Run discovery and print candidates without saving them
    Discover,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; stdout is reserved for command output
    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut out = std::io::stdout().lock();
    let open = || open_registry(args.settings.clone(), !args.no_discovery);

    match args.command {
        Command::List => commands::list(&open()?, &mut out),
        Command::ShowDefault => commands::show_default(&open()?, &mut out),
        Command::Add {
            name,
            path,
            default,
        } => commands::add(&open()?, &mut out, name, path, default),
        Command::Edit { id, name, path } => commands::edit(&open()?, &mut out, &id, name, path),
        Command::Remove { id } => commands::remove(&open()?, &mut out, &id),
        Command::SetDefault { id } => commands::set_default(&open()?, &mut out, &id),
        Command::Discover => commands::discover(&mut out),
    }
}

fn open_registry(settings: Option<PathBuf>, discovery: bool) -> Result<InterpreterRegistry> {
    let settings_path = match settings {
        Some(path) => path,
        None => default_settings_path()?,
    };
    debug!("Using settings file {}", settings_path.display());

    let settings = JsonFileSettings::open(&settings_path)
        .with_context(|| format!("Failed to open settings {}", settings_path.display()))?;
    let registry = RegistryBuilder::new(Box::new(settings))
        .with_discovery(discovery)
        .init()?;
    Ok(registry)
}
