//! Pyterp Core - Headless Python interpreter discovery and registry.
//!
//! This crate finds Python interpreters installed on the machine, keeps the
//! list together with a chosen default in a settings store, and notifies
//! observers whenever either changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use pyterp_core::{JsonFileSettings, RegistryBuilder};
//!
//! fn main() -> pyterp_core::Result<()> {
//!     let settings = JsonFileSettings::open("settings.json")?;
//!     let registry = RegistryBuilder::new(Box::new(settings)).init()?;
//!
//!     for interpreter in registry.interpreters() {
//!         println!("{} -> {}", interpreter.name, interpreter.command.display());
//!     }
//!
//!     registry.subscribe(|change| {
//!         println!("{} interpreter(s) now registered", change.interpreters.len());
//!     });
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod draft;
pub mod error;
pub mod interpreter;
pub mod platform;
pub mod registry;
pub mod settings;

// Re-export commonly used types
pub use config::{AppConfig, DiscoveryConfig, SettingsConfig};
pub use discovery::{
    DiscoveryStrategy, InstallDatabase, InstallRecord, PathScan, ProcessProbe, RegistryScan,
    SystemInstallDatabase, VersionProbe,
};
pub use draft::InterpreterDraft;
pub use error::{PyterpError, Result};
pub use interpreter::Interpreter;
pub use platform::{default_settings_path, HostInfo, SearchPath};
pub use registry::{InterpreterRegistry, InterpretersChanged, RegistryBuilder, SubscriptionId};
pub use settings::{JsonFileSettings, MemorySettings, SettingsBackend};
