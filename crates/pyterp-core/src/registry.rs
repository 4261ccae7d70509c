//! The interpreter registry service.
//!
//! `RegistryBuilder::init` is the one-way transition from uninitialized to
//! initialized: it consumes the builder, so a registry cannot be set up
//! twice and no operation is reachable before initialization. The returned
//! `InterpreterRegistry` is meant to be created once at startup and handed
//! by reference to whatever needs interpreter data.

use crate::config::DiscoveryConfig;
use crate::discovery::{self, canonical_key, DiscoveryStrategy, ProcessProbe, VersionProbe};
use crate::draft::InterpreterDraft;
use crate::error::{PyterpError, Result};
use crate::interpreter::{find_by_id, Interpreter};
use crate::platform::{current_platform, HostInfo, SearchPath};
use crate::settings::{self, SavedSettings, SettingsBackend};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info};

/// Payload delivered to observers after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretersChanged {
    pub interpreters: Vec<Interpreter>,
    pub default_id: String,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&InterpretersChanged) + Send + Sync>;

#[derive(Debug, Default)]
struct RegistryState {
    interpreters: Vec<Interpreter>,
    default_id: String,
}

/// Configures and initializes an `InterpreterRegistry`.
///
/// # Example
///
/// ```rust,ignore
/// use pyterp_core::{JsonFileSettings, RegistryBuilder};
///
/// let settings = JsonFileSettings::open("settings.json")?;
/// let registry = RegistryBuilder::new(Box::new(settings)).init()?;
/// println!("default: {}", registry.default_interpreter().name);
/// ```
pub struct RegistryBuilder {
    settings: Box<dyn SettingsBackend>,
    search_path: SearchPath,
    host: HostInfo,
    probe: Box<dyn VersionProbe>,
    strategies: Option<Vec<Box<dyn DiscoveryStrategy>>>,
    discovery: bool,
}

impl RegistryBuilder {
    /// Defaults: PATH from the environment, the current host, and a
    /// `--version` probe with the standard timeout.
    pub fn new(settings: Box<dyn SettingsBackend>) -> Self {
        Self {
            settings,
            search_path: SearchPath::from_env(),
            host: HostInfo::current(),
            probe: Box::new(ProcessProbe::default()),
            strategies: None,
            discovery: true,
        }
    }

    /// Directories used by the PATH scan and the default lookup.
    pub fn search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    pub fn probe(mut self, probe: Box<dyn VersionProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the default registry + PATH strategies.
    pub fn strategies(mut self, strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Enable or disable discovery. Disabled, only persisted interpreters
    /// are loaded.
    ///
    /// Default: `true`
    pub fn with_discovery(mut self, enable: bool) -> Self {
        self.discovery = enable;
        self
    }

    /// Load persisted state, run discovery, pick the initial default and
    /// publish the result.
    pub fn init(self) -> Result<InterpreterRegistry> {
        let saved = settings::load(self.settings.as_ref());
        debug!(
            "Loaded {} persisted interpreter(s), default {:?}",
            saved.interpreters.len(),
            saved.default_id
        );
        let mut interpreters = saved.interpreters;

        if self.discovery {
            debug!("Running interpreter discovery on {}", current_platform());
            let strategies = self
                .strategies
                .unwrap_or_else(|| discovery::default_strategies(self.search_path.clone()));
            discovery::run_strategies(&strategies, &self.host, self.probe.as_ref(), &mut interpreters);
        }

        let default_id = initial_default_id(&interpreters, &saved.default_id, &self.search_path);

        let registry = InterpreterRegistry {
            state: RwLock::new(RegistryState::default()),
            settings: Mutex::new(self.settings),
            observers: Mutex::new(Vec::new()),
            delivery: Mutex::new(()),
            next_subscription: AtomicU64::new(1),
        };
        registry.set_interpreters(interpreters, default_id)?;

        info!(
            "Interpreter registry ready with {} interpreter(s)",
            registry.interpreters().len()
        );
        Ok(registry)
    }
}

/// Persisted default if it still resolves, else the interpreter behind the
/// first default command found on PATH, else none.
fn initial_default_id(
    interpreters: &[Interpreter],
    persisted: &str,
    search_path: &SearchPath,
) -> String {
    if find_by_id(interpreters, persisted).is_some() {
        return persisted.to_string();
    }
    if !persisted.is_empty() {
        debug!("Persisted default {} no longer exists", persisted);
    }

    let Some(from_path) = DiscoveryConfig::DEFAULT_COMMANDS
        .iter()
        .find_map(|command| search_path.search(command))
    else {
        return String::new();
    };
    let key = canonical_key(&from_path);
    interpreters
        .iter()
        .find(|interpreter| canonical_key(&interpreter.command) == key)
        .map(|interpreter| interpreter.id.clone())
        .unwrap_or_default()
}

/// Owns the interpreter list and the default id.
///
/// Reads return snapshots. Writes are serialized by the settings lock: each
/// one persists, swaps state and then notifies observers in the calling
/// thread.
pub struct InterpreterRegistry {
    state: RwLock<RegistryState>,
    settings: Mutex<Box<dyn SettingsBackend>>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    delivery: Mutex<()>,
    next_subscription: AtomicU64,
}

impl InterpreterRegistry {
    pub fn builder(settings: Box<dyn SettingsBackend>) -> RegistryBuilder {
        RegistryBuilder::new(settings)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        // State is replaced as a whole, so a poisoned lock still holds a
        // consistent value.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Observer)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current interpreters, in insertion order.
    pub fn interpreters(&self) -> Vec<Interpreter> {
        self.read_state().interpreters.clone()
    }

    pub fn default_id(&self) -> String {
        self.read_state().default_id.clone()
    }

    pub fn interpreter(&self, id: &str) -> Option<Interpreter> {
        find_by_id(&self.read_state().interpreters, id).cloned()
    }

    /// The default interpreter, or the empty sentinel when the default id is
    /// unset or no longer resolves.
    pub fn default_interpreter(&self) -> Interpreter {
        let state = self.read_state();
        find_by_id(&state.interpreters, &state.default_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock_settings(&self) -> MutexGuard<'_, Box<dyn SettingsBackend>> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the interpreter list and default id, persist them and notify
    /// observers.
    ///
    /// Fails without changing anything if two interpreters share an id or
    /// the settings cannot be written.
    pub fn set_interpreters(
        &self,
        interpreters: Vec<Interpreter>,
        default_id: impl Into<String>,
    ) -> Result<()> {
        let backend = self.lock_settings();
        self.commit(backend, SavedSettings::new(interpreters, default_id))
    }

    /// Edit the current state and commit it as one change.
    ///
    /// The registry stays locked for writers from the snapshot until the
    /// change is persisted, so concurrent calls never lose each other's
    /// edits. If `edit` fails nothing is committed. `edit` must not write to
    /// the registry.
    pub fn modify<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut InterpreterDraft) -> Result<T>,
    {
        let backend = self.lock_settings();
        let mut draft = self.draft();
        let value = edit(&mut draft)?;
        let (interpreters, default_id) = draft.into_parts();
        self.commit(backend, SavedSettings::new(interpreters, default_id))?;
        Ok(value)
    }

    /// Persist and swap under the settings lock, then notify in commit order.
    fn commit(
        &self,
        mut backend: MutexGuard<'_, Box<dyn SettingsBackend>>,
        saved: SavedSettings,
    ) -> Result<()> {
        check_unique_ids(&saved.interpreters)?;

        if let Err(e) = settings::save(backend.as_mut(), &saved) {
            // Keep the backend's staged values in line with the registry.
            let previous = {
                let state = self.read_state();
                SavedSettings::new(state.interpreters.clone(), state.default_id.clone())
            };
            settings::stage(backend.as_mut(), &previous);
            return Err(e);
        }

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *state = RegistryState {
                interpreters: saved.interpreters.clone(),
                default_id: saved.default_id.clone(),
            };
        }

        // Delivery is taken before the settings lock is released, so
        // observers see changes in commit order.
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        drop(backend);

        debug!(
            "Interpreters changed: {} entries, default {:?}",
            saved.interpreters.len(),
            saved.default_id
        );
        self.notify(&InterpretersChanged {
            interpreters: saved.interpreters,
            default_id: saved.default_id,
        });
        Ok(())
    }

    fn notify(&self, event: &InterpretersChanged) {
        let observers: Vec<Observer> = self
            .lock_observers()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(event);
        }
    }

    /// Register a callback invoked synchronously after every change, in
    /// commit order.
    ///
    /// The callback may read the registry but must not write to it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&InterpretersChanged) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_observers().push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the subscription was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.lock_observers();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// A detached copy of the current state for editing.
    ///
    /// `apply` replaces the whole state with the draft, overwriting changes
    /// committed in between. Use `modify` for read-modify-write edits.
    pub fn draft(&self) -> InterpreterDraft {
        let state = self.read_state();
        InterpreterDraft::new(state.interpreters.clone(), state.default_id.clone())
    }

    /// Commit a draft as one change.
    pub fn apply(&self, draft: InterpreterDraft) -> Result<()> {
        let (interpreters, default_id) = draft.into_parts();
        self.set_interpreters(interpreters, default_id)
    }

    /// Register an interpreter by hand, optionally making it the default.
    pub fn add_interpreter(
        &self,
        name: impl Into<String>,
        command: impl Into<PathBuf>,
        make_default: bool,
    ) -> Result<Interpreter> {
        let name: String = name.into();
        let command: PathBuf = command.into();
        self.modify(|draft| {
            let added = draft.add_named(name, command).clone();
            if make_default {
                draft.make_default(&added.id)?;
            }
            Ok(added)
        })
    }

    pub fn remove_interpreter(&self, id: &str) -> Result<Interpreter> {
        self.modify(|draft| draft.remove(id))
    }

    pub fn update_interpreter(&self, interpreter: Interpreter) -> Result<()> {
        self.modify(|draft| draft.update(interpreter))
    }

    pub fn make_default(&self, id: &str) -> Result<()> {
        self.modify(|draft| draft.make_default(id))
    }
}

fn check_unique_ids(interpreters: &[Interpreter]) -> Result<()> {
    let mut seen = HashSet::new();
    for interpreter in interpreters {
        if !seen.insert(interpreter.id.as_str()) {
            return Err(PyterpError::DuplicateInterpreterId {
                id: interpreter.id.clone(),
            });
        }
    }
    Ok(())
}
