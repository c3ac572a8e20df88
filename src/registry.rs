//! Module registry: a name-unique plugin registry of handler factories plus
//! a live, name-keyed registry of built modules with a configure -> build ->
//! run -> teardown lifecycle and diagnostics collection.
//!
//! Generalizes the teacher's `config::state::LoggerState` (a single fixed
//! `Vec<SinkConfig>` behind a global `RwLock`) into a name-keyed registry
//! any number of pluggable modules (console, json, memory, or an external
//! crate's rotation/webhook sink) register factories into.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::handler::Handler;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A unique id assigned to each factory-built module instance, generalizing
/// the teacher's `HandlerId` (a bare `usize` newtype over its sink list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u64);

pub trait ModuleFactory: Send + Sync {
    fn build(&self, config: &Config) -> Result<Arc<dyn Handler>>;
}

/// A module's kind, per `spec.md` §3's Module entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleType {
    Formatter,
    Middleware,
    Handler,
    Sink,
}

/// Optional reconfigure capability a module can expose so
/// `Registry::update_config` can apply new config in place instead of
/// rebuilding the module from scratch (`spec.md` §4.6).
pub type Reconfigure = Arc<dyn Fn(&Config) -> Result<()> + Send + Sync>;
pub type HealthCheck = Arc<dyn Fn() -> bool + Send + Sync>;
pub type Metrics = Arc<dyn Fn() -> AHashMap<String, f64> + Send + Sync>;

/// A live, named module entry: the built handler plus the metadata
/// `spec.md` §3 names (name, type, priority, enabled flag, optional health
/// check, optional metrics, optional config binding).
pub struct Module {
    pub name: String,
    pub module_type: ModuleType,
    pub priority: i32,
    pub handler: Arc<dyn Handler>,
    enabled: AtomicBool,
    reconfigure: Option<Reconfigure>,
    health: Option<HealthCheck>,
    metrics: Option<Metrics>,
}

impl Module {
    pub fn new(name: impl Into<String>, module_type: ModuleType, handler: Arc<dyn Handler>) -> Self {
        Module {
            name: name.into(),
            module_type,
            priority: 0,
            handler,
            enabled: AtomicBool::new(true),
            reconfigure: None,
            health: None,
            metrics: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reconfigure(mut self, f: Reconfigure) -> Self {
        self.reconfigure = Some(f);
        self
    }

    pub fn with_health_check(mut self, f: HealthCheck) -> Self {
        self.health = Some(f);
        self
    }

    pub fn with_metrics(mut self, f: Metrics) -> Self {
        self.metrics = Some(f);
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

/// A snapshot of a module's diagnostics fields, per `spec.md` §4.6
/// `collect_diagnostics`: `{name, type, enabled, optional health, optional
/// metrics, priority}`.
#[derive(Debug, Clone)]
pub struct ModuleDiagnostic {
    pub name: String,
    pub module_type: ModuleType,
    pub enabled: bool,
    pub health: Option<bool>,
    pub metrics: Option<AHashMap<String, f64>>,
    pub priority: i32,
}

struct FactoryEntry {
    factory: Arc<dyn ModuleFactory>,
}

#[derive(Debug, Clone, Default)]
pub struct FactoryDiagnostics {
    pub registered: Vec<String>,
    pub built: Vec<(String, ModuleId)>,
}

pub struct Registry {
    factories: RwLock<AHashMap<String, FactoryEntry>>,
    built: RwLock<AHashMap<ModuleId, Arc<dyn Handler>>>,
    next_id: std::sync::atomic::AtomicU64,
    factory_diagnostics: RwLock<FactoryDiagnostics>,
    modules: RwLock<AHashMap<String, Arc<Module>>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            factories: RwLock::new(AHashMap::new()),
            built: RwLock::new(AHashMap::new()),
            next_id: std::sync::atomic::AtomicU64::new(1),
            factory_diagnostics: RwLock::new(FactoryDiagnostics::default()),
            modules: RwLock::new(AHashMap::new()),
        }
    }

    // -- Factory lifecycle (register_factory / create_module / teardown) --

    /// Register a named factory. Names must be unique: re-registering an
    /// existing name is a configuration error rather than a silent replace,
    /// since a module's identity is load-bearing for routing/removal
    /// (`spec.md` §3 invariant 3: "double-registration with the same name
    /// replaces the existing entry only through an explicit update
    /// operation").
    pub fn register_factory(&self, name: impl Into<String>, factory: Arc<dyn ModuleFactory>) -> Result<()> {
        let name = name.into();
        let mut factories = self.factories.write();
        if factories.contains_key(&name) {
            return Err(Error::configuration(format!("module {name} already registered")));
        }
        factories.insert(name.clone(), FactoryEntry { factory });
        self.factory_diagnostics.write().registered.push(name);
        Ok(())
    }

    /// Configure and build a registered factory by name, returning the
    /// handler it produced along with the id assigned to track it through
    /// `teardown`.
    pub fn create_module(&self, name: &str, config: &Config) -> Result<(ModuleId, Arc<dyn Handler>)> {
        let factory = {
            let factories = self.factories.read();
            factories
                .get(name)
                .map(|e| e.factory.clone())
                .ok_or_else(|| Error::configuration(format!("module {name} is not registered")))?
        };
        let handler = factory.build(config).map_err(|e| {
            Error::initialization(format!("failed to build module {name}: {e}"))
        })?;
        let id = ModuleId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.built.write().insert(id, handler.clone());
        self.factory_diagnostics.write().built.push((name.to_string(), id));
        Ok((id, handler))
    }

    /// Tear down a previously built module instance, dropping its handler.
    pub fn teardown(&self, id: ModuleId) -> Result<()> {
        self.built
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::invalid_input(format!("no built module with id {id:?}")))
    }

    pub fn factory_diagnostics(&self) -> FactoryDiagnostics {
        self.factory_diagnostics.read().clone()
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    // -- Live named module registry (register / update_config / get / list) --

    /// Insert a fully-formed module into the live registry. Unique by
    /// name: registering over an existing name is rejected (use
    /// `update_config` to reconfigure in place).
    pub fn register(&self, module: Module) -> Result<()> {
        let mut modules = self.modules.write();
        if modules.contains_key(&module.name) {
            return Err(Error::configuration(format!("module {} already registered", module.name)));
        }
        modules.insert(module.name.clone(), Arc::new(module));
        Ok(())
    }

    /// Apply new config to a registered module. When the module exposes a
    /// reconfigure capability, it is invoked and the module is not
    /// rebuilt. Otherwise this is a configuration error: a caller without
    /// a reconfigure hook must tear down and re-register through its
    /// factory instead (`spec.md` §4.6).
    pub fn update_config(&self, name: &str, config: &Config) -> Result<()> {
        let module = {
            let modules = self.modules.read();
            modules
                .get(name)
                .cloned()
                .ok_or_else(|| Error::configuration(format!("module {name} is not registered")))?
        };
        match &module.reconfigure {
            Some(f) => f(config),
            None => Err(Error::configuration(format!(
                "module {name} exposes no reconfigure capability"
            ))),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.read().get(name).cloned()
    }

    pub fn list(&self) -> Vec<Arc<Module>> {
        self.modules.read().values().cloned().collect()
    }

    pub fn list_by_type(&self, module_type: ModuleType) -> Vec<Arc<Module>> {
        self.modules.read().values().filter(|m| m.module_type == module_type).cloned().collect()
    }

    /// Remove a module from the live registry (teardown).
    pub fn remove(&self, name: &str) -> Result<()> {
        self.modules
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::invalid_input(format!("no registered module named {name}")))
    }

    pub fn collect_diagnostics(&self) -> Vec<ModuleDiagnostic> {
        self.modules
            .read()
            .values()
            .map(|m| ModuleDiagnostic {
                name: m.name.clone(),
                module_type: m.module_type,
                enabled: m.enabled(),
                health: m.health.as_ref().map(|h| h()),
                metrics: m.metrics.as_ref().map(|f| f()),
                priority: m.priority,
            })
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
