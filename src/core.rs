//! The process-wide `Core` and the free-function facade built on top of
//! it (see `lib.rs`).
//!
//! Generalizes the teacher's `logger::PyLogger` (a PyO3 class wrapping
//! `configure`/`add`/`remove`/per-level log methods) into a plain Rust
//! struct, and reuses `config::state`'s `with_state`/global-`Lazy` pattern
//! for the process-wide singleton the facade functions operate on.

use crate::dlp::DlpEngine;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::level::{IntoLevel, Level, LevelControl};
use crate::ratelimit::RateLimiter;
use crate::record::{Attribute, Record};
use crate::registry::{Module, ModuleDiagnostic, ModuleFactory, ModuleId, ModuleType, Registry};
use crate::subscriber::{Broadcast, CancelHandle, ReceiveHandle};
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The shared, thread-safe logging core: level control, the module
/// registry, a rate limiter, the subscriber broadcast layer, the
/// text/json/dlp feature toggles the runtime control panel flips, and the
/// currently active root handler records are dispatched to.
pub struct Core {
    level: Arc<LevelControl>,
    registry: Registry,
    rate_limiter: RateLimiter,
    root: ArcSwapOption<dyn Handler>,
    broadcast: Arc<Broadcast>,
    text_enabled: AtomicBool,
    json_enabled: AtomicBool,
    dlp_enabled: AtomicBool,
    dlp: ArcSwapOption<DlpEngine>,
}

impl Core {
    pub fn new(initial_level: Level) -> Self {
        let (control, rx) = LevelControl::new(initial_level);
        let control = Arc::new(control);
        control.clone().run_dispatch_loop(rx);
        Core {
            level: control,
            registry: Registry::new(),
            rate_limiter: RateLimiter::new(f64::INFINITY, f64::INFINITY),
            root: ArcSwapOption::empty(),
            broadcast: Broadcast::new(),
            text_enabled: AtomicBool::new(true),
            json_enabled: AtomicBool::new(false),
            dlp_enabled: AtomicBool::new(false),
            dlp: ArcSwapOption::empty(),
        }
    }

    /// Install the DLP engine the `dlp_enabled`/`dlp_version` control-panel
    /// fields report on. Swapping the engine also changes `dlp_version`,
    /// since the new engine starts at its own version counter.
    pub fn set_dlp_engine(&self, engine: Arc<DlpEngine>) {
        self.dlp.store(Some(engine));
    }

    pub fn set_text_enabled(&self, enabled: bool) {
        self.text_enabled.store(enabled, Ordering::Release);
    }

    pub fn text_enabled(&self) -> bool {
        self.text_enabled.load(Ordering::Acquire)
    }

    pub fn set_json_enabled(&self, enabled: bool) {
        self.json_enabled.store(enabled, Ordering::Release);
    }

    pub fn json_enabled(&self) -> bool {
        self.json_enabled.load(Ordering::Acquire)
    }

    pub fn set_dlp_enabled(&self, enabled: bool) {
        self.dlp_enabled.store(enabled, Ordering::Release);
    }

    pub fn dlp_enabled(&self) -> bool {
        self.dlp_enabled.load(Ordering::Acquire)
    }

    /// The installed DLP engine's version counter, or 0 if none is
    /// installed.
    pub fn dlp_version(&self) -> u64 {
        self.dlp.load().as_ref().map(|e| e.version()).unwrap_or(0)
    }

    /// Subscribe to every record this core emits to its root handler. See
    /// `spec.md` §4.7: delivery never blocks the emitting task, and an
    /// overflowing subscriber drops records under the sliding-window policy
    /// rather than stalling `log`.
    pub fn subscribe(&self, buffer_size: usize) -> (ReceiveHandle, CancelHandle) {
        self.broadcast.subscribe(buffer_size)
    }

    pub fn subscriber_dropped_count(&self) -> u64 {
        self.broadcast.dropped_count()
    }

    pub fn level(&self) -> Level {
        self.level.get()
    }

    pub fn set_level(&self, level: Level) {
        self.level.set(level);
    }

    /// Parse `input` (a `Level`, a known integer ordinal, or a
    /// case-insensitive level name) and apply it, or return an error for an
    /// unrecognized value without touching the current level.
    pub fn set_level_parsed(&self, input: impl IntoLevel) -> Result<()> {
        let level = input.into_level()?;
        self.level.set(level);
        Ok(())
    }

    pub fn watch_level(&self, name: impl Into<String>, f: impl Fn(Level) + Send + Sync + 'static) {
        self.level.watch(name, f);
    }

    pub fn unwatch_level(&self, name: &str) {
        self.level.unwatch(name);
    }

    pub fn set_root_handler(&self, handler: Arc<dyn Handler>) {
        self.root.store(Some(handler));
    }

    pub fn register_module(&self, name: impl Into<String>, factory: Arc<dyn ModuleFactory>) -> Result<()> {
        self.registry.register_factory(name, factory)
    }

    pub fn build_module(
        &self,
        name: &str,
        config: &crate::config::Config,
    ) -> Result<(ModuleId, Arc<dyn Handler>)> {
        self.registry.create_module(name, config)
    }

    pub fn teardown_module(&self, id: ModuleId) -> Result<()> {
        self.registry.teardown(id)
    }

    pub fn registered_modules(&self) -> Vec<String> {
        self.registry.registered_names()
    }

    /// Insert a fully-formed module (with type/priority/health/metrics) into
    /// the live registry, per `spec.md` §4.6's `register(module)`.
    pub fn register_live_module(&self, module: Module) -> Result<()> {
        self.registry.register(module)
    }

    /// Apply new config to a registered module in place via its
    /// reconfigure capability (`spec.md` §4.6's `update_config`).
    pub fn update_module_config(&self, name: &str, config: &crate::config::Config) -> Result<()> {
        self.registry.update_config(name, config)
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<Module>> {
        self.registry.get(name)
    }

    pub fn list_modules(&self) -> Vec<Arc<Module>> {
        self.registry.list()
    }

    pub fn list_modules_by_type(&self, module_type: ModuleType) -> Vec<Arc<Module>> {
        self.registry.list_by_type(module_type)
    }

    pub fn collect_module_diagnostics(&self) -> Vec<ModuleDiagnostic> {
        self.registry.collect_diagnostics()
    }

    /// Atomically reconfigure the rate limiter's rate, burst capacity, and
    /// enabled flag, refilling the bucket to the new burst (`spec.md` §4.8).
    pub fn configure_rate_limiter(&self, rate_per_sec: f64, burst: f64, enabled: bool) {
        self.rate_limiter.configure(rate_per_sec, burst, enabled);
    }

    pub fn set_rate_limiter(&self, rate_per_sec: f64, burst: f64) {
        self.rate_limiter.set_rate(rate_per_sec);
        self.rate_limiter.set_burst(burst);
    }

    pub fn set_rate_limiter_enabled(&self, enabled: bool) {
        self.rate_limiter.set_enabled(enabled);
    }

    pub fn rate_limiter_enabled(&self) -> bool {
        self.rate_limiter.enabled()
    }

    /// Emit a record through the rate limiter, the global level gate, and
    /// the root handler. Returns `Ok(())` even when the record was dropped
    /// by the rate limiter or a level check — only handler-side failures
    /// are reported as errors.
    pub fn log(&self, level: Level, message: impl Into<String>, attrs: Vec<Attribute>) -> Result<()> {
        if level < self.level.get() {
            return Ok(());
        }
        if !self.rate_limiter.try_acquire() {
            return Ok(());
        }
        let record = Record::new(level, message).with_attrs(attrs);
        let result = match self.root.load().as_ref() {
            Some(handler) if handler.enabled(level) => handler.handle(&record),
            _ => Ok(()),
        };
        self.broadcast.publish(&record);
        result
    }

    pub fn trace(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::TRACE, message, Vec::new())
    }

    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::DEBUG, message, Vec::new())
    }

    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::INFO, message, Vec::new())
    }

    pub fn warn(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::WARN, message, Vec::new())
    }

    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::ERROR, message, Vec::new())
    }

    pub fn fatal(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::FATAL, message, Vec::new())
    }
}

/// Validate a level name the same way `runtime::handle_post` does, for
/// callers that want to fail fast on a bad level string before touching
/// shared state. Kept as a standalone helper since `Level::parse` already
/// returns the crate's `Error` type.
pub fn validate_level_name(name: &str) -> Result<Level> {
    Level::parse(name).map_err(|e| Error::invalid_input(format!("invalid level: {e}")))
}
