//! Level control: a global atomic level, per-handler shadowing levels, and
//! watch callbacks dispatched off the producer's path.
//!
//! Generalizes the teacher's `utils::levels` (`to_level`/`level_to_str`
//! conversions atop `tracing::Level`) into a self-hosted ordinal type, since
//! the crate no longer builds on `tracing`.

use crossbeam_channel::{Sender, unbounded};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;

use crate::error::Error;

/// A log severity. Higher is more severe. Matches the ordinals conventional
/// structured-logging libraries use so numeric comparisons with external
/// systems stay meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub i32);

impl Level {
    pub const TRACE: Level = Level(-8);
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);
    pub const FATAL: Level = Level(12);

    pub fn name(&self) -> &'static str {
        match self.0 {
            i32::MIN..=-8 => "TRACE",
            -7..=-4 => "DEBUG",
            -3..=0 => "INFO",
            1..=4 => "WARN",
            5..=8 => "ERROR",
            _ => "FATAL",
        }
    }

    pub fn parse(name: &str) -> Result<Level, Error> {
        match name.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Level::TRACE),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARN" | "WARNING" => Ok(Level::WARN),
            "ERROR" => Ok(Level::ERROR),
            "FATAL" | "CRITICAL" => Ok(Level::FATAL),
            other => Err(Error::invalid_input(format!("unknown level name: {other}"))),
        }
    }
}

/// Anything `set_level` accepts: a `Level` directly, the known ordinal as an
/// integer, or a case-insensitive level name. Unifies the three forms
/// `spec.md` §4.2 lists for `set_level`, which Rust expresses as one
/// trait with three impls rather than overloading.
pub trait IntoLevel {
    fn into_level(self) -> Result<Level, Error>;
}

impl IntoLevel for Level {
    fn into_level(self) -> Result<Level, Error> {
        Ok(self)
    }
}

impl IntoLevel for i32 {
    fn into_level(self) -> Result<Level, Error> {
        match self {
            n if n == Level::TRACE.0 => Ok(Level::TRACE),
            n if n == Level::DEBUG.0 => Ok(Level::DEBUG),
            n if n == Level::INFO.0 => Ok(Level::INFO),
            n if n == Level::WARN.0 => Ok(Level::WARN),
            n if n == Level::ERROR.0 => Ok(Level::ERROR),
            n if n == Level::FATAL.0 => Ok(Level::FATAL),
            other => Err(Error::invalid_input(format!("unknown level value: {other}"))),
        }
    }
}

impl IntoLevel for &str {
    fn into_level(self) -> Result<Level, Error> {
        Level::parse(self)
    }
}

type Watcher = Box<dyn Fn(Level) + Send + Sync>;

/// Process-wide level state: an atomic integer for lock-free reads on the
/// hot path, plus a named watcher list dispatched on a dedicated background
/// thread so a slow observer never blocks a producer setting the level.
pub struct LevelControl {
    global: AtomicI32,
    watchers: RwLock<Vec<(String, Watcher)>>,
    dispatch: Sender<Level>,
}

impl LevelControl {
    /// Build a new level control and the receiver its dispatch loop must be
    /// started with (via `run_dispatch_loop`). Split in two so construction
    /// doesn't implicitly spawn a thread — callers decide when to start it,
    /// and tests can drive the channel directly without one at all.
    pub fn new(initial: Level) -> (Self, crossbeam_channel::Receiver<Level>) {
        let (tx, rx) = unbounded::<Level>();
        let control = LevelControl {
            global: AtomicI32::new(initial.0),
            watchers: RwLock::new(Vec::new()),
            dispatch: tx,
        };
        (control, rx)
    }

    pub fn get(&self) -> Level {
        Level(self.global.load(Ordering::Acquire))
    }

    pub fn set(&self, level: Level) {
        self.global.store(level.0, Ordering::Release);
        let _ = self.dispatch.try_send(level);
    }

    /// Register an observer under `name`, fired (in registration order,
    /// alongside every other observer) on every subsequent level change.
    /// Registering a second observer under the same name replaces the first.
    pub fn watch(&self, name: impl Into<String>, f: impl Fn(Level) + Send + Sync + 'static) {
        let name = name.into();
        let mut watchers = self.watchers.write();
        if let Some(slot) = watchers.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = Box::new(f);
        } else {
            watchers.push((name, Box::new(f)));
        }
    }

    /// Remove the observer registered under `name`, if any. A name that was
    /// never registered (or already removed) is a no-op.
    pub fn unwatch(&self, name: &str) {
        self.watchers.write().retain(|(n, _)| n != name);
    }

    fn notify(&self, level: Level) {
        for (_, w) in self.watchers.read().iter() {
            w(level);
        }
    }

    /// Run the watcher-dispatch loop. Spawned as its own OS thread by
    /// `core::Core::new` so `set()` never blocks on a slow watcher.
    pub fn run_dispatch_loop(self: std::sync::Arc<Self>, rx: crossbeam_channel::Receiver<Level>) {
        thread::spawn(move || {
            for level in rx.iter() {
                self.notify(level);
            }
        });
    }
}

/// A handler's own level, if set, fully shadows the global level: it does
/// not take the stricter (or laxer) of the two, per the per-instance
/// override semantics the crate documents.
pub fn effective_level(global: Level, instance: Option<Level>) -> Level {
    instance.unwrap_or(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!(Level::parse("info").unwrap(), Level::INFO);
        assert_eq!(Level::parse("WARNING").unwrap(), Level::WARN);
        assert!(Level::parse("bogus").is_err());
    }

    #[test]
    fn into_level_accepts_level_int_or_name() {
        assert_eq!(Level::INFO.into_level().unwrap(), Level::INFO);
        assert_eq!(4i32.into_level().unwrap(), Level::WARN);
        assert_eq!("error".into_level().unwrap(), Level::ERROR);
    }

    #[test]
    fn into_level_rejects_an_unknown_integer() {
        assert!(7i32.into_level().is_err());
    }

    #[test]
    fn instance_level_fully_shadows_global() {
        assert_eq!(effective_level(Level::INFO, Some(Level::TRACE)), Level::TRACE);
        assert_eq!(effective_level(Level::INFO, None), Level::INFO);
    }

    #[test]
    fn set_updates_get_immediately() {
        let (control, _rx) = LevelControl::new(Level::INFO);
        control.set(Level::ERROR);
        assert_eq!(control.get(), Level::ERROR);
    }

    #[test]
    fn watchers_fire_on_dedicated_thread() {
        let (control, rx) = LevelControl::new(Level::INFO);
        let control = Arc::new(control);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        control.watch("counter", move |_lvl| {
            calls2.fetch_add(1, Ordering::SeqCst);
        });
        LevelControl::run_dispatch_loop(control.clone(), rx);
        control.set(Level::DEBUG);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unwatch_stops_further_notifications() {
        let (control, rx) = LevelControl::new(Level::INFO);
        let control = Arc::new(control);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        control.watch("counter", move |_lvl| {
            calls2.fetch_add(1, Ordering::SeqCst);
        });
        LevelControl::run_dispatch_loop(control.clone(), rx);
        control.set(Level::DEBUG);
        thread::sleep(Duration::from_millis(50));
        control.unwatch("counter");
        control.set(Level::ERROR);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registering_same_name_twice_replaces_the_observer() {
        let (control, _rx) = LevelControl::new(Level::INFO);
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));
        let a2 = calls_a.clone();
        control.watch("slot", move |_lvl| {
            a2.fetch_add(1, Ordering::SeqCst);
        });
        let b2 = calls_b.clone();
        control.watch("slot", move |_lvl| {
            b2.fetch_add(1, Ordering::SeqCst);
        });
        control.notify(Level::ERROR);
        assert_eq!(calls_a.load(Ordering::SeqCst), 0);
        assert_eq!(calls_b.load(Ordering::SeqCst), 1);
    }
}
