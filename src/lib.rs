//! # logcore
//!
//! Core of a structured logging library: an immutable record/attribute
//! model, dynamic level control, composable handlers (fan-out, routing,
//! chaining), a pluggable extension pipeline (including a DLP redactor), a
//! non-blocking subscriber broadcast channel, a token-bucket rate limiter,
//! tiered buffer/string pools, and a generic LRU cache.
//!
//! ## Architecture
//!
//! - `record`: the `Record`/`Attribute`/`Value` model and group-name state
//! - `level`: global + per-handler level control and watch callbacks
//! - `handler`: the `Handler` trait and its fan-out/routing/chain composition
//! - `ext`: the extension pipeline (prefix extraction, formatters, context
//!   propagation, diagnostics)
//! - `dlp`: the redaction engine
//! - `registry`: the named plugin registry modules build handlers from
//! - `subscriber`: the bounded broadcast channel
//! - `ratelimit`: the token-bucket rate limiter
//! - `pool`, `lru`: shared tiered pools and a generic LRU cache
//! - `sink`: example terminal encoders (console, JSON, in-memory)
//! - `core`: the process-wide `Core` the free functions below operate on
//!
//! ## Facade
//!
//! A thin, free-function API sits on top of a process-wide [`Core`],
//! mirroring how a typical structured-logging library lets callers log
//! without threading a logger instance through every call site, while
//! still allowing a caller to build and own an explicit `Core` for
//! scoped or multi-tenant use.

mod config;
pub mod core;
pub mod dlp;
pub mod error;
pub mod ext;
pub mod handler;
pub mod level;
mod lru;
mod pool;
pub mod ratelimit;
pub mod record;
pub mod registry;
pub mod runtime;
pub mod sink;
mod subscriber;

pub use config::{Config, ConfigValue};
pub use core::Core;
pub use dlp::DlpEngine;
pub use error::{Error, ErrorKind, Result};
pub use level::Level;
pub use lru::LruCache;
pub use pool::{BufferPool, StringPool, Tier, TierStats};
pub use record::{Attribute, GroupState, Record, Value};
pub use subscriber::{Broadcast, CancelHandle, ReceiveHandle, Subscriber};

use once_cell::sync::Lazy;

static GLOBAL: Lazy<Core> = Lazy::new(|| Core::new(Level::INFO));

/// The process-wide `Core` the free functions in this module operate on.
pub fn global() -> &'static Core {
    &GLOBAL
}

pub fn set_level(level: Level) {
    GLOBAL.set_level(level);
}

/// Set the global level from a `Level`, a known integer ordinal, or a
/// case-insensitive name (`"warn"`, `"WARNING"`, ...). Returns an error and
/// leaves the level unchanged for an unrecognized value.
pub fn set_level_parsed(input: impl level::IntoLevel) -> error::Result<()> {
    GLOBAL.set_level_parsed(input)
}

pub fn level() -> Level {
    GLOBAL.level()
}

/// Register an observer fired on every global level change. See
/// `Core::watch_level`.
pub fn watch_level(name: impl Into<String>, f: impl Fn(Level) + Send + Sync + 'static) {
    GLOBAL.watch_level(name, f);
}

pub fn unwatch_level(name: &str) {
    GLOBAL.unwatch_level(name);
}

pub fn set_root_handler(handler: std::sync::Arc<dyn handler::Handler>) {
    GLOBAL.set_root_handler(handler);
}

/// Subscribe to every record the global core emits. See `Core::subscribe`.
pub fn subscribe(buffer_size: usize) -> (ReceiveHandle, CancelHandle) {
    GLOBAL.subscribe(buffer_size)
}

pub fn trace(message: impl Into<String>) -> Result<()> {
    GLOBAL.trace(message)
}

pub fn debug(message: impl Into<String>) -> Result<()> {
    GLOBAL.debug(message)
}

pub fn info(message: impl Into<String>) -> Result<()> {
    GLOBAL.info(message)
}

pub fn warn(message: impl Into<String>) -> Result<()> {
    GLOBAL.warn(message)
}

pub fn error(message: impl Into<String>) -> Result<()> {
    GLOBAL.error(message)
}

pub fn fatal(message: impl Into<String>) -> Result<()> {
    GLOBAL.fatal(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemorySink;

    #[test]
    fn facade_dispatches_through_the_global_core() {
        set_level(Level::TRACE);
        let sink = MemorySink::new(Level::TRACE);
        set_root_handler(sink.clone());
        info("hello from the facade").unwrap();
        assert!(sink.records().iter().any(|r| r.message == "hello from the facade"));
    }

    #[test]
    fn set_level_parsed_accepts_a_name_and_rejects_garbage() {
        set_level_parsed("debug").unwrap();
        assert_eq!(level(), Level::DEBUG);
        assert!(set_level_parsed("not-a-level").is_err());
        assert_eq!(level(), Level::DEBUG);
    }
}
