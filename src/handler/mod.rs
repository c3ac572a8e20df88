//! The Handler interface and its composition strategies.
//!
//! Generalizes the teacher's `backend::logging::log_message`, which fans a
//! single call out to console/file/async-channel destinations inline, into
//! an explicit trait any number of concrete or composed destinations
//! implement uniformly.

pub mod chain;
pub mod fanout;
pub mod routing;

use crate::error::Result;
use crate::level::Level;
use crate::record::{Attribute, GroupState, Record};
use std::sync::Arc;

/// A destination (or composition of destinations) for records.
///
/// `with_attrs`/`with_group` return a *new* handler carrying extra bound
/// context rather than mutating `self`, so a caller can derive scoped
/// loggers from a shared parent without data races.
pub trait Handler: Send + Sync {
    /// Whether this handler (honoring its own shadowing level, if any)
    /// would process a record at `level`.
    fn enabled(&self, level: Level) -> bool;

    /// Process one record. Errors are reported but never cause the caller
    /// to stop producing — `core::Core` logs the error via its own
    /// diagnostics tap and moves on.
    fn handle(&self, record: &Record) -> Result<()>;

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler>;

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler>;

    /// A label used when a fan-out/routing child's error (or recovered
    /// panic) needs attributing to a specific handler. The default is
    /// generic; concrete sinks and named routes override it.
    fn name(&self) -> &str {
        "handler"
    }
}

/// Run `handle`, converting a child panic into a `Processing` error tagged
/// with `handler_name` instead of unwinding past the fan-out/routing
/// dispatch loop (`spec.md` §4.3: "Panics in a child are recovered and
/// converted to errors with the handler name").
pub(crate) fn handle_recovering_panics(
    handler: &dyn Handler,
    handler_name: &str,
    record: &Record,
) -> crate::error::Result<()> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.handle(record))) {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(crate::error::Error::processing(format!(
                "handler \"{handler_name}\" panicked: {detail}"
            )))
        }
    }
}

/// Bound context shared by leaf handlers that wrap a terminal encoder
/// (console/json/memory sinks): accumulated attributes plus group-name
/// prefix state, merged onto every record at handling time.
#[derive(Debug, Clone, Default)]
pub struct BoundContext {
    pub attrs: Vec<Attribute>,
    pub groups: GroupState,
}

impl BoundContext {
    pub fn push_attrs(&self, attrs: Vec<Attribute>) -> BoundContext {
        let mut merged = self.attrs.clone();
        merged.extend(attrs);
        BoundContext { attrs: merged, groups: self.groups.clone() }
    }

    /// An empty group name is a no-op (`spec.md` §8 boundary behaviors:
    /// "Empty group name on `WithGroup`: returns the receiver unchanged").
    pub fn push_group(&self, name: &str) -> BoundContext {
        if name.is_empty() {
            return self.clone();
        }
        BoundContext { attrs: self.attrs.clone(), groups: self.groups.push(name) }
    }

    /// Apply group-name prefixing and merge with a record's own attributes,
    /// per the record-wins-on-conflict rule (`record::merge_attrs`).
    pub fn resolve(&self, record: &Record) -> Vec<Attribute> {
        let prefixed_context: Vec<Attribute> = self
            .attrs
            .iter()
            .map(|a| Attribute { key: self.groups.prefix_key(&a.key), value: a.value.clone() })
            .collect();
        crate::record::merge_attrs(&prefixed_context, &record.attrs)
    }
}
