//! An in-process `Vec<Record>` collector. Used by tests (and anything that
//! wants to inspect what a handler received without real I/O); not part of
//! the spec's named components, purely a test fixture.

use crate::error::{Error, Result};
use crate::handler::{BoundContext, Handler};
use crate::level::Level;
use crate::record::{Attribute, Record};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct MemorySink {
    level: Level,
    context: BoundContext,
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(MemorySink { level, context: BoundContext::default(), records: Mutex::new(Vec::new()) })
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }
}

impl Handler for MemorySink {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let mut resolved = record.clone();
        resolved.attrs = self.context.resolve(record).into();
        self.records.lock().push(resolved);
        Ok(())
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        Arc::new(MemorySink {
            level: self.level,
            context: self.context.push_attrs(attrs),
            records: Mutex::new(Vec::new()),
        })
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        Arc::new(MemorySink {
            level: self.level,
            context: self.context.push_group(name),
            records: Mutex::new(Vec::new()),
        })
    }
}

/// A handler that always fails, used to exercise fan-out/chain/routing
/// error-joining behavior.
pub struct FailingSink;

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(FailingSink)
    }
}

impl Handler for FailingSink {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn handle(&self, _record: &Record) -> Result<()> {
        Err(Error::processing("sink always fails"))
    }

    fn with_attrs(self: Arc<Self>, _attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        self
    }

    fn with_group(self: Arc<Self>, _name: &str) -> Arc<dyn Handler> {
        self
    }

    fn name(&self) -> &str {
        "failing-sink"
    }
}

/// A handler that panics on every `handle` call, used to exercise the
/// fan-out/routing panic-recovery path.
pub struct PanickingSink;

impl PanickingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(PanickingSink)
    }
}

impl Handler for PanickingSink {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn handle(&self, _record: &Record) -> Result<()> {
        panic!("sink always panics");
    }

    fn with_attrs(self: Arc<Self>, _attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        self
    }

    fn with_group(self: Arc<Self>, _name: &str) -> Arc<dyn Handler> {
        self
    }

    fn name(&self) -> &str {
        "panicking-sink"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_records_above_its_level() {
        let sink = MemorySink::new(Level::WARN);
        assert!(!sink.enabled(Level::INFO));
        assert!(sink.enabled(Level::ERROR));
    }

    #[test]
    fn with_attrs_does_not_affect_original() {
        let sink = MemorySink::new(Level::INFO);
        let child = sink.clone().with_attrs(vec![Attribute::string("k", "v")]);
        child.handle(&Record::new(Level::INFO, "hi")).unwrap();
        assert_eq!(sink.records().len(), 0);
    }
}
