//! Fan-out composition: dispatch one record to every child concurrently.
//!
//! Grounded on the teacher's `backend::logging::log_message`, which already
//! dispatches a single log call to several destinations (console, file,
//! async channel) from one call site; here that is made explicit and
//! parallel via `rayon`, matching the crate's concurrency model (§5 of
//! `SPEC_FULL.md`: "Handler dispatch for fan-out and routing is parallel").

use super::{handle_recovering_panics, Handler};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::record::{Attribute, Record};
use std::sync::Arc;

pub struct FanOut {
    children: Vec<Arc<dyn Handler>>,
}

impl FanOut {
    pub fn new(children: Vec<Arc<dyn Handler>>) -> Arc<Self> {
        Arc::new(FanOut { children })
    }
}

impl Handler for FanOut {
    fn enabled(&self, level: Level) -> bool {
        self.children.iter().any(|c| c.enabled(level))
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let errors: Vec<Error> = self
            .children
            .par_iter_filter_map(record)
            .into_iter()
            .collect();
        match Error::join(errors) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        let children = self
            .children
            .iter()
            .cloned()
            .map(|c| c.with_attrs(attrs.clone()))
            .collect();
        FanOut::new(children)
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        let children = self.children.iter().cloned().map(|c| c.with_group(name)).collect();
        FanOut::new(children)
    }
}

/// Small private extension trait keeping the `rayon` fan-out call compact
/// and giving `handle` a single, readable expression.
trait ParIterFilterMap {
    fn par_iter_filter_map(&self, record: &Record) -> Vec<Error>;
}

impl ParIterFilterMap for Vec<Arc<dyn Handler>> {
    fn par_iter_filter_map(&self, record: &Record) -> Vec<Error> {
        use rayon::prelude::*;
        self.par_iter()
            .filter(|c| c.enabled(record.level))
            .filter_map(|c| handle_recovering_panics(c.as_ref(), c.name(), record).err())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemorySink;

    #[test]
    fn dispatches_to_every_enabled_child() {
        let a = MemorySink::new(Level::INFO);
        let b = MemorySink::new(Level::INFO);
        let fanout = FanOut::new(vec![a.clone() as Arc<dyn Handler>, b.clone() as Arc<dyn Handler>]);
        fanout.handle(&Record::new(Level::INFO, "hello")).unwrap();
        assert_eq!(a.records().len(), 1);
        assert_eq!(b.records().len(), 1);
    }

    #[test]
    fn one_failing_child_does_not_stop_others() {
        let a = MemorySink::new(Level::INFO);
        let failing = crate::sink::memory::FailingSink::new();
        let fanout =
            FanOut::new(vec![a.clone() as Arc<dyn Handler>, failing as Arc<dyn Handler>]);
        let result = fanout.handle(&Record::new(Level::INFO, "hello"));
        assert!(result.is_err());
        assert_eq!(a.records().len(), 1);
    }

    #[test]
    fn a_panicking_child_is_recovered_as_an_error_and_others_still_run() {
        let a = MemorySink::new(Level::INFO);
        let panicking = crate::sink::memory::PanickingSink::new();
        let fanout =
            FanOut::new(vec![a.clone() as Arc<dyn Handler>, panicking as Arc<dyn Handler>]);
        let result = fanout.handle(&Record::new(Level::INFO, "hello"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("panicking-sink"));
        assert_eq!(a.records().len(), 1);
    }

    #[test]
    fn disabled_children_are_skipped() {
        let low = MemorySink::new(Level::ERROR);
        let fanout = FanOut::new(vec![low.clone() as Arc<dyn Handler>]);
        fanout.handle(&Record::new(Level::INFO, "hello")).unwrap();
        assert_eq!(low.records().len(), 0);
    }
}
