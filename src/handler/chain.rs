//! Sequential two-handler composition: `first` runs, then `second`, both
//! seeing the same record. Useful for e.g. "mirror every record to an audit
//! sink, then hand it to the real destination" without reaching for the
//! full fan-out machinery.

use super::Handler;
use crate::error::{Error, Result};
use crate::level::Level;
use crate::record::{Attribute, Record};
use std::sync::Arc;

pub struct Chain {
    first: Arc<dyn Handler>,
    second: Arc<dyn Handler>,
}

impl Chain {
    pub fn new(first: Arc<dyn Handler>, second: Arc<dyn Handler>) -> Arc<Self> {
        Arc::new(Chain { first, second })
    }
}

impl Handler for Chain {
    fn enabled(&self, level: Level) -> bool {
        self.first.enabled(level) || self.second.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let mut errors = Vec::new();
        if self.first.enabled(record.level) {
            if let Err(e) = self.first.handle(record) {
                errors.push(e);
            }
        }
        if self.second.enabled(record.level) {
            if let Err(e) = self.second.handle(record) {
                errors.push(e);
            }
        }
        match Error::join(errors) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        Chain::new(self.first.clone().with_attrs(attrs.clone()), self.second.clone().with_attrs(attrs))
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        Chain::new(self.first.clone().with_group(name), self.second.clone().with_group(name))
    }
}
