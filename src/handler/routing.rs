//! Routing composition: a base handler plus a name -> handler map, with a
//! routing function choosing which named branch (if any) also receives a
//! record in addition to the base.
//!
//! Grounded on the teacher's per-sink `filter_module`/`filter_function`
//! checks in `backend::logging::log_message`, generalized from "does this
//! one sink accept the record" into "which named branch does this record
//! route to".

use super::{handle_recovering_panics, Handler};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::record::{Attribute, Record};
use ahash::AHashMap;
use std::sync::Arc;

/// Chooses zero or more named branches (in addition to the base handler) a
/// record also routes to. `spec.md` §4.3: "a router function `record -> list
/// of module names`".
pub type RouteFn = Arc<dyn Fn(&Record) -> Vec<String> + Send + Sync>;

pub struct Router {
    base: Arc<dyn Handler>,
    routes: AHashMap<String, Arc<dyn Handler>>,
    route_fn: RouteFn,
}

impl Router {
    pub fn new(
        base: Arc<dyn Handler>,
        routes: AHashMap<String, Arc<dyn Handler>>,
        route_fn: RouteFn,
    ) -> Arc<Self> {
        Arc::new(Router { base, routes, route_fn })
    }
}

impl Handler for Router {
    fn enabled(&self, level: Level) -> bool {
        self.base.enabled(level) || self.routes.values().any(|h| h.enabled(level))
    }

    fn handle(&self, record: &Record) -> Result<()> {
        // Unknown route names are dropped here; only names present in
        // `self.routes` reach the dispatch list.
        let matched: Vec<&Arc<dyn Handler>> = (self.route_fn)(record)
            .into_iter()
            .filter_map(|name| self.routes.get(&name))
            .collect();

        let mut targets: Vec<(&str, &dyn Handler)> = Vec::with_capacity(1 + matched.len());
        if self.base.enabled(record.level) {
            targets.push((self.base.name(), self.base.as_ref()));
        }
        for handler in matched {
            if handler.enabled(record.level) {
                targets.push((handler.name(), handler.as_ref()));
            }
        }

        use rayon::prelude::*;
        let errors: Vec<Error> = targets
            .par_iter()
            .filter_map(|(name, handler)| handle_recovering_panics(*handler, name, record).err())
            .collect();

        match Error::join(errors) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        let base = self.base.clone().with_attrs(attrs.clone());
        let routes = self
            .routes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().with_attrs(attrs.clone())))
            .collect();
        Router::new(base, routes, self.route_fn.clone())
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        let base = self.base.clone().with_group(name);
        let routes =
            self.routes.iter().map(|(k, v)| (k.clone(), v.clone().with_group(name))).collect();
        Router::new(base, routes, self.route_fn.clone())
    }
}
