//! A single context propagator function: derives extra attributes from a
//! record's existing ones (e.g. deriving `trace_id` from a carried
//! `request_id`), run once per record ahead of the formatter chain.

use crate::record::Attribute;

pub type ContextPropagator = std::sync::Arc<dyn Fn(&[Attribute]) -> Vec<Attribute> + Send + Sync>;
