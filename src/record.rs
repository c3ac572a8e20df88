//! The Record & Attribute model: an immutable log event plus its typed,
//! ordered attribute list and copy-on-write group-name state.
//!
//! Generalizes the teacher's fixed `format::json::JsonRecord` struct (one
//! field per well-known column, `fields: serde_json::Value` for the rest)
//! into a fully open attribute bag: every record is just a message plus an
//! ordered `Attribute` list, well-known fields included.

use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// Lazy-value resolution stops after this many hops, so a resolver that
/// keeps producing another `Lazy` can't recurse forever.
pub const MAX_LAZY_RESOLVE_DEPTH: u8 = 16;

/// A typed attribute value. `LazyValue` defers computation until a handler
/// actually resolves it, and resolution is depth-limited so a misbehaving
/// lazy value can't recurse forever.
#[derive(Clone)]
pub enum Value {
    String(String),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    Bool(bool),
    Duration(std::time::Duration),
    Time(DateTime<Utc>),
    Group(Vec<Attribute>),
    Any(Arc<dyn std::any::Any + Send + Sync>),
    Lazy(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.resolve(MAX_LAZY_RESOLVE_DEPTH) {
            Value::String(s) => serializer.serialize_str(&s),
            Value::Int64(i) => serializer.serialize_i64(i),
            Value::Uint64(u) => serializer.serialize_u64(u),
            Value::Float64(f) => serializer.serialize_f64(f),
            Value::Bool(b) => serializer.serialize_bool(b),
            Value::Duration(d) => serializer.serialize_f64(d.as_secs_f64()),
            Value::Time(t) => serializer.serialize_str(&t.to_rfc3339()),
            Value::Group(attrs) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(attrs.len()))?;
                for a in &attrs {
                    map.serialize_entry(&a.key, &a.value)?;
                }
                map.end()
            }
            Value::Any(_) => serializer.serialize_str("<any>"),
            // `resolve` already unwraps lazy values up to the depth limit;
            // reaching this arm means the limit was hit.
            Value::Lazy(_) => serializer.serialize_str("<unresolved>"),
        }
    }
}

impl Value {
    /// Resolve nested `Lazy` values up to `max_depth` levels, returning the
    /// first non-lazy value encountered (or the last `Lazy` seen if the
    /// depth limit is hit, to avoid unbounded recursion from a buggy
    /// producer).
    pub fn resolve(&self, max_depth: u8) -> Value {
        let mut current = self.clone();
        let mut depth = 0;
        while let Value::Lazy(f) = current {
            if depth >= max_depth {
                return Value::String("<lazy value exceeded resolution depth>".to_string());
            }
            current = f();
            depth += 1;
        }
        current
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Uint64(u) => write!(f, "{u}"),
            Value::Float64(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Duration(d) => write!(f, "{d:?}"),
            Value::Time(t) => write!(f, "{t:?}"),
            Value::Group(attrs) => write!(f, "{attrs:?}"),
            Value::Any(_) => write!(f, "<any>"),
            Value::Lazy(_) => write!(f, "<lazy>"),
        }
    }
}

/// A single key/value pair carried on a record or a handler's bound
/// context. Cloning an `Attribute` is cheap: strings and groups share their
/// backing allocation through `Value`'s `Arc`-backed variants where it
/// matters (`Any`, `Lazy`), scalars are copied.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Attribute { key: key.into(), value }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn int64(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int64(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attribute>) -> Self {
        Self::new(key, Value::Group(attrs))
    }

    pub fn lazy(key: impl Into<String>, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self::new(key, Value::Lazy(Arc::new(f)))
    }
}

/// Ordered, copy-on-write group-name prefix state. Cloning a `GroupState`
/// and pushing a name costs one `Arc` bump plus one small `Vec` clone; it
/// never mutates a state another handler still holds a reference to.
#[derive(Debug, Clone, Default)]
pub struct GroupState(Arc<Vec<String>>);

impl GroupState {
    pub fn push(&self, name: impl Into<String>) -> GroupState {
        let mut names = (*self.0).clone();
        names.push(name.into());
        GroupState(Arc::new(names))
    }

    /// The dotted prefix this group state applies to a bare attribute key,
    /// e.g. `["request", "http"]` + key `"status"` -> `"request.http.status"`.
    pub fn prefix_key(&self, key: &str) -> String {
        if self.0.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.0.join("."), key)
        }
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// An immutable log event: a message, a level, a capture timestamp, and an
/// ordered attribute list (record-carried attributes are distinct from a
/// handler's bound context attributes — see `merge_attrs`). `attrs` is
/// public and iterates in insertion order, so a caller that wants to stop
/// partway just breaks out of a `for` loop or uses `.iter().take_while(..)`
/// rather than going through a visitor callback.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub attrs: SmallVec<[Attribute; 8]>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Record {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            attrs: SmallVec::new(),
        }
    }

    pub fn with_attr(mut self, attr: Attribute) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        self.attrs.extend(attrs);
        self
    }
}

/// Merge a handler's bound context attributes with a record's own
/// attributes. On a key collision the record-carried attribute wins: it
/// reflects what the call site explicitly logged, which is more specific
/// than ambient context bound earlier via `with_attrs`/`with_group`.
pub fn merge_attrs(context: &[Attribute], record: &[Attribute]) -> Vec<Attribute> {
    let mut merged: Vec<Attribute> = Vec::with_capacity(context.len() + record.len());
    for ctx_attr in context {
        if !record.iter().any(|r| r.key == ctx_attr.key) {
            merged.push(ctx_attr.clone());
        }
    }
    merged.extend(record.iter().cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_carried_attr_wins_on_conflict() {
        let context = vec![Attribute::string("env", "staging")];
        let record = vec![Attribute::string("env", "production")];
        let merged = merge_attrs(&context, &record);
        assert_eq!(merged.len(), 1);
        match &merged[0].value {
            Value::String(s) => assert_eq!(s, "production"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn disjoint_keys_are_both_kept() {
        let context = vec![Attribute::string("env", "staging")];
        let record = vec![Attribute::string("request_id", "abc")];
        let merged = merge_attrs(&context, &record);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn group_state_prefixes_with_dots() {
        let g = GroupState::default().push("request").push("http");
        assert_eq!(g.prefix_key("status"), "request.http.status");
    }

    #[test]
    fn empty_group_state_leaves_key_bare() {
        let g = GroupState::default();
        assert_eq!(g.prefix_key("status"), "status");
    }

    #[test]
    fn lazy_value_resolves_through_depth() {
        let v = Value::Lazy(Arc::new(|| Value::Lazy(Arc::new(|| Value::Int64(42)))));
        match v.resolve(MAX_LAZY_RESOLVE_DEPTH) {
            Value::Int64(n) => assert_eq!(n, 42),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lazy_value_gives_up_past_max_depth() {
        fn recur() -> Value {
            Value::Lazy(Arc::new(recur))
        }
        let v = recur();
        match v.resolve(2) {
            Value::String(s) => assert!(s.contains("exceeded")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
