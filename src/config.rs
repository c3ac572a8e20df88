//! A string-keyed dynamic config map for module factories, generalized
//! from the teacher's `config::state::SinkConfig` (a fixed struct of
//! per-sink fields) into an open bag typed accessors pull from.
//!
//! Value kinds match `spec.md` §6's module factory config contract exactly:
//! strings, integers, booleans, durations (`"500ms"`/`"2s"`), and nested
//! mappings (e.g. webhook: `{endpoint, timeout, level}`).

use crate::error::{Error, Result};
use ahash::AHashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Duration(Duration),
    Map(Config),
}

/// Parse a duration string of the form `<decimal><suffix>` where suffix is
/// `s` or `ms`, e.g. `"500ms"`, `"2.5s"` (`spec.md` §6: "durations (parsed
/// as decimal-number + suffix `s`/`ms`)").
pub fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.trim();
    let (number, unit) = if let Some(stripped) = text.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = text.strip_suffix('s') {
        (stripped, "s")
    } else {
        return Err(Error::invalid_input(format!("duration {text} has no s/ms suffix")));
    };
    let value: f64 = number
        .parse()
        .map_err(|_| Error::invalid_input(format!("duration {text} has a non-numeric magnitude")))?;
    if value < 0.0 {
        return Err(Error::invalid_input(format!("duration {text} cannot be negative")));
    }
    let seconds = if unit == "ms" { value / 1000.0 } else { value };
    Ok(Duration::from_secs_f64(seconds))
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    values: AHashMap<String, ConfigValue>,
}

impl Config {
    pub fn new() -> Self {
        Config { values: AHashMap::new() }
    }

    pub fn set(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.values.get(key) {
            Some(ConfigValue::String(s)) => Ok(s.as_str()),
            Some(_) => Err(Error::configuration(format!("key {key} is not a string"))),
            None => Err(Error::configuration(format!("missing required key {key}"))),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.values.get(key) {
            Some(ConfigValue::Int(i)) => Ok(*i),
            Some(_) => Err(Error::configuration(format!("key {key} is not an int"))),
            None => Err(Error::configuration(format!("missing required key {key}"))),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.values.get(key) {
            Some(ConfigValue::Bool(b)) => Ok(*b),
            Some(_) => Err(Error::configuration(format!("key {key} is not a bool"))),
            None => Err(Error::configuration(format!("missing required key {key}"))),
        }
    }

    /// Accepts either a pre-parsed `ConfigValue::Duration` or a
    /// `ConfigValue::String` in `"500ms"`/`"2s"` form, matching how a
    /// module's textual config file and its programmatic builder both
    /// reach this accessor.
    pub fn get_duration(&self, key: &str) -> Result<Duration> {
        match self.values.get(key) {
            Some(ConfigValue::Duration(d)) => Ok(*d),
            Some(ConfigValue::String(s)) => parse_duration(s),
            Some(_) => Err(Error::configuration(format!("key {key} is not a duration"))),
            None => Err(Error::configuration(format!("missing required key {key}"))),
        }
    }

    pub fn get_map(&self, key: &str) -> Result<&Config> {
        match self.values.get(key) {
            Some(ConfigValue::Map(m)) => Ok(m),
            Some(_) => Err(Error::configuration(format!("key {key} is not a nested mapping"))),
            None => Err(Error::configuration(format!("missing required key {key}"))),
        }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or(default).to_string()
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}
