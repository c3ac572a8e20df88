//! Pluggable formatter chain: named, ordered transformations applied to
//! every attribute value before DLP redaction runs.
//!
//! Generalizes the teacher's `format::template::format_with_template`
//! (a single hardcoded transform) into a registry of named, swappable
//! steps.

use crate::error::Result;
use crate::lru::LruCache;
use crate::record::Attribute;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}:]+)(?::([^}]+))?\}").expect("valid placeholder regex"));

/// Whether `template` contains at least one `{field}`/`{field:format}`
/// placeholder, cached by the template text itself so a hot, unchanging
/// template string (most of them are, in practice) skips the regex scan on
/// every call after the first.
pub fn has_format_specifiers(cache: &LruCache<String, bool>, template: &str) -> bool {
    if let Some(hit) = cache.get(&template.to_string()) {
        return hit;
    }
    let found = PLACEHOLDER.is_match(template);
    cache.put(template.to_string(), found);
    found
}

/// Expand `{field}` placeholders in `template` against `fields`, leaving an
/// unrecognized placeholder untouched. A template with no placeholders (the
/// common case for a plain message string) is returned unchanged without
/// running the substitution pass, using the cached check above.
pub fn render_template(
    cache: &LruCache<String, bool>,
    template: &str,
    fields: &HashMap<String, String>,
) -> String {
    if !has_format_specifiers(cache, template) {
        return template.to_string();
    }
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            let key = caps[1].to_lowercase();
            fields.get(&key).cloned().unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}

pub trait Formatter: Send + Sync {
    fn apply(&self, attr: &mut Attribute) -> Result<()>;
}

#[derive(Clone)]
pub struct FormatterChain {
    entries: Vec<(String, Arc<dyn Formatter>)>,
}

impl FormatterChain {
    pub fn new() -> Self {
        FormatterChain { entries: Vec::new() }
    }

    pub fn register(&mut self, name: String, formatter: Arc<dyn Formatter>) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = formatter;
        } else {
            self.entries.push((name, formatter));
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn apply(&self, attr: &mut Attribute) -> Result<()> {
        for (_, formatter) in &self.entries {
            formatter.apply(attr)?;
        }
        Ok(())
    }
}

impl Default for FormatterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// A trivial example formatter used by tests: uppercases string values.
pub struct UppercaseFormatter;

impl Formatter for UppercaseFormatter {
    fn apply(&self, attr: &mut Attribute) -> Result<()> {
        if let crate::record::Value::String(s) = &attr.value {
            attr.value = crate::record::Value::String(s.to_uppercase());
        }
        Ok(())
    }
}
