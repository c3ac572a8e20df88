//! The extension pipeline: prefix-key extraction, a pluggable formatter
//! chain, a context propagator, DLP redaction, and an optional diagnostics
//! tap, wired in front of a terminal encoder.
//!
//! Generalizes the teacher's `backend::filtering::filter_caller_info`
//! (a single fixed filter stage) into an ordered, user-extensible chain of
//! named formatters, and its `utils::debug::debug_log` into the
//! diagnostics tap.

pub mod context;
pub mod diagnostics;
pub mod formatter;
pub mod prefix;

use crate::dlp::DlpEngine;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::level::Level;
use crate::record::{Attribute, Record};
use arc_swap::ArcSwap;
use context::ContextPropagator;
use diagnostics::Diagnostics;
use formatter::{Formatter, FormatterChain};
use std::sync::Arc;

/// Snapshot of the extension's mutable configuration, swapped atomically so
/// readers on the hot path never block behind a writer reconfiguring it.
#[derive(Clone)]
struct ExtConfig {
    formatters: FormatterChain,
    prefix_keys: Vec<String>,
    dlp_enabled: bool,
    propagator: Option<ContextPropagator>,
}

impl ExtConfig {
    fn empty() -> Self {
        ExtConfig {
            formatters: FormatterChain::new(),
            prefix_keys: Vec::new(),
            dlp_enabled: false,
            propagator: None,
        }
    }
}

/// Wraps a terminal handler with: prefix-key extraction, the formatter
/// chain, DLP redaction, and (if configured) a diagnostics tap recording
/// every value the formatter chain or DLP engine changed.
pub struct Extension {
    inner: Arc<dyn Handler>,
    config: ArcSwap<ExtConfig>,
    dlp: Option<Arc<DlpEngine>>,
    diagnostics: Option<Arc<Diagnostics>>,
}

impl Extension {
    pub fn new(inner: Arc<dyn Handler>) -> Arc<Self> {
        Arc::new(Extension {
            inner,
            config: ArcSwap::from_pointee(ExtConfig::empty()),
            dlp: None,
            diagnostics: None,
        })
    }

    pub fn with_dlp(mut self: Arc<Self>, engine: Arc<DlpEngine>) -> Arc<Self> {
        let this = Arc::get_mut(&mut self).expect("Extension must be uniquely owned during setup");
        this.dlp = Some(engine);
        let cfg = this.config.load_full();
        this.config.store(Arc::new(ExtConfig { dlp_enabled: true, ..(*cfg).clone() }));
        self
    }

    pub fn with_diagnostics(mut self: Arc<Self>, diagnostics: Arc<Diagnostics>) -> Arc<Self> {
        let this = Arc::get_mut(&mut self).expect("Extension must be uniquely owned during setup");
        this.diagnostics = Some(diagnostics);
        self
    }

    /// Register a formatter under `name`, appended to the end of the chain.
    pub fn register_formatter(&self, name: impl Into<String>, formatter: Arc<dyn Formatter>) {
        let cfg = self.config.load_full();
        let mut next = (*cfg).clone();
        next.formatters.register(name.into(), formatter);
        self.config.store(Arc::new(next));
    }

    pub fn remove_formatter(&self, name: &str) {
        let cfg = self.config.load_full();
        let mut next = (*cfg).clone();
        next.formatters.remove(name);
        self.config.store(Arc::new(next));
    }

    pub fn list_formatters(&self) -> Vec<String> {
        self.config.load().formatters.names()
    }

    pub fn set_prefix_keys(&self, keys: Vec<String>) {
        let cfg = self.config.load_full();
        self.config.store(Arc::new(ExtConfig { prefix_keys: keys, ..(*cfg).clone() }));
    }

    /// Install the single context propagator function run ahead of the
    /// formatter chain on every record.
    pub fn set_context_propagator(&self, propagator: ContextPropagator) {
        let cfg = self.config.load_full();
        self.config.store(Arc::new(ExtConfig { propagator: Some(propagator), ..(*cfg).clone() }));
    }

    fn process(&self, record: &Record) -> Result<Record> {
        let cfg = self.config.load();
        let mut processed = record.clone();

        if let Some(propagator) = &cfg.propagator {
            let derived = propagator(&processed.attrs);
            for attr in derived {
                if !processed.attrs.iter().any(|a| a.key == attr.key) {
                    processed.attrs.push(attr);
                }
            }
        }

        let prefix = prefix::extract_prefix(&cfg.prefix_keys, &processed.attrs);
        if !cfg.prefix_keys.is_empty() {
            processed.attrs.retain(|a| !cfg.prefix_keys.iter().any(|k| k == &a.key));
        }

        for attr in processed.attrs.iter_mut() {
            self.process_attr(&cfg, attr, &[])?;
        }

        if let Some(p) = prefix {
            processed.message = format!("[{p}] {}", processed.message);
        }

        Ok(processed)
    }

    /// Run the formatter chain then DLP redaction on a single attribute, and
    /// recurse into `Group`-valued attributes with the group path extended
    /// by the group's own key (`spec.md` §4.3: "Group attributes recurse
    /// with the current group path extended").
    fn process_attr(&self, cfg: &ExtConfig, attr: &mut Attribute, group_path: &[String]) -> Result<()> {
        let before = format!("{:?}", attr.value);
        cfg.formatters.apply(attr)?;
        if let Some(diag) = &self.diagnostics {
            let after = format!("{:?}", attr.value);
            if before != after {
                diag.record_change("formatter", group_path, &attr.key, &before, &after);
            }
        }

        if cfg.dlp_enabled {
            if let Some(engine) = &self.dlp {
                if let crate::record::Value::String(s) = &attr.value {
                    let redacted = engine.redact(s);
                    if redacted != *s {
                        if let Some(diag) = &self.diagnostics {
                            diag.record_change("dlp", group_path, &attr.key, s, &redacted);
                        }
                        attr.value = crate::record::Value::String(redacted);
                    }
                }
            }
        }

        if let crate::record::Value::Group(inner) = &mut attr.value {
            let mut nested_path = group_path.to_vec();
            nested_path.push(attr.key.clone());
            for inner_attr in inner.iter_mut() {
                self.process_attr(cfg, inner_attr, &nested_path)?;
            }
        }

        Ok(())
    }
}

impl Handler for Extension {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let processed = self
            .process(record)
            .map_err(|e| Error::processing(format!("extension pipeline failed: {e}")))?;
        self.inner.handle(&processed)
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        Arc::new(Extension {
            inner: self.inner.clone().with_attrs(attrs),
            config: ArcSwap::from(self.config.load_full()),
            dlp: self.dlp.clone(),
            diagnostics: self.diagnostics.clone(),
        })
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        Arc::new(Extension {
            inner: self.inner.clone().with_group(name),
            config: ArcSwap::from(self.config.load_full()),
            dlp: self.dlp.clone(),
            diagnostics: self.diagnostics.clone(),
        })
    }
}
