//! ANSI-colorized terminal encoder, writing `[LEVEL] message key=value ...`
//! to stdout or stderr depending on level.
//!
//! Grounded on the teacher's `backend::colorization::color_name_to_code`
//! table, with the PyO3 callback path removed — color selection here is a
//! plain function of `Level`, not a user-supplied Python callable.

use crate::error::Result;
use crate::handler::{BoundContext, Handler};
use crate::level::Level;
use crate::record::{Attribute, Record, Value, MAX_LAZY_RESOLVE_DEPTH};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

fn color_code(level: Level) -> &'static str {
    match level.name() {
        "TRACE" => "\x1b[90m",
        "DEBUG" => "\x1b[36m",
        "INFO" => "\x1b[32m",
        "WARN" => "\x1b[33m",
        "ERROR" => "\x1b[31m",
        _ => "\x1b[1;31m",
    }
}

const RESET: &str = "\x1b[0m";

fn format_value(value: &Value) -> String {
    match value.resolve(MAX_LAZY_RESOLVE_DEPTH) {
        Value::String(s) => s,
        Value::Int64(i) => i.to_string(),
        Value::Uint64(u) => u.to_string(),
        Value::Float64(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Duration(d) => format!("{:?}", d),
        Value::Time(t) => t.to_rfc3339(),
        Value::Group(attrs) => attrs
            .iter()
            .map(|a| format!("{}={}", a.key, format_value(&a.value)))
            .collect::<Vec<_>>()
            .join(","),
        Value::Any(_) => "<any>".to_string(),
        Value::Lazy(_) => "<unresolved>".to_string(),
    }
}

pub struct ConsoleSink {
    level: Level,
    color: bool,
    context: BoundContext,
    // Shared (not re-created) across `with_attrs`/`with_group`, so a scoped
    // logger derived from this sink still writes to the same destination.
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ConsoleSink {
    pub fn new(level: Level, color: bool) -> Arc<Self> {
        Arc::new(ConsoleSink {
            level,
            color,
            context: BoundContext::default(),
            writer: Arc::new(Mutex::new(Box::new(std::io::stdout()))),
        })
    }

    /// Construct with a custom writer, for tests that want to inspect the
    /// rendered line without touching the real stdout/stderr streams.
    pub fn with_writer(level: Level, color: bool, writer: Box<dyn Write + Send>) -> Arc<Self> {
        Arc::new(ConsoleSink {
            level,
            color,
            context: BoundContext::default(),
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    fn render(&self, record: &Record, attrs: &[Attribute]) -> String {
        let suffix = attrs
            .iter()
            .map(|a| format!(" {}={}", a.key, format_value(&a.value)))
            .collect::<String>();
        if self.color {
            format!(
                "{}[{}]{} {}{}\n",
                color_code(record.level),
                record.level.name(),
                RESET,
                record.message,
                suffix
            )
        } else {
            format!("[{}] {}{}\n", record.level.name(), record.message, suffix)
        }
    }
}

impl Handler for ConsoleSink {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let attrs = self.context.resolve(record);
        let line = self.render(record, &attrs);
        let mut w = self.writer.lock();
        let _ = w.write_all(line.as_bytes());
        let _ = w.flush();
        Ok(())
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        Arc::new(ConsoleSink {
            level: self.level,
            color: self.color,
            context: self.context.push_attrs(attrs),
            writer: self.writer.clone(),
        })
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        Arc::new(ConsoleSink {
            level: self.level,
            color: self.color,
            context: self.context.push_group(name),
            writer: self.writer.clone(),
        })
    }
}
