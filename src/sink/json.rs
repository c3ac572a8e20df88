//! NDJSON terminal encoder: one JSON object per line.
//!
//! Grounded on the teacher's `format::json::JsonRecord`, generalized from a
//! fixed struct of well-known columns into a `timestamp`/`level`/`message`
//! envelope plus an open `fields` map built from the record's attribute
//! list.

use crate::error::{Error, Result};
use crate::handler::{BoundContext, Handler};
use crate::level::Level;
use crate::record::{Attribute, Record};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    level: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    fields: serde_json::Map<String, serde_json::Value>,
}

pub struct JsonSink {
    level: Level,
    pretty: bool,
    context: BoundContext,
    // Shared (not re-created) across `with_attrs`/`with_group`, so a scoped
    // logger derived from this sink still writes to the same destination.
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl JsonSink {
    pub fn new(level: Level, pretty: bool) -> Arc<Self> {
        Arc::new(JsonSink {
            level,
            pretty,
            context: BoundContext::default(),
            writer: Arc::new(Mutex::new(Box::new(std::io::stdout()))),
        })
    }

    pub fn with_writer(level: Level, pretty: bool, writer: Box<dyn Write + Send>) -> Arc<Self> {
        Arc::new(JsonSink {
            level,
            pretty,
            context: BoundContext::default(),
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    fn render(&self, record: &Record, attrs: &[Attribute]) -> Result<String> {
        let mut fields = serde_json::Map::new();
        for a in attrs {
            let value = serde_json::to_value(&a.value)
                .map_err(|e| Error::processing(format!("failed to serialize attribute {}: {e}", a.key)))?;
            fields.insert(a.key.clone(), value);
        }
        let line = JsonLine {
            timestamp: record.timestamp.to_rfc3339(),
            level: record.level.name(),
            message: &record.message,
            fields,
        };
        if self.pretty {
            serde_json::to_string_pretty(&line)
        } else {
            serde_json::to_string(&line)
        }
        .map_err(|e| Error::processing(format!("failed to serialize record: {e}")))
    }
}

impl Handler for JsonSink {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let attrs = self.context.resolve(record);
        let line = self.render(record, &attrs)?;
        let mut w = self.writer.lock();
        let _ = writeln!(w, "{line}");
        let _ = w.flush();
        Ok(())
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attribute>) -> Arc<dyn Handler> {
        Arc::new(JsonSink {
            level: self.level,
            pretty: self.pretty,
            context: self.context.push_attrs(attrs),
            writer: self.writer.clone(),
        })
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        Arc::new(JsonSink {
            level: self.level,
            pretty: self.pretty,
            context: self.context.push_group(name),
            writer: self.writer.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PMutex;

    struct SharedBuf(Arc<PMutex<Vec<u8>>>);
    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn emits_one_json_object_per_line() {
        let buf = Arc::new(PMutex::new(Vec::new()));
        let sink = JsonSink::with_writer(Level::INFO, false, Box::new(SharedBuf(buf.clone())));
        let record = Record::new(Level::INFO, "hi").with_attr(Attribute::string("user", "alice"));
        sink.handle(&record).unwrap();
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["message"], "hi");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["fields"]["user"], "alice");
    }

    #[test]
    fn omits_fields_key_when_no_attributes() {
        let buf = Arc::new(PMutex::new(Vec::new()));
        let sink = JsonSink::with_writer(Level::INFO, false, Box::new(SharedBuf(buf.clone())));
        sink.handle(&Record::new(Level::INFO, "hi")).unwrap();
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert!(parsed.get("fields").is_none());
    }

    #[test]
    fn with_attrs_and_with_group_still_write_to_the_original_destination() {
        let buf = Arc::new(PMutex::new(Vec::new()));
        let sink = JsonSink::with_writer(Level::INFO, false, Box::new(SharedBuf(buf.clone())));
        let scoped = (sink.clone() as Arc<dyn Handler>)
            .with_attrs(vec![Attribute::string("user", "alice")])
            .with_group("request");
        scoped.handle(&Record::new(Level::INFO, "hi")).unwrap();
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        assert!(!out.is_empty(), "scoped handler must write to the shared writer, not discard output");
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["fields"]["request.user"], "alice");
    }
}
