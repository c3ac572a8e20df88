//! Diagnostics tap: writes a one-line audit trail to a user-supplied sink
//! every time the formatter chain or DLP engine changes a value.
//!
//! Grounded directly on the teacher's `utils::debug::debug_log`, which
//! gates on an `internal_debug` flag and writes timestamped lines to a
//! lazily-opened file or stderr. Generalized here from a hardcoded file
//! path into any `Write` the caller supplies.

use chrono::Local;
use parking_lot::Mutex;
use std::io::Write;

pub struct Diagnostics {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Diagnostics {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Diagnostics { sink: Mutex::new(sink) }
    }

    /// `stage` is `"formatter"` or `"dlp"`; `group_path` is the ordered
    /// group names the attribute is nested under (empty at the top level).
    pub fn record_change(&self, stage: &str, group_path: &[String], key: &str, before: &str, after: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let path = if group_path.is_empty() { String::new() } else { format!("{}.", group_path.join(".")) };
        let line = format!("[{timestamp}] [{stage}] {path}{key}: {before} -> {after}\n");
        let mut sink = self.sink.lock();
        let _ = sink.write_all(line.as_bytes());
        let _ = sink.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct SharedBuf(Arc<Mutex<Vec<u8>>>);
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
    fn writes_one_line_per_change() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let diag = Diagnostics::new(Box::new(SharedBuf(buf.clone())));
        diag.record_change("dlp", &[], "ssn", "123-45-6789", "[REDACTED]");
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        assert!(out.contains("[dlp] ssn: 123-45-6789 -> [REDACTED]"));
        assert_eq!(out.matches('\n').count(), 1);
    }

    #[test]
    fn includes_the_dotted_group_path_when_nested() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let diag = Diagnostics::new(Box::new(SharedBuf(buf.clone())));
        let path = vec!["request".to_string(), "http".to_string()];
        diag.record_change("formatter", &path, "status", "200", "OK");
        let out = String::from_utf8(buf.lock().clone()).unwrap();
        assert!(out.contains("[formatter] request.http.status: 200 -> OK"));
    }
}
