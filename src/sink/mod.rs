//! Example terminal encoders a `Handler` wraps around: console, JSON, and
//! an in-memory collector for tests. These exist to exercise the handler
//! and extension pipeline end to end, not to replace the rotation/
//! compression/webhook/syslog sinks the crate leaves as external,
//! pluggable modules (see `registry`).

pub mod console;
pub mod json;
pub mod memory;
