//! Framework-free request/response payloads for the `GET`/`POST
//! /slog/runtime` control panel (`spec.md` §6).
//!
//! No example repo in the pack embeds a web framework, so this module
//! implements only the panel's logic — parsing a request, mutating shared
//! state, and building a JSON-serializable response — leaving the actual
//! HTTP listener to whatever server the embedding application already
//! runs. Payload shape is grounded on the teacher's
//! `config::state::LoggerMetrics`/`SinkConfig` fields.

use crate::core::Core;
use crate::level::Level;
use serde::Serialize;
use std::collections::HashMap;

/// `GET /slog/runtime` body, and also the body `POST /slog/runtime`
/// returns (with `message` set on a `400`).
#[derive(Debug, Serialize, PartialEq)]
pub struct RuntimeStatus {
    pub level: String,
    pub text_enabled: bool,
    pub json_enabled: bool,
    pub dlp_enabled: bool,
    pub dlp_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Handle `GET /slog/runtime`.
pub fn handle_get(core: &Core) -> RuntimeStatus {
    RuntimeStatus {
        level: core.level().name().to_string(),
        text_enabled: core.text_enabled(),
        json_enabled: core.json_enabled(),
        dlp_enabled: core.dlp_enabled(),
        dlp_version: core.dlp_version(),
        message: None,
    }
}

fn status_with_message(core: &Core, message: String) -> RuntimeStatus {
    RuntimeStatus { message: Some(message), ..handle_get(core) }
}

/// An `on|off|true|false` flag, case-insensitive, as accepted by the
/// `text`/`json`/`dlp` POST fields.
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" => Some(true),
        "off" | "false" => Some(false),
        _ => None,
    }
}

/// Handle `POST /slog/runtime` with form/query fields `level`, `text`,
/// `json`, `dlp`. Returns the HTTP status to send (`200` or `400`) plus the
/// response body; on `400` the body carries a `message` describing the
/// unknown option or invalid value, per `spec.md` §6.
pub fn handle_post(core: &Core, params: &HashMap<String, String>) -> (u16, RuntimeStatus) {
    if let Some(level_name) = params.get("level") {
        match Level::parse(level_name) {
            Ok(level) => core.set_level(level),
            Err(_) => {
                return (400, status_with_message(core, format!("unknown level: {level_name}")));
            }
        }
    }
    if let Some(raw) = params.get("text") {
        match parse_flag(raw) {
            Some(enabled) => core.set_text_enabled(enabled),
            None => return (400, status_with_message(core, format!("invalid value for text: {raw}"))),
        }
    }
    if let Some(raw) = params.get("json") {
        match parse_flag(raw) {
            Some(enabled) => core.set_json_enabled(enabled),
            None => return (400, status_with_message(core, format!("invalid value for json: {raw}"))),
        }
    }
    if let Some(raw) = params.get("dlp") {
        match parse_flag(raw) {
            Some(enabled) => core.set_dlp_enabled(enabled),
            None => return (400, status_with_message(core, format!("invalid value for dlp: {raw}"))),
        }
    }
    (200, handle_get(core))
}
