//! The DLP (data-loss-prevention) redaction engine: priority-ordered
//! regex matchers with fast-filter token pre-checks, overlap resolution,
//! and an LRU cache keyed by a content hash so repeat strings are not
//! re-scanned.
//!
//! No teacher module does content redaction; this is new logic grounded on
//! the regex-driven matching already present in `format::template`, with
//! the cache keyed via `blake3` per the dependency note in `DESIGN.md`
//! (pulled from `examples/MuntasirSZN-consola-rs`'s `Throttler::fingerprint`).

pub mod chinese_name;
pub mod matcher;

use crate::lru::LruCache;
use matcher::{Matcher, Transformer};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

fn blanket_redact(_: &str) -> String {
    "[REDACTED]".to_string()
}

/// Bumped whenever the matcher set changes, so cached redactions computed
/// under a stale matcher set are never served.
pub struct DlpEngine {
    matchers: RwLock<Vec<Matcher>>,
    version: AtomicU64,
    cache: LruCache<[u8; 32], String>,
    enable_chinese_name_heuristic: bool,
}

impl DlpEngine {
    pub fn new(matchers: Vec<Matcher>, cache_capacity: i64) -> Self {
        DlpEngine {
            matchers: RwLock::new(matchers),
            version: AtomicU64::new(0),
            cache: LruCache::new(cache_capacity),
            enable_chinese_name_heuristic: false,
        }
    }

    pub fn with_chinese_name_heuristic(mut self, enabled: bool) -> Self {
        self.enable_chinese_name_heuristic = enabled;
        self
    }

    /// Replace the matcher set under a write lock and bump the version,
    /// invalidating every cache entry computed under the old set
    /// (`spec.md` §4.5: "matcher mutations take a write lock on the
    /// matcher list"; "any mutation to the matcher set increments [the
    /// version], implicitly invalidating the cache").
    pub fn set_matchers(&self, matchers: Vec<Matcher>) {
        *self.matchers.write() = matchers;
        self.bump_version();
    }

    /// Invalidate every cached redaction, e.g. after `set_matchers`.
    pub fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
    }

    /// The engine's version counter, surfaced as `dlp_version` on the
    /// runtime control panel (`spec.md` §6).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn cache_key(&self, text: &str) -> [u8; 32] {
        let version = self.version.load(Ordering::SeqCst);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&version.to_le_bytes());
        hasher.update(text.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Redact `text`, applying every matcher whose fast-filter token check
    /// passes, sorted by ascending pattern complexity (cheap checks first),
    /// with the resulting spans priority-ordered. Overlapping spans are
    /// resolved by earliest start, then by higher matcher priority.
    pub fn redact(&self, text: &str) -> String {
        let key = self.cache_key(text);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let mut spans = self.collect_spans(text);
        if self.enable_chinese_name_heuristic {
            spans.extend(chinese_name::candidate_spans(text));
        }
        let resolved = resolve_overlaps(spans);
        let redacted = apply_redactions(text, &resolved);

        self.cache.put(key, redacted.clone());
        redacted
    }

    fn collect_spans(&self, text: &str) -> Vec<Span> {
        let matchers = self.matchers.read();
        let mut candidates: Vec<&Matcher> =
            matchers.iter().filter(|m| m.fast_filter_passes(text)).collect();
        // Ascending by complexity: the pattern-length proxy in
        // `Matcher::complexity` runs the cheapest regexes first, which is
        // the "cheap, high-signal matchers first" intent behind the spec's
        // complexity ordering.
        candidates.sort_by_key(|m| m.complexity());

        let mut spans = Vec::new();
        for matcher in candidates {
            for m in matcher.pattern().find_iter(text) {
                if matcher.validate(m.as_str()) {
                    spans.push(Span {
                        start: m.start(),
                        end: m.end(),
                        priority: matcher.priority(),
                        transform: Arc::new({
                            let matcher = matcher.clone();
                            move |hit: &str| matcher.transform(hit)
                        }),
                    });
                }
            }
        }
        spans
    }
}

#[derive(Clone)]
struct Span {
    start: usize,
    end: usize,
    priority: i32,
    transform: Transformer,
}

/// Resolve overlapping spans: earliest start wins; ties broken by higher
/// priority.
fn resolve_overlaps(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.priority.cmp(&a.priority)));
    let mut resolved: Vec<Span> = Vec::new();
    for span in spans {
        if let Some(last) = resolved.last() {
            if span.start < last.end {
                continue;
            }
        }
        resolved.push(span);
    }
    resolved
}

/// Apply each span's transformer from last to first so earlier byte
/// offsets stay valid as later (leftward, already-processed) spans are
/// replaced.
fn apply_redactions(text: &str, spans: &[Span]) -> String {
    let mut result = text.to_string();
    for span in spans.iter().rev() {
        let replacement = (span.transform)(&text[span.start..span.end]);
        result.replace_range(span.start..span.end, &replacement);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcher::Matcher;

    fn email_matcher() -> Matcher {
        Matcher::new(r"[\w.+-]+@[\w-]+\.[\w.-]+", 10, &["@"])
    }

    fn phone_matcher() -> Matcher {
        Matcher::new(r"\d{3}-\d{3}-\d{4}", 5, &["-"])
    }

    #[test]
    fn redacts_matching_spans() {
        let engine = DlpEngine::new(vec![email_matcher()], 100);
        let out = engine.redact("contact me at a@b.com please");
        assert_eq!(out, "contact me at [REDACTED] please");
    }

    #[test]
    fn cache_hits_on_repeat_text() {
        let engine = DlpEngine::new(vec![email_matcher()], 100);
        let first = engine.redact("a@b.com");
        let second = engine.redact("a@b.com");
        assert_eq!(first, second);
        assert_eq!(engine.cache.stats().hits, 1);
    }

    #[test]
    fn bump_version_invalidates_cache() {
        let engine = DlpEngine::new(vec![email_matcher()], 100);
        engine.redact("a@b.com");
        engine.bump_version();
        engine.redact("a@b.com");
        assert_eq!(engine.cache.stats().hits, 0);
    }

    #[test]
    fn overlapping_spans_resolve_by_earliest_start() {
        let engine = DlpEngine::new(vec![email_matcher(), phone_matcher()], 100);
        let out = engine.redact("phone 555-123-4567 email a@b.com");
        assert_eq!(out, "phone [REDACTED] email [REDACTED]");
    }

    #[test]
    fn fast_filter_skips_non_matching_matchers() {
        let phone = phone_matcher();
        assert!(!phone.fast_filter_passes("no digits here"));
    }

    #[test]
    fn mobile_number_is_masked_not_blanket_redacted() {
        let engine = DlpEngine::new(vec![matcher::mobile_phone_matcher()], 100);
        let out = engine.redact("login phone=13812345678");
        assert_eq!(out, "login phone=138****5678");
        assert!(!out.contains("13812345678"));
    }

    #[test]
    fn set_matchers_bumps_version_and_invalidates_cache() {
        let engine = DlpEngine::new(vec![email_matcher()], 100);
        engine.redact("a@b.com");
        let version_before = engine.version();
        engine.set_matchers(vec![phone_matcher()]);
        assert!(engine.version() > version_before);
        assert_eq!(engine.redact("a@b.com"), "a@b.com");
    }

    #[test]
    fn redact_idempotent_when_transformer_output_does_not_rematch() {
        let engine = DlpEngine::new(vec![email_matcher()], 100);
        let once = engine.redact("contact a@b.com");
        let twice = engine.redact(&once);
        assert_eq!(once, twice);
    }
}
