//! A single named, priority-ordered regex matcher, with an optional
//! validator, a per-matcher transformer, and a cheap token pre-check
//! ("fast filter") so the engine can skip compiling a verdict for patterns
//! that plainly cannot match before running the full regex.

use regex::Regex;
use std::sync::Arc;

pub type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type Transformer = Arc<dyn Fn(&str) -> String + Send + Sync>;

fn blanket_redact(_: &str) -> String {
    "[REDACTED]".to_string()
}

#[derive(Clone)]
pub struct Matcher {
    name: String,
    pattern: Regex,
    priority: i32,
    validator: Option<Validator>,
    transformer: Transformer,
    fast_tokens: Vec<String>,
}

impl Matcher {
    /// A matcher that blanket-replaces every hit with `[REDACTED]` and
    /// accepts every regex hit (no validator). Most callers reach for
    /// `with_validator`/`with_transformer` afterward to customize either.
    pub fn new(pattern: &str, priority: i32, fast_tokens: &[&str]) -> Self {
        Matcher {
            name: String::new(),
            pattern: Regex::new(pattern).expect("matcher pattern must be a valid regex"),
            priority,
            validator: None,
            transformer: Arc::new(blanket_redact),
            fast_tokens: fast_tokens.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_validator(mut self, validator: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_transformer(mut self, transformer: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.transformer = Arc::new(transformer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// `None` always validates; `Some(f)` gates a regex hit on `f(hit)`.
    pub fn validate(&self, hit: &str) -> bool {
        self.validator.as_ref().map(|v| v(hit)).unwrap_or(true)
    }

    pub fn transform(&self, hit: &str) -> String {
        (self.transformer)(hit)
    }

    /// A cheap substring pre-check: if none of the matcher's fast tokens
    /// appear in `text`, the full regex cannot match either, so the engine
    /// skips running it. An empty token list always passes (opts the
    /// matcher out of fast-filtering).
    pub fn fast_filter_passes(&self, text: &str) -> bool {
        self.fast_tokens.is_empty() || self.fast_tokens.iter().any(|t| text.contains(t.as_str()))
    }

    /// Rough complexity used to order cheap matchers ahead of expensive
    /// ones: the compiled pattern's source length.
    pub fn complexity(&self) -> usize {
        self.pattern.as_str().len()
    }
}

/// Masks a mobile-style digit run down to its first and last four digits,
/// e.g. `"13812345678"` -> `"138****5678"`. Grounded in `spec.md` §8's
/// worked DLP scenario; any match shorter than 8 digits is fully redacted
/// since there would be nothing left to mask.
pub fn mask_mobile_number(hit: &str) -> String {
    let digits: Vec<char> = hit.chars().collect();
    if digits.len() < 8 {
        return "[REDACTED]".to_string();
    }
    let prefix: String = digits[..3].iter().collect();
    let suffix: String = digits[digits.len() - 4..].iter().collect();
    format!("{prefix}****{suffix}")
}

/// A matcher for Chinese mobile numbers (11 digits starting `1`), masked to
/// `prefix****suffix` rather than blanket-redacted, matching the worked
/// scenario in `spec.md` §8.
pub fn mobile_phone_matcher() -> Matcher {
    Matcher::new(r"1\d{10}", 20, &[])
        .with_name("mobile_phone")
        .with_transformer(mask_mobile_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_filter_passes_when_token_present() {
        let m = Matcher::new(r"\d+", 1, &["5"]);
        assert!(m.fast_filter_passes("has a 5 in it"));
        assert!(!m.fast_filter_passes("no digits"));
    }

    #[test]
    fn empty_token_list_always_passes() {
        let m = Matcher::new(r"\d+", 1, &[]);
        assert!(m.fast_filter_passes("anything"));
    }

    #[test]
    fn complexity_is_pattern_length() {
        let m = Matcher::new(r"\d{3}", 1, &[]);
        assert_eq!(m.complexity(), 4);
    }

    #[test]
    fn default_transform_blanket_redacts() {
        let m = Matcher::new(r"\d+", 1, &[]);
        assert_eq!(m.transform("12345"), "[REDACTED]");
    }

    #[test]
    fn custom_transformer_overrides_default() {
        let m = Matcher::new(r"\d+", 1, &[]).with_transformer(|hit| format!("<{hit}>"));
        assert_eq!(m.transform("12345"), "<12345>");
    }

    #[test]
    fn validator_defaults_to_accepting_every_hit() {
        let m = Matcher::new(r"\d+", 1, &[]);
        assert!(m.validate("anything"));
    }

    #[test]
    fn validator_can_reject_a_hit() {
        let m = Matcher::new(r"\d+", 1, &[]).with_validator(|hit| hit.len() > 3);
        assert!(!m.validate("12"));
        assert!(m.validate("1234"));
    }

    #[test]
    fn mobile_matcher_masks_to_prefix_and_suffix() {
        let m = mobile_phone_matcher();
        assert_eq!(m.transform("13812345678"), "138****5678");
        assert_eq!(m.name(), "mobile_phone");
    }
}
