//! Heuristic candidate-span extraction for Chinese personal names.
//!
//! Chinese names have no delimiter-based shape a regex can reliably anchor
//! on (no case, no spaces between family and given name), so instead of a
//! matcher pattern this walks runs of CJK Unified Ideographs, enumerates
//! 2-3 character candidates whose first character is a recognized surname,
//! and scores a candidate higher when it is immediately followed by a
//! second valid candidate (`spec.md` §4.5's "Surname+Name / Surname+Name"
//! adjacency pattern, e.g. two names listed together as a couple). Any text
//! containing a financial keyword suppresses name detection entirely,
//! since a 2-3 character CJK run next to an amount or account number is far
//! more likely to be incidental than a name.

use super::Span;
use std::sync::Arc;

/// The 64 most common Chinese surnames cover the overwhelming majority of
/// real names; anything outside this set is presumed not to open a name
/// candidate, trading recall for not flagging arbitrary bigrams.
const COMMON_SURNAMES: &[char] = &[
    '王', '李', '张', '刘', '陈', '杨', '赵', '黄', '周', '吴', '徐', '孙', '胡', '朱', '高', '林',
    '何', '郭', '马', '罗', '梁', '宋', '郑', '谢', '韩', '唐', '冯', '于', '董', '萧', '程', '曹',
    '袁', '邓', '许', '傅', '沈', '曾', '彭', '吕', '苏', '卢', '蒋', '蔡', '贾', '丁', '魏', '薛',
    '叶', '阎', '余', '潘', '杜', '戴', '夏', '钟', '汪', '田', '任', '姜', '范', '方', '石', '姚',
];

/// Substrings whose presence suppresses Chinese-name detection across the
/// whole text: a CJK bigram sitting next to a transfer/account/amount is
/// far more likely to be a currency or account label than a person's name.
const FINANCIAL_KEYWORDS: &[&str] = &[
    "transfer", "account", "amount", "balance", "payment", "转账", "汇款", "金额", "账户", "收款",
    "付款", "余额", "银行卡",
];

fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}')
}

fn has_financial_keyword(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    FINANCIAL_KEYWORDS.iter().any(|k| lower.contains(&k.to_ascii_lowercase()) || text.contains(k))
}

/// True if `run[offset..offset+len]` starts with a recognized surname.
fn starts_with_surname(run: &[char], offset: usize) -> bool {
    run.get(offset).map(|c| COMMON_SURNAMES.contains(c)).unwrap_or(false)
}

pub(super) fn candidate_spans(text: &str) -> Vec<Span> {
    if has_financial_keyword(text) {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;
    while i < chars.len() {
        if is_cjk(chars[i].1) {
            let run_start = i;
            let mut j = i;
            while j < chars.len() && is_cjk(chars[j].1) {
                j += 1;
            }
            spans.extend(run_candidates(&chars[run_start..j], text));
            i = j;
        } else {
            i += 1;
        }
    }
    spans
}

/// Enumerate 2-3 character surname-led candidates within one contiguous
/// CJK run, scoring adjacent "name, name" pairs higher.
fn run_candidates(run: &[(usize, char)], text: &str) -> Vec<Span> {
    let run_chars: Vec<char> = run.iter().map(|(_, c)| *c).collect();
    let mut candidates: Vec<(usize, usize)> = Vec::new(); // (start offset, len) in run-local char indices
    for offset in 0..run_chars.len() {
        if !starts_with_surname(&run_chars, offset) {
            continue;
        }
        for len in [2usize, 3usize] {
            if offset + len <= run_chars.len() {
                candidates.push((offset, len));
            }
        }
    }

    let mut spans = Vec::new();
    for &(offset, len) in &candidates {
        let adjacent = candidates
            .iter()
            .any(|&(o2, _)| o2 == offset + len && starts_with_surname(&run_chars, o2));
        let priority = if adjacent { 3 } else { 1 };
        let start = run[offset].0;
        let (last_idx, last_char) = run[offset + len - 1];
        let end = last_idx + last_char.len_utf8();
        spans.push(Span { start, end, priority, transform: Arc::new(super::blanket_redact) });
    }
    spans
}
