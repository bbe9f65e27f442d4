//! The Imperative Detector (component C): finds imperative command spans
//! in normalized text.
//!
//! Runs in two passes: a `RegexSet` prefilter decides whether the text is worth
//! scanning at all, then each individual pattern's `Regex` is used to
//! extract concrete match spans. Overlapping spans are then resolved by
//! a deterministic first-match-wins rule (invariant T2: sort by start
//! ascending, end descending — longest match at a given start wins —
//! then keep a span only if it starts at or after the end of the last
//! kept span).
//!
//! Direct-verb hits pass through one more filter: contextual
//! false-positive suppression, which drops a direct-verb span only if a
//! curated descriptive/educational phrase appears within a fixed
//! 30-character window around it. Every other family is reported as-is
//! — ambiguity always resolves in favor of keeping (and later blocking)
//! a span, never in favor of silently dropping it.

use crate::patterns::{Category, PATTERN_TABLES};

/// A single imperative command span found in normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImperativeSpan {
    /// Character offset (inclusive) of the first character of the match.
    pub start: usize,
    /// Character offset (exclusive) just past the last character of the
    /// match.
    pub end: usize,
    /// Which pattern family matched.
    pub category: Category,
    /// The exact matched text, for certificates and audit logs.
    pub text_slice: String,
}

/// Phrases that, when found within the suppression window around a
/// direct-verb hit, indicate the verb is being used descriptively or
/// educationally rather than as a command directed at the reader.
///
/// This list is deliberately small and conservative: the specification
/// requires that ambiguous cases default to being *kept* (and therefore
/// later blocked), so suppression only fires on unambiguous framing.
const SUPPRESSION_PHRASES: &[&str] = &[
    "for example",
    "e.g.",
    "such as",
    "this function",
    "this method",
    "this command",
    "the word",
    "the verb",
    "historically",
    "in the past",
    "used to mean",
    "defined as",
    "refers to",
    "is when you",
    "in this tutorial",
    "in this guide",
    "documentation for",
];

/// Character-window radius used for contextual false-positive
/// suppression: 30 characters on either side of a direct-verb match.
const SUPPRESSION_WINDOW: usize = 30;

/// Detect all imperative command spans in already-normalized text.
///
/// `text` must already have gone through [`crate::normalize::normalize`]
/// — the Detector does not normalize internally, since it always runs
/// over the Provenance Builder's concatenated output.
#[must_use]
pub fn detect(text: &str) -> Vec<ImperativeSpan> {
    let tables = &*PATTERN_TABLES;

    if !tables.prefilter.is_match(text) {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();

    let mut raw_spans = Vec::new();
    for pattern in &tables.patterns {
        for m in pattern.regex.find_iter(text) {
            let start = char_index_for_byte(text, m.start());
            let end = char_index_for_byte(text, m.end());
            raw_spans.push(ImperativeSpan {
                start,
                end,
                category: pattern.category,
                text_slice: m.as_str().to_string(),
            });
        }
    }

    let suppressed = apply_contextual_suppression(&chars, raw_spans);
    resolve_overlaps(suppressed)
}

/// Convert a byte offset into `text` into a character offset.
fn char_index_for_byte(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

/// Drop direct-verb spans whose surrounding window contains a
/// descriptive/educational suppression phrase. All other categories
/// pass through unchanged.
fn apply_contextual_suppression(
    chars: &[char],
    spans: Vec<ImperativeSpan>,
) -> Vec<ImperativeSpan> {
    spans
        .into_iter()
        .filter(|span| {
            if span.category != Category::DirectVerb {
                return true;
            }

            let window_start = span.start.saturating_sub(SUPPRESSION_WINDOW);
            let window_end = (span.end + SUPPRESSION_WINDOW).min(chars.len());
            let window: String = chars[window_start..window_end].iter().collect();

            !SUPPRESSION_PHRASES.iter().any(|phrase| window.contains(phrase))
        })
        .collect()
}

/// Resolve overlapping spans per invariant T2: sort by `start` ascending
/// and `end` descending (so the longest match at a given start is tried
/// first), then greedily keep a span only if it starts at or after the
/// end of the last kept span.
fn resolve_overlaps(mut spans: Vec<ImperativeSpan>) -> Vec<ImperativeSpan> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<ImperativeSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        let overlaps = kept.last().is_some_and(|last| span.start < last.end);
        if !overlaps {
            kept.push(span);
        }
    }
    kept
}
