//! The Neutralizer (component E): rewrites a fixed vocabulary of
//! high-risk verbs across an entire text so that it can no longer be
//! mistaken for a literal command, independent of where any detected
//! violation spans were.
//!
//! Grounded directly in the original source's `ImperativeNeutralizer`:
//! a closed, five-verb table (`execute`, `run`, `delete`, `remove`,
//! `rm`), each replaced by a bracketed marker `[NEUTRALIZED:<verb>]`.
//! The replacement runs over the *whole* normalized text, not just the
//! violation spans — the specification is explicit that scoping
//! neutralization to only the flagged spans would leave other
//! occurrences of the same verbs live, which defeats the purpose of a
//! single-pass re-verification step in the Runtime Gate.
//!
//! The marker text itself embeds the replaced verb (`[NEUTRALIZED:delete]`),
//! and the `:`/`]` either side of it are non-word characters — so the
//! marker is itself a word-bounded occurrence of the very verb the
//! DirectVerb family matches on (`\bdelete\b` matches inside
//! `[NEUTRALIZED:delete]`). Re-detection over the rewritten text must
//! therefore ignore matches that fall entirely inside a marker the
//! Neutralizer itself inserted; [`NeutralizationResult::marker_spans`]
//! records exactly those ranges for the Runtime Gate to exclude.

use regex::Regex;
use std::sync::LazyLock;

/// The fixed neutralization vocabulary, in table order. Closed by the
/// specification — do not extend without updating the Runtime Gate's
/// re-verification assumptions, since a larger vocabulary changes what
/// "certified rewrite" certifies.
const NEUTRALIZED_VERBS: &[&str] = &["execute", "run", "delete", "remove", "rm"];

/// Single pattern matching any neutralization-vocabulary verb, used to
/// find and replace every occurrence in one left-to-right pass so marker
/// spans can be recorded against stable output positions.
static NEUTRALIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = NEUTRALIZED_VERBS
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("static neutralization pattern")
});

/// Result of running the Neutralizer: the rewritten text plus a count of
/// replacements made, for certificates and audit logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeutralizationResult {
    /// Text with every occurrence of a neutralized verb replaced by its
    /// `[NEUTRALIZED:<verb>]` marker.
    pub text: String,
    /// Total number of replacements made, across all verbs.
    pub replacements: usize,
    /// Character-offset `(start, end)` ranges of every inserted
    /// `[NEUTRALIZED:<verb>]` marker in `text`, in insertion order. A
    /// re-detection pass over `text` must not treat a match fully
    /// contained in one of these ranges as a surviving violation — it
    /// is the marker's own bracketed verb name, not a live command.
    pub marker_spans: Vec<(usize, usize)>,
}

/// Replace every occurrence of a neutralized verb in `text` with
/// `[NEUTRALIZED:<verb>]`.
///
/// Operates on already-normalized (lowercased) text, so the verb table
/// need only contain lowercase forms.
#[must_use]
pub fn neutralize(text: &str) -> NeutralizationResult {
    let mut output = String::with_capacity(text.len());
    let mut marker_spans = Vec::new();
    let mut replacements = 0usize;
    let mut last_byte = 0usize;
    let mut char_offset = 0usize;

    for m in NEUTRALIZE_PATTERN.find_iter(text) {
        let before = &text[last_byte..m.start()];
        output.push_str(before);
        char_offset += before.chars().count();

        let marker = format!("[NEUTRALIZED:{}]", m.as_str());
        let marker_start = char_offset;
        char_offset += marker.chars().count();
        output.push_str(&marker);
        marker_spans.push((marker_start, char_offset));

        replacements += 1;
        last_byte = m.end();
    }
    output.push_str(&text[last_byte..]);

    NeutralizationResult {
        text: output,
        replacements,
        marker_spans,
    }
}
