//! The Normalizer (component A): a pure, total function from raw text to
//! a canonical form used as the basis for detection and provenance.
//!
//! Pipeline order, fixed and not reconfigurable:
//!
//! 1. Unicode NFKC normalization.
//! 2. Full Unicode case-folding (lowercasing by codepoint).
//! 3. Zero-width character removal.
//! 4. Homoglyph / confusable folding to Latin equivalents.
//!
//! Deliberately narrow in scope: no HTML stripping, no control-character
//! stripping, no truncation, and no script-mixing detection. Those are
//! content-moderation concerns; the Normalizer here exists only to put
//! text into the single canonical form that detection and provenance
//! both operate on.

use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

/// Zero-width and invisible-formatting characters stripped in step 3.
///
/// U+200B ZERO WIDTH SPACE, U+200C ZERO WIDTH NON-JOINER, U+200D ZERO
/// WIDTH JOINER, U+FEFF ZERO WIDTH NO-BREAK SPACE (BOM), U+061C ARABIC
/// LETTER MARK, U+180E MONGOLIAN VOWEL SEPARATOR.
const ZERO_WIDTH_CHARS: [char; 6] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}', '\u{061C}', '\u{180E}'];

/// Homoglyph / confusable table, sorted by source `char` for binary search.
///
/// Covers the confusable ranges the specification calls out explicitly:
/// Cyrillic and Greek letters that are visually identical to Latin
/// letters, fullwidth ASCII punctuation, curly quotes, and non-ASCII
/// dashes. This is a fixed, closed table — it is not meant to be a
/// general confusables database (Unicode's own `confusables.txt` is
/// thousands of entries; the specification scopes this to the
/// characters attackers actually use to break naive substring matching).
#[rustfmt::skip]
const CONFUSABLES: &[(char, char)] = &[
    // Cyrillic -> Latin lookalikes (lowercase; case-folding runs first)
    ('а', 'a'), ('в', 'b'), ('е', 'e'), ('к', 'k'), ('м', 'm'),
    ('н', 'h'), ('о', 'o'), ('р', 'p'), ('с', 'c'), ('т', 't'),
    ('х', 'x'), ('у', 'y'), ('ѕ', 's'), ('і', 'i'), ('ј', 'j'),
    ('ԁ', 'd'), ('ԛ', 'q'), ('ԝ', 'w'),
    // Greek -> Latin lookalikes
    ('α', 'a'), ('β', 'b'), ('ε', 'e'), ('ι', 'i'), ('κ', 'k'),
    ('ν', 'v'), ('ο', 'o'), ('ρ', 'p'), ('τ', 't'), ('υ', 'u'),
    ('χ', 'x'), ('γ', 'y'),
    // Fullwidth ASCII punctuation and letters
    ('！', '!'), ('＂', '"'), ('＃', '#'), ('＄', '$'), ('％', '%'),
    ('＆', '&'), ('＇', '\''), ('（', '('), ('）', ')'), ('＊', '*'),
    ('＋', '+'), ('，', ','), ('－', '-'), ('．', '.'), ('／', '/'),
    ('：', ':'), ('；', ';'), ('＜', '<'), ('＝', '='), ('＞', '>'),
    ('？', '?'), ('＠', '@'), ('［', '['), ('＼', '\\'), ('］', ']'),
    ('＾', '^'), ('＿', '_'), ('｀', '`'), ('｛', '{'), ('｜', '|'),
    ('｝', '}'), ('～', '~'),
    // Curly quotes -> straight quotes
    ('\u{2018}', '\''), ('\u{2019}', '\''),
    ('\u{201C}', '"'), ('\u{201D}', '"'),
    // Non-ASCII dashes -> hyphen-minus
    ('\u{2010}', '-'), ('\u{2011}', '-'), ('\u{2012}', '-'),
    ('\u{2013}', '-'), ('\u{2014}', '-'), ('\u{2015}', '-'),
];

fn confusable_fold(c: char) -> char {
    match CONFUSABLES.binary_search_by_key(&c, |&(from, _)| from) {
        Ok(idx) => CONFUSABLES[idx].1,
        Err(_) => c,
    }
}

/// Per-stage transformation counts, useful for telemetry and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// Number of codepoints that changed under NFKC.
    pub nfkc_changed: usize,
    /// Number of codepoints that changed under case-folding.
    pub case_folded: usize,
    /// Number of zero-width characters removed.
    pub zero_width_removed: usize,
    /// Number of codepoints folded from a confusable table entry.
    pub confusables_folded: usize,
}

/// Result of normalizing a single string: the canonical text plus
/// per-stage statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The canonical form, after all four pipeline stages.
    pub text: String,
    /// Counts of how many codepoints each stage touched.
    pub stats: NormalizationStats,
}

/// Run the fixed four-stage normalization pipeline over `input`.
///
/// Total and pure: the same input always yields the same output, and no
/// step can fail (malformed input is not possible for a Rust `&str`,
/// which is guaranteed valid UTF-8).
#[must_use]
pub fn normalize(input: &str) -> Normalized {
    let mut stats = NormalizationStats::default();

    // Step 1: NFKC.
    let nfkc: String = input.nfkc().collect();
    stats.nfkc_changed = count_diff(input, &nfkc);

    // Step 2: full case-fold (lowercase by codepoint; chained because no
    // pack crate exposes CaseFolding.txt-style folding and stdlib's
    // `to_lowercase` already handles multi-codepoint expansions such as
    // German sharp s).
    let folded: String = nfkc.chars().flat_map(char::to_lowercase).collect();
    stats.case_folded = count_diff(&nfkc, &folded);

    // Step 3: strip zero-width / invisible-formatting characters.
    let stripped = strip_zero_width(&folded, &mut stats);

    // Step 4: homoglyph / confusable fold.
    let mut confusables_folded = 0usize;
    let folded_confusables: String = stripped
        .chars()
        .map(|c| {
            let replacement = confusable_fold(c);
            if replacement != c {
                confusables_folded += 1;
            }
            replacement
        })
        .collect();
    stats.confusables_folded = confusables_folded;

    Normalized {
        text: folded_confusables,
        stats,
    }
}

fn strip_zero_width<'a>(input: &'a str, stats: &mut NormalizationStats) -> Cow<'a, str> {
    if !input.chars().any(|c| ZERO_WIDTH_CHARS.contains(&c)) {
        return Cow::Borrowed(input);
    }

    let mut removed = 0usize;
    let cleaned: String = input
        .chars()
        .filter(|c| {
            if ZERO_WIDTH_CHARS.contains(c) {
                removed += 1;
                false
            } else {
                true
            }
        })
        .collect();
    stats.zero_width_removed = removed;
    Cow::Owned(cleaned)
}

/// Count how many codepoint positions differ between two equal-or-unequal
/// length strings, used purely for stats reporting. Not a true edit
/// distance — a cheap approximation that treats length changes as
/// touching every codepoint from the first divergence onward.
fn count_diff(before: &str, after: &str) -> usize {
    if before == after {
        return 0;
    }
    let mut b = before.chars();
    let mut a = after.chars();
    let mut changed = 0usize;
    loop {
        match (b.next(), a.next()) {
            (Some(x), Some(y)) => {
                if x != y {
                    changed += 1;
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                changed += 1;
            }
            (None, None) => break,
        }
    }
    changed
}

/// Hex-encoded SHA-256 digest of `input`, used by the certificate sealer.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
