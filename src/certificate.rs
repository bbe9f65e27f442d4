//! The Certificate Sealer (component G) and Validator (component H).
//!
//! A certificate is a deterministic, canonical-JSON record of a
//! verification/gate run: what was decided, what violations were found,
//! and hashes binding the certificate to its input and output text. The
//! schema below is bit-exact: field names, nesting, and the `"NIUC-1.0"`
//! version string are fixed so that two independent implementations of
//! this module produce byte-identical JSON for the same run (modulo the
//! `timestamp` field, which is wall-clock and therefore never part of
//! the equality callers should rely on).
//!
//! Canonical form: `serde_json::Value`'s `Map` is a `BTreeMap` (this
//! crate never enables serde_json's `preserve_order` feature), so
//! serializing through `Value` rather than deriving directly from the
//! struct yields alphabetically sorted keys with no extra whitespace —
//! exactly the canonicalization the certificate's `integrity_hash`
//! requires.
//!
//! Hashing always computes both the real output hash and the fixed
//! empty-string hash before selecting which one to record, regardless
//! of outcome — a deliberate constant-time-ish shape that avoids a
//! branch whose timing could otherwise leak the decision before the
//! certificate is returned.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::checker::{Decision, Stats, VerificationResult};
use crate::error::NiucError;
use crate::normalize::sha256_hex;

/// SHA-256 of the empty string, used as the fixed `output_sha256` for
/// every `Blocked` certificate — a blocked run never releases output,
/// so its output hash is pinned to this constant rather than hashing
/// whatever text happened to be discarded.
pub const EMPTY_STRING_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// The `version` field every certificate this module seals carries.
pub const CERTIFICATE_SCHEMA_VERSION: &str = "NIUC-1.0";

/// Outcome a gate run assigns, recorded via [`Certificate::decision`]
/// after mapping through [`SealedOutcome::as_decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealedOutcome {
    /// No violations; original text released unmodified.
    Pass,
    /// Violations found and the gate is in `Block` mode, or a
    /// certified rewrite's re-verification still found a violation; no
    /// output released.
    Blocked,
    /// Violations found, neutralized, and the rewrite re-verified clean.
    CertifiedRewrite,
}

impl SealedOutcome {
    fn as_decision(self) -> Decision {
        match self {
            SealedOutcome::Pass => Decision::Pass,
            SealedOutcome::Blocked => Decision::Blocked,
            SealedOutcome::CertifiedRewrite => Decision::Rewritten,
        }
    }
}

/// The inner, bit-exact certificate record. Field names and the
/// `version` constant match the specification's schema exactly;
/// `violations` is serialized as a flat array of `[start, end]` pairs
/// rather than an object per violation, since the schema does not
/// carry the matched category or text slice (those remain available on
/// [`VerificationResult`] for diagnostics, but are not part of the
/// sealed record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// `env!("CARGO_PKG_VERSION")` of the crate that sealed this
    /// certificate — distinct from `version`, which is the schema
    /// version.
    pub checker_version: String,
    /// `pass`, `blocked`, or `rewritten`.
    pub decision: Decision,
    /// SHA-256 hex digest of the normalized input text.
    pub input_sha256: String,
    /// SHA-256 hex digest of the released output text; pinned to
    /// [`EMPTY_STRING_HASH`] when `decision == Blocked`.
    pub output_sha256: String,
    /// SHA-256 hex digest over the character-tag vector used for this
    /// decision.
    pub provenance_sha256: String,
    /// Summary counters, mirrored directly from the originating
    /// [`VerificationResult`].
    pub stats: Stats,
    /// Unix timestamp (seconds) the certificate was sealed at.
    pub timestamp: i64,
    /// Certificate schema version; always [`CERTIFICATE_SCHEMA_VERSION`].
    pub version: String,
    /// Every violation, as `(start, end)` character offsets into the
    /// normalized text, in span order.
    pub violations: Vec<(u32, u32)>,
}

/// The outer, sealed wrapper: the certificate plus its own integrity
/// hash, computed over the canonical JSON of `certificate` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedCertificate {
    /// The bit-exact certificate record.
    pub certificate: Certificate,
    /// SHA-256 hex digest of `certificate`'s canonical JSON.
    pub integrity_hash: String,
}

impl SealedCertificate {
    /// Serialize the whole sealed certificate (certificate and
    /// integrity hash) to canonical JSON.
    #[must_use]
    pub fn to_canonical_json(&self) -> String {
        canonical_json(self)
    }

    /// Convenience accessor for the inner violation list.
    #[must_use]
    pub fn violations(&self) -> &[(u32, u32)] {
        &self.certificate.violations
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Build and seal a certificate from a verification result and the
/// text that will actually be released (empty for `Blocked`).
///
/// Computes both the real output's hash and [`EMPTY_STRING_HASH`] every
/// time, regardless of `outcome`, then selects the one to record — the
/// constant-time-ish discipline described in the module docs.
#[must_use]
pub fn seal(outcome: SealedOutcome, result: &VerificationResult, released_text: &str) -> SealedCertificate {
    let real_output_hash = sha256_hex(released_text);
    let blocked_output_hash = EMPTY_STRING_HASH.to_string();

    let output_sha256 = if outcome == SealedOutcome::Blocked {
        blocked_output_hash
    } else {
        real_output_hash
    };

    let violations = result
        .violations
        .iter()
        .map(|v| (v.span.start as u32, v.span.end as u32))
        .collect();

    let certificate = Certificate {
        checker_version: env!("CARGO_PKG_VERSION").to_string(),
        decision: outcome.as_decision(),
        input_sha256: result.input_sha256.clone(),
        output_sha256,
        provenance_sha256: result.provenance_sha256.clone(),
        stats: result.stats,
        timestamp: now_unix(),
        version: CERTIFICATE_SCHEMA_VERSION.to_string(),
        violations,
    };

    let integrity_hash = sha256_hex(&canonical_json(&certificate));
    SealedCertificate { certificate, integrity_hash }
}

/// Seal a fail-closed certificate for the case where verification
/// itself raised [`NiucError::InternalFailure`] before a
/// [`VerificationResult`] could be produced at all.
///
/// This is the one certificate shape the Validator's usual
/// violations-present invariant does not apply to: there is no
/// verification result to draw violations or stats from. Callers of
/// [`validate`] that encounter a `blocked` certificate with empty
/// `violations` and `input_sha256 == EMPTY_STRING_HASH` should treat it
/// as this fail-closed shape rather than a malformed one.
#[must_use]
pub fn seal_failure() -> SealedCertificate {
    let certificate = Certificate {
        checker_version: env!("CARGO_PKG_VERSION").to_string(),
        decision: Decision::Blocked,
        input_sha256: EMPTY_STRING_HASH.to_string(),
        output_sha256: EMPTY_STRING_HASH.to_string(),
        provenance_sha256: EMPTY_STRING_HASH.to_string(),
        stats: Stats::default(),
        timestamp: now_unix(),
        version: CERTIFICATE_SCHEMA_VERSION.to_string(),
        violations: Vec::new(),
    };
    let integrity_hash = sha256_hex(&canonical_json(&certificate));
    SealedCertificate { certificate, integrity_hash }
}

/// Serialize `value` to canonical JSON: sorted keys, no whitespace.
fn canonical_json<T: Serialize>(value: &T) -> String {
    let value = serde_json::to_value(value).expect("value always serializes");
    serde_json::to_string(&value).expect("serde_json::Value always serializes to a string")
}

static HEX64_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[0-9a-f]{64}$").expect("static hex64 pattern"));

/// Validate a certificate's structure and internal consistency.
///
/// Checks performed:
/// - Structural: `input_sha256`, `output_sha256`, and `provenance_sha256`
///   are each exactly 64 lowercase hex characters; `version` matches
///   [`CERTIFICATE_SCHEMA_VERSION`]; every violation pair has
///   `start < end`.
/// - Semantic: `decision == pass` if and only if `violations` is empty;
///   `decision` of `blocked` or `rewritten` implies `violations` is
///   non-empty (except the fail-closed shape from [`seal_failure`]);
///   `decision == blocked` implies `output_sha256 == EMPTY_STRING_HASH`.
/// - Integrity: recomputing the canonical JSON hash of `certificate`
///   reproduces the recorded `integrity_hash`.
///
/// # Errors
///
/// Returns `(false, Some(NiucError::CertificateMalformed))` describing
/// the first failed check. Returns `(true, None)` if every check
/// passes.
#[must_use]
pub fn validate(sealed: &SealedCertificate) -> (bool, Option<NiucError>) {
    let certificate = &sealed.certificate;

    for (field_name, value) in [
        ("input_sha256", &certificate.input_sha256),
        ("output_sha256", &certificate.output_sha256),
        ("provenance_sha256", &certificate.provenance_sha256),
    ] {
        if !HEX64_PATTERN.is_match(value) {
            return (
                false,
                Some(NiucError::certificate_malformed(format!(
                    "{field_name} is not a 64-character lowercase hex digest"
                ))),
            );
        }
    }

    if certificate.version != CERTIFICATE_SCHEMA_VERSION {
        return (
            false,
            Some(NiucError::certificate_malformed(format!(
                "unexpected certificate version {:?}, expected {CERTIFICATE_SCHEMA_VERSION:?}",
                certificate.version
            ))),
        );
    }

    for &(start, end) in &certificate.violations {
        if start >= end {
            return (
                false,
                Some(NiucError::certificate_malformed(
                    "violation span start must be less than end",
                )),
            );
        }
    }

    let violations_present = !certificate.violations.is_empty();
    match certificate.decision {
        Decision::Pass if violations_present => {
            return (
                false,
                Some(NiucError::certificate_malformed(
                    "decision is pass but violations is non-empty",
                )),
            );
        }
        Decision::Blocked if !violations_present => {
            if certificate.input_sha256 != EMPTY_STRING_HASH {
                return (
                    false,
                    Some(NiucError::certificate_malformed(
                        "blocked decision implies violations but violations is empty",
                    )),
                );
            }
        }
        Decision::Rewritten if !violations_present => {
            return (
                false,
                Some(NiucError::certificate_malformed(
                    "rewritten decision implies violations but violations is empty",
                )),
            );
        }
        _ => {}
    }

    if certificate.decision == Decision::Blocked && certificate.output_sha256 != EMPTY_STRING_HASH {
        return (
            false,
            Some(NiucError::certificate_malformed(
                "blocked decision must have output_sha256 pinned to the empty-string hash",
            )),
        );
    }

    let expected_integrity_hash = sha256_hex(&canonical_json(certificate));
    if expected_integrity_hash != sealed.integrity_hash {
        return (
            false,
            Some(NiucError::certificate_malformed(
                "integrity_hash does not match the recomputed canonical JSON hash",
            )),
        );
    }

    (true, None)
}

/// The specification's external validator entry point: parse a
/// certificate's canonical JSON and validate it, returning a plain
/// `(ok, error_message)` pair rather than the `NiucError` callers
/// working directly with [`SealedCertificate`] get from [`validate`].
#[must_use]
pub fn validate_json(certificate_json: &str) -> (bool, Option<String>) {
    match serde_json::from_str::<SealedCertificate>(certificate_json) {
        Ok(sealed) => {
            let (ok, err) = validate(&sealed);
            (ok, err.map(|e| e.to_string()))
        }
        Err(e) => (false, Some(format!("malformed certificate JSON: {e}"))),
    }
}
