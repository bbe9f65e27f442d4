//! Error kinds produced by the verification core.
//!
//! Three kinds, matching the error taxonomy in the specification:
//! [`NiucError::InvalidInput`] (malformed or oversize input, surfaced
//! immediately), [`NiucError::InternalFailure`] (unexpected condition
//! during normalization/detection/sealing, converted to a blocked seal
//! by the runtime gate), and [`NiucError::CertificateMalformed`] (used
//! only by the validator, never raised — it is returned as a value).

use thiserror::Error;

/// Errors raised by [`crate::checker::verify`] and the components it calls.
///
/// The core is fail-closed: callers should treat any `NiucError` as
/// grounds to refuse the interaction, not merely log it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NiucError {
    /// The input violated a structural bound from the data model (empty
    /// segment list, oversize text, bad channel token, oversize
    /// `source_id`, more than 1000 segments).
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable description of which bound was violated.
        reason: String,
    },

    /// An unexpected condition occurred during normalization, detection,
    /// or certificate sealing. The runtime gate converts this into a
    /// `Blocked` seal with empty violations; `verify` surfaces it as-is.
    #[error("internal failure: {reason}")]
    InternalFailure {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A certificate failed structural or semantic validation. Only
    /// produced by [`crate::certificate::validate`], which returns it as
    /// part of a `(bool, Option<NiucError>)` pair rather than as an `Err`.
    #[error("certificate malformed: {reason}")]
    CertificateMalformed {
        /// Which structural or semantic check failed.
        reason: String,
    },
}

impl NiucError {
    /// Build an [`NiucError::InvalidInput`] from any displayable reason.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Build an [`NiucError::InternalFailure`] from any displayable reason.
    pub fn internal_failure(reason: impl Into<String>) -> Self {
        Self::InternalFailure {
            reason: reason.into(),
        }
    }

    /// Build an [`NiucError::CertificateMalformed`] from any displayable reason.
    pub fn certificate_malformed(reason: impl Into<String>) -> Self {
        Self::CertificateMalformed {
            reason: reason.into(),
        }
    }
}
