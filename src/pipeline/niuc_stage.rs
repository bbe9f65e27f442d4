//! [`NiucStage`]: the [`GuardrailStage`] adapter wrapping the
//! verification core.

use async_trait::async_trait;

use super::content::Content;
use super::outcome::{Severity, StageError, StageOutcome};
use super::stage::{GuardrailStage, SecurityContext};
use crate::certificate::SealedOutcome;
use crate::config::NiucPolicy;
use crate::gate::{process_with_limits, RuntimeMode};
use crate::provenance::{Segment, SizeLimits};

/// Guardrail stage that runs every piece of [`Content`] it receives
/// through the verification core's runtime gate.
///
/// Any `Content` value is flattened to its plaintext surface via
/// [`Content::as_text`] and treated as a single
/// [`crate::provenance::Channel::Untrusted`] segment — this stage has no
/// way to know, from `Content` alone, which parts of a structured
/// payload were authored by the operator versus retrieved from
/// elsewhere, so it conservatively treats the whole thing as untrusted.
/// Callers that can distinguish trusted and untrusted spans themselves
/// should call [`crate::checker::verify`] or [`crate::gate::process`]
/// directly with a properly segmented `Vec<Segment>` instead of going
/// through this adapter.
pub struct NiucStage {
    mode: RuntimeMode,
    limits: SizeLimits,
}

impl NiucStage {
    /// Construct a stage running in the given runtime mode, under the
    /// data model's fixed default size bounds.
    #[must_use]
    pub fn new(mode: RuntimeMode) -> Self {
        Self { mode, limits: SizeLimits::default() }
    }

    /// Construct a stage in `Block` mode (the secure default).
    #[must_use]
    pub fn blocking() -> Self {
        Self::new(RuntimeMode::Block)
    }

    /// Construct a stage in `CertifiedRewrite` mode.
    #[must_use]
    pub fn certified_rewrite() -> Self {
        Self::new(RuntimeMode::CertifiedRewrite)
    }

    /// Construct a stage whose runtime mode and size bounds are driven by
    /// a [`NiucPolicy`], e.g. one loaded by [`crate::config::PolicyBuilder`].
    #[must_use]
    pub fn from_policy(policy: &NiucPolicy) -> Self {
        Self {
            mode: policy.runtime_mode,
            limits: policy.size_limits(),
        }
    }
}

#[async_trait]
impl GuardrailStage for NiucStage {
    fn id(&self) -> &str {
        "niuc"
    }

    fn priority(&self) -> u32 {
        20
    }

    fn degradable(&self) -> bool {
        // A verification core that cannot run must never be silently
        // skipped; a deployment that wants best-effort degradation
        // should not rely on this stage failing closed for it.
        false
    }

    async fn evaluate(
        &self,
        content: &Content,
        _ctx: &SecurityContext,
    ) -> Result<StageOutcome, StageError> {
        let text = content.as_text();
        let segments = vec![Segment::untrusted(content.variant_name(), text.into_owned())];

        let result = process_with_limits(&segments, self.mode, &self.limits);

        Ok(match result.outcome {
            SealedOutcome::Pass => StageOutcome::allow(1.0),
            SealedOutcome::CertifiedRewrite => StageOutcome::transform(
                Content::Text(result.final_text),
                format!(
                    "neutralized {} imperative span(s) from untrusted content",
                    result.certificate.violations().len()
                ),
            ),
            SealedOutcome::Blocked => StageOutcome::block(
                format!(
                    "{} imperative span(s) detected in untrusted content",
                    result
                        .original
                        .map(|r| r.violations.len())
                        .unwrap_or_default()
                ),
                Severity::High,
            ),
        })
    }
}
