//! The Provenance Builder (component B): tags every character of
//! normalized text with where it came from.
//!
//! The specification fixes the *safe* design here: each input segment is
//! normalized independently, and its character tags are generated from
//! its own normalized length. The normalized segments are then
//! concatenated to form the text the Detector runs over. This is
//! deliberately different from a design that normalizes the full
//! concatenated text once and then proportionally back-maps character
//! offsets to segments — that approach is flagged as unsafe in the
//! specification's design notes, because normalization can change a
//! segment's length (NFKC expansion, zero-width removal), which breaks
//! any offset mapping computed after concatenation. Per-segment
//! normalization avoids the problem entirely: there is never a mapping
//! to get wrong, because tags are generated in lockstep with
//! normalization.

use crate::error::NiucError;
use crate::normalize::normalize;

/// Trust channel an input segment arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Directly authored by the operator of the system; fully trusted.
    Trusted,
    /// Retrieved from an external source: documents, tool output, web
    /// content, or anything else not directly authored by the operator.
    Untrusted,
}

/// One input segment: a contiguous run of text from a single channel and
/// source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Trust channel this segment arrived on.
    pub channel: Channel,
    /// Identifier of the originating source (file path, URL, tool name).
    /// Bounded to `max_source_id_chars` characters by the caller.
    pub source_id: String,
    /// Raw, not-yet-normalized text of this segment.
    pub text: String,
}

impl Segment {
    /// Construct a new segment.
    pub fn new(channel: Channel, source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel,
            source_id: source_id.into(),
            text: text.into(),
        }
    }

    /// Construct a trusted segment.
    pub fn trusted(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Channel::Trusted, source_id, text)
    }

    /// Construct an untrusted segment.
    pub fn untrusted(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Channel::Untrusted, source_id, text)
    }
}

/// Provenance tag attached to a single character of normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterTag {
    /// Trust channel of the segment this character came from.
    pub channel: Channel,
    /// Index into the caller's segment list identifying the source.
    pub segment_index: usize,
    /// Index of this character within its segment's *normalized* text.
    pub local_index: usize,
}

/// A segment after normalization, paired with the character tags for its
/// normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSegment {
    /// Original segment metadata (channel, source id).
    pub channel: Channel,
    /// Source identifier, carried through from the input segment.
    pub source_id: String,
    /// This segment's text after running the normalization pipeline.
    pub normalized_text: String,
}

/// Output of the Provenance Builder: the concatenated normalized text
/// plus one [`CharacterTag`] per character, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Concatenation of every segment's normalized text, in input order.
    /// This is the text the Detector runs over.
    pub text: String,
    /// One tag per character of `text`; `tags.len() == text.chars().count()`.
    pub tags: Vec<CharacterTag>,
    /// Per-segment normalization detail, for diagnostics and certificates.
    pub segments: Vec<NormalizedSegment>,
}

/// Maximum number of segments accepted per the data model's structural
/// bound (distinct from the configurable [`crate::config::NiucPolicy`]
/// bound, which may tighten this further).
pub const MAX_SEGMENTS: usize = 1000;

/// Default per-segment size bound, in bytes: 1 MiB.
pub const MAX_SEGMENT_BYTES: usize = 1024 * 1024;

/// Default combined size bound across all segments, in bytes: 10 MiB.
pub const MAX_TOTAL_BYTES: usize = 10 * 1024 * 1024;

/// Default maximum length of a `source_id`, in characters.
pub const MAX_SOURCE_ID_CHARS: usize = 1000;

/// Structural size bounds enforced before provenance is built.
///
/// The free functions [`build_provenance`] and [`crate::checker::verify`]
/// apply the fixed defaults above, matching the data model's constants.
/// [`crate::config::NiucPolicy`] may construct a tighter [`SizeLimits`]
/// and pass it to [`build_provenance_with_limits`] /
/// [`crate::checker::verify_with_limits`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    /// Maximum size of a single segment's raw text, in bytes.
    pub max_segment_bytes: usize,
    /// Maximum combined size of every segment's raw text, in bytes.
    pub max_total_bytes: usize,
    /// Maximum number of segments.
    pub max_segments: usize,
    /// Maximum length of a `source_id`, in characters.
    pub max_source_id_chars: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_segment_bytes: MAX_SEGMENT_BYTES,
            max_total_bytes: MAX_TOTAL_BYTES,
            max_segments: MAX_SEGMENTS,
            max_source_id_chars: MAX_SOURCE_ID_CHARS,
        }
    }
}

/// Build character-level provenance for a list of input segments, under
/// the data model's fixed default [`SizeLimits`].
///
/// Normalizes each segment independently (the safe design — see module
/// docs), tags every resulting character with its originating channel,
/// segment index, and local index, then concatenates.
///
/// # Errors
///
/// Returns [`NiucError::InvalidInput`] if `segments` fails any structural
/// bound — see [`build_provenance_with_limits`].
pub fn build_provenance(segments: &[Segment]) -> Result<Provenance, NiucError> {
    build_provenance_with_limits(segments, &SizeLimits::default())
}

/// Build character-level provenance under caller-supplied [`SizeLimits`].
///
/// # Errors
///
/// Returns [`NiucError::InvalidInput`] if:
/// - `segments` is empty or exceeds `limits.max_segments`;
/// - any segment's raw text exceeds `limits.max_segment_bytes`;
/// - any segment's `source_id` exceeds `limits.max_source_id_chars`
///   characters;
/// - the combined raw text of every segment exceeds `limits.max_total_bytes`.
pub fn build_provenance_with_limits(
    segments: &[Segment],
    limits: &SizeLimits,
) -> Result<Provenance, NiucError> {
    if segments.is_empty() {
        return Err(NiucError::invalid_input("segment list must not be empty"));
    }
    if segments.len() > limits.max_segments {
        return Err(NiucError::invalid_input(format!(
            "segment list has {} segments, exceeding the maximum of {}",
            segments.len(),
            limits.max_segments
        )));
    }

    let mut total_bytes = 0usize;
    for segment in segments {
        if segment.text.len() > limits.max_segment_bytes {
            return Err(NiucError::invalid_input(format!(
                "segment '{}' is {} bytes, exceeding the per-segment maximum of {}",
                segment.source_id,
                segment.text.len(),
                limits.max_segment_bytes
            )));
        }
        if segment.source_id.chars().count() > limits.max_source_id_chars {
            return Err(NiucError::invalid_input(format!(
                "source_id '{}' exceeds the maximum of {} characters",
                segment.source_id, limits.max_source_id_chars
            )));
        }
        total_bytes = total_bytes.saturating_add(segment.text.len());
    }
    if total_bytes > limits.max_total_bytes {
        return Err(NiucError::invalid_input(format!(
            "total input is {total_bytes} bytes, exceeding the maximum of {}",
            limits.max_total_bytes
        )));
    }

    let mut text = String::new();
    let mut tags = Vec::new();
    let mut normalized_segments = Vec::with_capacity(segments.len());

    for (segment_index, segment) in segments.iter().enumerate() {
        let normalized = normalize(&segment.text);

        for (local_index, _) in normalized.text.chars().enumerate() {
            tags.push(CharacterTag {
                channel: segment.channel,
                segment_index,
                local_index,
            });
        }

        text.push_str(&normalized.text);
        normalized_segments.push(NormalizedSegment {
            channel: segment.channel,
            source_id: segment.source_id.clone(),
            normalized_text: normalized.text,
        });
    }

    debug_assert_eq!(tags.len(), text.chars().count());

    Ok(Provenance {
        text,
        tags,
        segments: normalized_segments,
    })
}

impl Provenance {
    /// Trust verdict for a character range `[start, end)` (character
    /// indices into `self.text`): `Trusted` only if every character in
    /// the range is tagged `Trusted`, `Untrusted` otherwise.
    ///
    /// An empty range (`start == end`) is conservatively `Untrusted` —
    /// there is no character to vouch for trust, so no trust is granted.
    #[must_use]
    pub fn span_trust(&self, start: usize, end: usize) -> Channel {
        if start >= end {
            return Channel::Untrusted;
        }
        let Some(slice) = self.tags.get(start..end) else {
            return Channel::Untrusted;
        };
        if slice.iter().all(|tag| tag.channel == Channel::Trusted) {
            Channel::Trusted
        } else {
            Channel::Untrusted
        }
    }
}
