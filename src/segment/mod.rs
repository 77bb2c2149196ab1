//! Timed transcript segments.
//!
//! A [`Segment`] is a time-bounded slice of transcript text aligned to a
//! span of audio.  Segments come from either the external aligner
//! ([`crate::align`]) or the local fallback ([`splitter`] + [`timing`]).
//!
//! Two invariants hold for every segment sequence stored on a material:
//!
//! * time-monotonic: `seg[i].end ≤ seg[i+1].start` (small tolerance);
//! * text-preserving: the single-spaced concatenation of segment texts
//!   equals the whitespace-normalized transcript — no words added,
//!   dropped, or altered.

pub mod splitter;
pub mod timing;

pub use splitter::split_sentences;
pub use timing::{assign_times, TimingError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overlap tolerance for the monotonicity check, in seconds.
pub const TIME_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// A time-bounded slice of transcript text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Opaque identifier, unique within a material.
    pub id: String,
    /// Transcript text for this span.  Never empty.
    pub text: String,
    /// Start of the span in seconds, `≥ 0`.
    pub start: f64,
    /// End of the span in seconds, `> start`.
    pub end: f64,
}

impl Segment {
    /// Build a segment with a freshly generated id.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            start,
            end,
        }
    }

    /// Span length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` falls inside this segment's half-open span `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

// ---------------------------------------------------------------------------
// Normalization + invariant checks
// ---------------------------------------------------------------------------

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `segments` are ordered and non-overlapping in time.
pub fn is_time_monotonic(segments: &[Segment]) -> bool {
    segments
        .windows(2)
        .all(|w| w[0].end <= w[1].start + TIME_TOLERANCE)
}

/// Whether the segment texts reassemble the transcript exactly
/// (whitespace-normalized on both sides).
pub fn preserves_text(segments: &[Segment], transcript: &str) -> bool {
    let joined = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&joined) == normalize_whitespace(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, start: f64, end: f64) -> Segment {
        Segment::new(text, start, end)
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = seg("a", 0.0, 1.0);
        let b = seg("b", 1.0, 2.0);
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let s = seg("x", 1.0, 3.0);
        assert!(s.contains(1.0));
        assert!(s.contains(2.999));
        assert!(!s.contains(3.0));
        assert!(!s.contains(0.999));
    }

    #[test]
    fn normalize_collapses_runs_and_trims() {
        assert_eq!(normalize_whitespace("  a \t b\n\nc "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn monotonic_accepts_contiguous_and_gapped() {
        let segs = vec![seg("a", 0.0, 1.0), seg("b", 1.0, 2.0), seg("c", 2.5, 3.0)];
        assert!(is_time_monotonic(&segs));
    }

    #[test]
    fn monotonic_rejects_overlap() {
        let segs = vec![seg("a", 0.0, 1.5), seg("b", 1.0, 2.0)];
        assert!(!is_time_monotonic(&segs));
    }

    #[test]
    fn preserves_text_ignores_spacing_differences() {
        let segs = vec![seg("Okay. I think", 0.0, 1.0), seg("we should go.", 1.0, 2.0)];
        assert!(preserves_text(&segs, "Okay.  I think we should go."));
        assert!(!preserves_text(&segs, "Okay. I think we should stay."));
    }

    #[test]
    fn round_trips_through_json() {
        let s = seg("hello there", 0.5, 2.25);
        let json = serde_json::to_string(&s).unwrap();
        let back: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, s.id);
        assert_eq!(back.text, s.text);
        assert_eq!(back.start, s.start);
        assert_eq!(back.end, s.end);
    }
}
