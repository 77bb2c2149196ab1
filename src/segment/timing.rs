//! Proportional time assignment for fallback segmentation.
//!
//! When the external aligner yields nothing, text units get timestamps
//! by character-length proportion: the span `duration − offset` is
//! divided among the units so that a unit holding a third of the
//! transcript's characters gets a third of the span.  Units are laid
//! out back-to-back starting at `offset` with zero gap.

use thiserror::Error;

use super::Segment;

/// Errors from proportional time assignment.
#[derive(Debug, Error)]
pub enum TimingError {
    /// The operator-supplied start offset leaves no span to lay out.
    #[error("start offset {offset}s exceeds audio duration {duration}s")]
    OffsetExceedsDuration { offset: f64, duration: f64 },

    /// A negative offset would place segment starts before zero.
    #[error("start offset {offset}s must not be negative")]
    NegativeOffset { offset: f64 },
}

/// Lay out `units` across `[offset, duration]` in proportion to their
/// character counts, producing segments with fresh ids.
///
/// Boundaries are computed cumulatively so consecutive segments share an
/// exact boundary value and the last segment ends exactly at `duration`.
///
/// # Errors
///
/// [`TimingError::NegativeOffset`] when `offset < 0`;
/// [`TimingError::OffsetExceedsDuration`] when `offset >= duration`.
pub fn assign_times(
    units: &[String],
    duration: f64,
    offset: f64,
) -> Result<Vec<Segment>, TimingError> {
    if offset < 0.0 {
        return Err(TimingError::NegativeOffset { offset });
    }
    if offset >= duration {
        return Err(TimingError::OffsetExceedsDuration { offset, duration });
    }

    let span = duration - offset;
    let lengths: Vec<usize> = units.iter().map(|u| u.chars().count()).collect();
    let total: usize = lengths.iter().sum();

    // Degenerate case: all units empty. Should not occur after the
    // splitter, but keep the output well-formed.
    if total == 0 {
        return Ok(units
            .iter()
            .map(|u| Segment::new(u.clone(), offset, offset))
            .collect());
    }

    let mut segments = Vec::with_capacity(units.len());
    let mut consumed: usize = 0;
    let mut start = offset;
    for (unit, len) in units.iter().zip(&lengths) {
        consumed += len;
        let end = if consumed == total {
            duration
        } else {
            offset + span * (consumed as f64 / total as f64)
        };
        segments.push(Segment::new(unit.clone(), start, end));
        start = end;
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::is_time_monotonic;

    const EPS: f64 = 1e-9;

    fn units(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn offset_at_or_past_duration_fails() {
        let u = units(&["abcd"]);
        assert!(assign_times(&u, 10.0, 10.0).is_err());
        assert!(assign_times(&u, 10.0, 12.5).is_err());
    }

    #[test]
    fn negative_offset_is_rejected() {
        // A negative offset would seed the layout before t=0 and mint
        // segments with negative starts.
        let u = units(&["abcd", "abcdefgh"]);
        assert!(matches!(
            assign_times(&u, 10.0, -3.0),
            Err(TimingError::NegativeOffset { .. })
        ));
    }

    #[test]
    fn spec_example_four_and_eight_chars() {
        // duration=10, offset=2, lengths [4, 8] → spans 2.667 / 5.333.
        let u = units(&["abcd", "abcdefgh"]);
        let segs = assign_times(&u, 10.0, 2.0).unwrap();
        assert_eq!(segs.len(), 2);
        assert!((segs[0].start - 2.0).abs() < EPS);
        assert!((segs[0].end - (2.0 + 8.0 * 4.0 / 12.0)).abs() < EPS);
        assert!((segs[1].start - segs[0].end).abs() < EPS);
        assert!((segs[1].end - 10.0).abs() < EPS);
    }

    #[test]
    fn segments_are_contiguous_and_cover_span() {
        let u = units(&["one unit", "a second unit", "third", "the very last unit here"]);
        let segs = assign_times(&u, 37.5, 1.25).unwrap();
        assert!((segs[0].start - 1.25).abs() < EPS);
        for w in segs.windows(2) {
            assert_eq!(w[0].end, w[1].start);
        }
        assert_eq!(segs.last().unwrap().end, 37.5);
        let total: f64 = segs.iter().map(|s| s.duration()).sum();
        assert!((total - 36.25).abs() < 1e-6);
        assert!(is_time_monotonic(&segs));
    }

    #[test]
    fn single_unit_takes_whole_span() {
        let u = units(&["only one"]);
        let segs = assign_times(&u, 60.0, 0.0).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start, 0.0);
        assert_eq!(segs[0].end, 60.0);
    }

    #[test]
    fn empty_units_yield_zero_width_at_offset() {
        let u = units(&["", ""]);
        let segs = assign_times(&u, 5.0, 1.0).unwrap();
        for s in &segs {
            assert_eq!(s.start, 1.0);
            assert_eq!(s.end, 1.0);
        }
    }

    #[test]
    fn proportions_follow_char_counts() {
        let u = units(&["aa", "aaaa", "aa"]);
        let segs = assign_times(&u, 8.0, 0.0).unwrap();
        assert!((segs[0].duration() - 2.0).abs() < EPS);
        assert!((segs[1].duration() - 4.0).abs() < EPS);
        assert!((segs[2].duration() - 2.0).abs() < EPS);
    }
}
