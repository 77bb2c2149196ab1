//! Playback/sync engine — maps continuous clock time to segment state.
//!
//! [`PlayerEngine`] owns the cursor state for one material: the active
//! segment index, the per-segment repetition counter, and the transport
//! clock.  A driver ([`super::PlayerDriver`]) calls [`tick`] on a fixed
//! cadence; every user action (skip, scrub, replay) goes through the
//! engine so the next tick always observes fresh cursor state.
//!
//! Two playback modes:
//! * **Sentence** — loops the active segment `LoopSetting` times, then
//!   pauses with the cursor reset to the segment start.
//! * **Article** — continuous playthrough; the active segment is derived
//!   state only (highlighting / auto-scroll).

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

use super::clock::TransportClock;

/// Seconds before a segment's end at which the boundary fires.  Polling
/// is not frame-accurate; firing slightly early avoids bleeding into the
/// next segment.
pub const BOUNDARY_LEAD_SECS: f64 = 0.15;

/// Seconds into a segment beyond which `skip(Prev)` replays the current
/// segment instead of moving back.
pub const PREV_REPLAY_THRESHOLD_SECS: f64 = 2.0;

// ---------------------------------------------------------------------------
// PlaybackMode / LoopSetting / SkipDirection
// ---------------------------------------------------------------------------

/// Playback granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Loop each segment, pausing at its boundary.
    Sentence,
    /// Continuous playthrough; no auto-looping.
    Article,
}

/// Repetitions per segment in sentence mode.  The UI offers 1, 2, 3 or
/// infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopSetting {
    Count(u32),
    /// Never auto-stops.
    Infinite,
}

impl LoopSetting {
    /// Loop target, `None` for infinite.
    pub fn target(&self) -> Option<u32> {
        match self {
            LoopSetting::Count(n) => Some((*n).max(1)),
            LoopSetting::Infinite => None,
        }
    }
}

/// Segment navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Next,
    Prev,
}

// ---------------------------------------------------------------------------
// CursorState
// ---------------------------------------------------------------------------

/// Snapshot of the playback cursor, handed to the UI every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorState {
    /// Clock position in seconds.
    pub current_time: f64,
    /// Index of the active segment, `-1` when none has matched yet.
    pub active_index: i32,
    /// Completed repetitions of the active segment (sentence mode).
    pub play_count: u32,
    /// Whether the transport is running.
    pub playing: bool,
}

// ---------------------------------------------------------------------------
// PlayerEngine
// ---------------------------------------------------------------------------

/// Per-material playback state machine.
///
/// The engine exclusively owns the cursor state; loading a different
/// material means constructing a fresh engine (cursor implicitly resets
/// to `(0, -1, 0, false)`).
pub struct PlayerEngine {
    segments: Vec<Segment>,
    clock: Box<dyn TransportClock>,
    mode: PlaybackMode,
    loop_setting: LoopSetting,
    active_index: i32,
    play_count: u32,
}

impl PlayerEngine {
    pub fn new(
        segments: Vec<Segment>,
        clock: Box<dyn TransportClock>,
        mode: PlaybackMode,
        loop_setting: LoopSetting,
    ) -> Self {
        Self {
            segments,
            clock,
            mode,
            loop_setting,
            active_index: -1,
            play_count: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    pub fn cursor(&self) -> CursorState {
        CursorState {
            current_time: self.clock.current_time(),
            active_index: self.active_index,
            play_count: self.play_count,
            playing: self.clock.is_playing(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn loop_setting(&self) -> LoopSetting {
        self.loop_setting
    }

    /// The active segment, when one has been resolved.
    pub fn active_segment(&self) -> Option<&Segment> {
        usize::try_from(self.active_index)
            .ok()
            .and_then(|i| self.segments.get(i))
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance derived state from the clock.  Called by the driver on a
    /// fixed cadence; cheap enough to call from every UI frame too.
    pub fn tick(&mut self) -> CursorState {
        let t = self.clock.current_time();

        // Active segment: first index whose span contains t.  In a gap
        // the previous index is kept — no deselection mid-material.
        if let Some(i) = self.segments.iter().position(|s| s.contains(t)) {
            if self.active_index != i as i32 {
                log::debug!("player: active segment -> {i} at t={t:.3}");
                self.active_index = i as i32;
            }
        }

        if self.clock.is_playing() {
            match self.mode {
                PlaybackMode::Sentence => self.check_boundary(t),
                PlaybackMode::Article => {
                    // Run off the end of the material, then stop.
                    if t >= self.clock.duration() {
                        self.clock.pause();
                    }
                }
            }
        }

        self.cursor()
    }

    /// Sentence-mode boundary: fires at `end − BOUNDARY_LEAD_SECS` of
    /// the active segment.
    fn check_boundary(&mut self, t: f64) {
        let Some(seg) = self.active_segment() else {
            return;
        };
        if t < seg.end - BOUNDARY_LEAD_SECS {
            return;
        }
        let start = seg.start;
        self.play_count += 1;
        match self.loop_setting.target() {
            Some(n) if self.play_count >= n => {
                // Done with this segment: pause at its start, ready to
                // replay or move on.
                log::debug!(
                    "player: segment {} finished {} repetition(s), pausing",
                    self.active_index,
                    self.play_count
                );
                self.clock.pause();
                self.clock.seek(start);
                self.play_count = 0;
            }
            _ => {
                // More repetitions due (or infinite): loop back.
                self.clock.seek(start);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Jump to the previous/next segment and start playing it.
    ///
    /// With no active segment yet, both directions initialize to segment
    /// 0.  `Next` clamps to the last segment.  `Prev` replays the
    /// current segment when more than [`PREV_REPLAY_THRESHOLD_SECS`]
    /// have elapsed into it, and clamps to 0 otherwise.  No-op on an
    /// empty segment list.
    pub fn skip(&mut self, direction: SkipDirection) {
        if self.segments.is_empty() {
            return;
        }
        let last = self.segments.len() - 1;
        let target = match usize::try_from(self.active_index) {
            Err(_) => 0,
            Ok(current) => match direction {
                SkipDirection::Next => (current + 1).min(last),
                SkipDirection::Prev => {
                    let elapsed = self.clock.current_time() - self.segments[current].start;
                    if elapsed > PREV_REPLAY_THRESHOLD_SECS {
                        current
                    } else {
                        current.saturating_sub(1)
                    }
                }
            },
        };
        self.start_at(target);
    }

    /// Seek the cursor to the active segment's start and play.
    pub fn replay_current(&mut self) {
        if self.segments.is_empty() {
            return;
        }
        let target = usize::try_from(self.active_index).unwrap_or(0);
        self.start_at(target);
    }

    /// Scrub by `delta` seconds, clamped into `[0, duration]`.
    ///
    /// Only meaningful on real-audio clocks; returns `false` (and does
    /// nothing) when the clock does not support scrubbing.
    pub fn seek_relative(&mut self, delta: f64) -> bool {
        if !self.clock.supports_scrub() {
            return false;
        }
        let target = (self.clock.current_time() + delta).clamp(0.0, self.clock.duration());
        self.clock.seek(target);
        true
    }

    fn start_at(&mut self, index: usize) {
        let start = self.segments[index].start;
        self.active_index = index as i32;
        self.play_count = 0;
        self.clock.seek(start);
        self.clock.play();
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn set_loop_setting(&mut self, setting: LoopSetting) {
        self.loop_setting = setting;
        self.play_count = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
