//! Transport clocks — the single time-source seam of the player.
//!
//! The engine never talks to an audio element or a timer directly; it
//! drives a [`TransportClock`].  Two implementations exist:
//!
//! * [`MediaClock`] — mirrors a host media element.  The host reports
//!   position/duration/playing through a [`MediaClockHandle`] and drains
//!   [`MediaCommand`]s to execute on its element.  Supports scrubbing.
//! * [`TimerClock`] — wall-clock simulation for materials without audio.
//!   Its span is fixed at construction (last segment end, or the default
//!   session length).  Does not support scrubbing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

// ---------------------------------------------------------------------------
// TransportClock
// ---------------------------------------------------------------------------

/// Abstract playback time source.
///
/// `current_time` and `duration` are in seconds.  `seek` clamps into
/// `[0, duration]`.
pub trait TransportClock: Send {
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, secs: f64);
    /// Whether arbitrary scrubbing (relative seeks) is meaningful.
    /// Only real-audio clocks support it.
    fn supports_scrub(&self) -> bool;
}

// ---------------------------------------------------------------------------
// TimerClock
// ---------------------------------------------------------------------------

/// Simulated clock for materials with no audio resource.
///
/// Time advances with the wall clock while playing and freezes on
/// pause.  The cursor never passes `span`.
pub struct TimerClock {
    span: f64,
    /// Cursor position at the last play/pause/seek transition.
    base: f64,
    started_at: Option<Instant>,
}

impl TimerClock {
    /// A clock spanning `span` seconds, stopped at 0.
    pub fn new(span: f64) -> Self {
        Self {
            span: span.max(0.0),
            base: 0.0,
            started_at: None,
        }
    }
}

impl TransportClock for TimerClock {
    fn current_time(&self) -> f64 {
        let t = match self.started_at {
            Some(at) => self.base + at.elapsed().as_secs_f64(),
            None => self.base,
        };
        t.min(self.span)
    }

    fn duration(&self) -> f64 {
        self.span
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn play(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base = self.current_time();
        self.started_at = None;
    }

    fn seek(&mut self, secs: f64) {
        self.base = secs.clamp(0.0, self.span);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn supports_scrub(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// MediaClock
// ---------------------------------------------------------------------------

/// A transport command for the host's media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    Play,
    Pause,
    Seek(f64),
}

#[derive(Debug, Default)]
struct MediaState {
    current_time: f64,
    duration: f64,
    playing: bool,
}

#[derive(Default)]
struct MediaShared {
    state: Mutex<MediaState>,
    commands: Mutex<VecDeque<MediaCommand>>,
}

/// Clock mirroring a host-owned media element.
///
/// Engine-side: reads the mirrored state, queues commands.  The mirror
/// is updated optimistically on `seek`/`play`/`pause` so the very next
/// engine tick sees the post-seek cursor instead of a stale position
/// still in flight on the host side.
pub struct MediaClock {
    shared: Arc<MediaShared>,
}

/// Host-side handle paired with a [`MediaClock`].
///
/// The host reports element events into the mirror and drains queued
/// commands to apply to its element.
#[derive(Clone)]
pub struct MediaClockHandle {
    shared: Arc<MediaShared>,
}

impl MediaClock {
    /// Create a clock/handle pair for a media element of `duration`
    /// seconds.
    pub fn new(duration: f64) -> (Self, MediaClockHandle) {
        let shared = Arc::new(MediaShared::default());
        shared.state.lock().unwrap().duration = duration.max(0.0);
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MediaClockHandle { shared },
        )
    }

    fn push(&self, cmd: MediaCommand) {
        self.shared.commands.lock().unwrap().push_back(cmd);
    }
}

impl TransportClock for MediaClock {
    fn current_time(&self) -> f64 {
        self.shared.state.lock().unwrap().current_time
    }

    fn duration(&self) -> f64 {
        self.shared.state.lock().unwrap().duration
    }

    fn is_playing(&self) -> bool {
        self.shared.state.lock().unwrap().playing
    }

    fn play(&mut self) {
        self.shared.state.lock().unwrap().playing = true;
        self.push(MediaCommand::Play);
    }

    fn pause(&mut self) {
        self.shared.state.lock().unwrap().playing = false;
        self.push(MediaCommand::Pause);
    }

    fn seek(&mut self, secs: f64) {
        let mut st = self.shared.state.lock().unwrap();
        let clamped = secs.clamp(0.0, st.duration);
        st.current_time = clamped;
        drop(st);
        self.push(MediaCommand::Seek(clamped));
    }

    fn supports_scrub(&self) -> bool {
        true
    }
}

impl MediaClockHandle {
    /// Report a timeupdate / polled position from the element.
    pub fn report_position(&self, secs: f64) {
        self.shared.state.lock().unwrap().current_time = secs;
    }

    /// Report the element's duration once metadata is loaded.
    pub fn report_duration(&self, secs: f64) {
        self.shared.state.lock().unwrap().duration = secs.max(0.0);
    }

    /// Report a play/pause transition observed on the element.
    pub fn report_playing(&self, playing: bool) {
        self.shared.state.lock().unwrap().playing = playing;
    }

    /// Take all queued transport commands, oldest first.
    pub fn drain_commands(&self) -> Vec<MediaCommand> {
        self.shared.commands.lock().unwrap().drain(..).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn timer_clock_starts_stopped_at_zero() {
        let clock = TimerClock::new(60.0);
        assert_eq!(clock.current_time(), 0.0);
        assert_eq!(clock.duration(), 60.0);
        assert!(!clock.is_playing());
        assert!(!clock.supports_scrub());
    }

    #[test]
    fn timer_clock_advances_while_playing() {
        let mut clock = TimerClock::new(60.0);
        clock.play();
        sleep(Duration::from_millis(30));
        assert!(clock.current_time() > 0.0);
    }

    #[test]
    fn timer_clock_freezes_on_pause() {
        let mut clock = TimerClock::new(60.0);
        clock.play();
        sleep(Duration::from_millis(20));
        clock.pause();
        let frozen = clock.current_time();
        sleep(Duration::from_millis(20));
        assert_eq!(clock.current_time(), frozen);
    }

    #[test]
    fn timer_clock_seek_clamps_to_span() {
        let mut clock = TimerClock::new(10.0);
        clock.seek(25.0);
        assert_eq!(clock.current_time(), 10.0);
        clock.seek(-5.0);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn timer_clock_never_passes_span() {
        let mut clock = TimerClock::new(0.01);
        clock.play();
        sleep(Duration::from_millis(30));
        assert_eq!(clock.current_time(), 0.01);
    }

    #[test]
    fn media_clock_mirrors_host_reports() {
        let (clock, handle) = MediaClock::new(120.0);
        handle.report_position(42.5);
        handle.report_playing(true);
        assert_eq!(clock.current_time(), 42.5);
        assert!(clock.is_playing());
        assert!(clock.supports_scrub());
    }

    #[test]
    fn media_clock_queues_commands_in_order() {
        let (mut clock, handle) = MediaClock::new(100.0);
        clock.play();
        clock.seek(12.0);
        clock.pause();
        assert_eq!(
            handle.drain_commands(),
            vec![
                MediaCommand::Play,
                MediaCommand::Seek(12.0),
                MediaCommand::Pause
            ]
        );
        assert!(handle.drain_commands().is_empty());
    }

    #[test]
    fn media_clock_seek_is_visible_immediately() {
        // The engine's next tick must see the post-seek cursor even
        // before the host confirms it.
        let (mut clock, handle) = MediaClock::new(100.0);
        handle.report_position(50.0);
        clock.seek(10.0);
        assert_eq!(clock.current_time(), 10.0);
    }

    #[test]
    fn media_clock_seek_clamps_to_duration() {
        let (mut clock, handle) = MediaClock::new(30.0);
        clock.seek(99.0);
        assert_eq!(clock.current_time(), 30.0);
        assert_eq!(handle.drain_commands(), vec![MediaCommand::Seek(30.0)]);
    }
}
