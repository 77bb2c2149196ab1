//! Playback/sync engine: transport clocks, cursor state machine, tick
//! driver.
//!
//! ```text
//! host media element ⇄ MediaClockHandle ⇄ MediaClock ┐
//!                                                     ├─ PlayerEngine.tick()
//! wall clock (no audio) ──────────────── TimerClock ──┘        ▲
//!                                                     PlayerDriver (interval)
//! ```
//!
//! The engine depends only on [`TransportClock`]; which concrete clock a
//! session gets is decided once, when the material loads, by whether it
//! owns an audio resource.

pub mod clock;
pub mod driver;
pub mod engine;

pub use clock::{MediaClock, MediaClockHandle, MediaCommand, TimerClock, TransportClock};
pub use driver::{PlayerDriver, MEDIA_TICK, TIMER_TICK};
pub use engine::{
    CursorState, LoopSetting, PlaybackMode, PlayerEngine, SkipDirection, BOUNDARY_LEAD_SECS,
    PREV_REPLAY_THRESHOLD_SECS,
};
