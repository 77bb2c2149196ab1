//! Shadowing — listening-practice engine.
//!
//! Import an audio recording plus its transcript, align the text to the
//! audio into timed [`Segment`](segment::Segment)s, then drive a
//! playback loop that tracks the active segment, loops it, and captures
//! the user's own voice per segment.
//!
//! # Pipeline
//!
//! ```text
//! transcript + audio ─▶ Aligner ──ok──▶ timed segments ─┐
//!                         │fail                          ▼
//!                         └▶ splitter ─▶ timing ─▶ Material
//!
//! Material ─▶ Session { PlayerEngine + TransportClock + PlayerDriver }
//!          ─▶ SegmentRecorder ─▶ RecordingMap ─▶ export::merge_recordings
//! ```
//!
//! The crate is the engine only — a host UI supplies file pickers,
//! rendering, keyboard handling, and (when real audio exists) a
//! [`MediaClockHandle`](player::MediaClockHandle) mirroring its media
//! element.

pub mod align;
pub mod config;
pub mod export;
pub mod lookup;
pub mod material;
pub mod player;
pub mod record;
pub mod segment;
pub mod session;
