//! Per-segment voice capture.
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → SegmentRecorder
//!            → stop → mono 16-bit WAV clip → RecordingMap[segment id]
//! ```
//!
//! [`MicCapture`] owns the hardware; [`SegmentRecorder`] owns the
//! capture state machine and finalization; [`RecordingMap`] holds the
//! finished clips for [`crate::export`].

pub mod capture;
pub mod recorder;

pub use capture::{AudioChunk, CaptureError, MicCapture, StreamHandle};
pub use recorder::{
    downmix_to_mono, encode_wav_mono16, CaptureState, RecorderError, RecordingMap,
    SegmentRecorder,
};
