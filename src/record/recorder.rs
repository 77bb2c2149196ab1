//! Per-segment voice recorder.
//!
//! [`SegmentRecorder`] accumulates [`AudioChunk`]s for the segment that
//! was active when capture started — navigating afterwards does not
//! change the key (the session layer additionally blocks navigation
//! while a capture is open).  State machine, user-driven only:
//!
//! ```text
//! Inactive ──start──▶ Recording ──pause──▶ Paused
//!                        ▲                   │
//!                        └──────resume───────┘
//! Recording / Paused ──stop──▶ Inactive  (clip finalized)
//! ```
//!
//! On stop the accumulated samples are downmixed to mono and encoded as
//! a 16-bit WAV clip; only a successful stop overwrites a previous
//! recording for that segment id.

use std::collections::HashMap;
use std::io::Cursor;

use thiserror::Error;

use super::capture::AudioChunk;

// ---------------------------------------------------------------------------
// RecorderError
// ---------------------------------------------------------------------------

/// Errors from the capture state machine.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// `start` while a capture is already open.
    #[error("a capture is already in progress")]
    AlreadyRecording,

    /// `pause`/`resume`/`stop` with no open capture.
    #[error("no capture in progress")]
    NotRecording,

    /// `stop` before any audio arrived.
    #[error("no audio captured")]
    NothingCaptured,

    /// Navigation attempted while a capture is open (session policy).
    #[error("navigation is locked while recording")]
    CaptureInProgress,

    /// WAV encoding failed.
    #[error("failed to encode clip: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// CaptureState
// ---------------------------------------------------------------------------

/// Phase of the recorder's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Inactive,
    Recording,
    Paused,
}

// ---------------------------------------------------------------------------
// RecordingMap
// ---------------------------------------------------------------------------

/// Per-segment recorded clips, keyed by segment id, holding encoded WAV
/// bytes.  Written by the recorder's stop handler and by explicit
/// delete; read by export.
#[derive(Debug, Default)]
pub struct RecordingMap {
    clips: HashMap<String, Vec<u8>>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a finalized clip, replacing any previous one for the id.
    pub fn insert(&mut self, segment_id: String, wav: Vec<u8>) {
        self.clips.insert(segment_id, wav);
    }

    pub fn get(&self, segment_id: &str) -> Option<&[u8]> {
        self.clips.get(segment_id).map(Vec::as_slice)
    }

    /// Explicit delete.  Missing ids are ignored.
    pub fn remove(&mut self, segment_id: &str) {
        self.clips.remove(segment_id);
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Drop every clip (session reset).
    pub fn clear(&mut self) {
        self.clips.clear();
    }
}

// ---------------------------------------------------------------------------
// SegmentRecorder
// ---------------------------------------------------------------------------

/// Accumulates microphone audio for one segment at a time.
#[derive(Debug, Default)]
pub struct SegmentRecorder {
    state: CaptureState,
    /// Segment that was active when `start` was called.
    segment_id: Option<String>,
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl SegmentRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Id the open capture is bound to, if any.
    pub fn segment_id(&self) -> Option<&str> {
        self.segment_id.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.state != CaptureState::Inactive
    }

    /// Open a capture bound to `segment_id`.
    pub fn start(&mut self, segment_id: String) -> Result<(), RecorderError> {
        if self.is_active() {
            return Err(RecorderError::AlreadyRecording);
        }
        log::debug!("recorder: capture started for segment {segment_id}");
        self.state = CaptureState::Recording;
        self.segment_id = Some(segment_id);
        self.samples.clear();
        self.sample_rate = 0;
        self.channels = 0;
        Ok(())
    }

    /// Append a chunk.  Chunks arriving while paused (the stream keeps
    /// running) are dropped.
    pub fn feed(&mut self, chunk: &AudioChunk) {
        if self.state != CaptureState::Recording {
            return;
        }
        if self.sample_rate == 0 {
            self.sample_rate = chunk.sample_rate;
            self.channels = chunk.channels.max(1);
        }
        self.samples.extend_from_slice(&chunk.samples);
    }

    pub fn pause(&mut self) -> Result<(), RecorderError> {
        match self.state {
            CaptureState::Recording => {
                self.state = CaptureState::Paused;
                Ok(())
            }
            CaptureState::Paused => Ok(()),
            CaptureState::Inactive => Err(RecorderError::NotRecording),
        }
    }

    pub fn resume(&mut self) -> Result<(), RecorderError> {
        match self.state {
            CaptureState::Paused => {
                self.state = CaptureState::Recording;
                Ok(())
            }
            CaptureState::Recording => Ok(()),
            CaptureState::Inactive => Err(RecorderError::NotRecording),
        }
    }

    /// Finalize the capture into a WAV clip keyed by the segment the
    /// capture was started on.
    ///
    /// The recorder returns to `Inactive` whether or not finalization
    /// succeeds, so a failed stop never wedges the state machine.
    pub fn stop(&mut self) -> Result<(String, Vec<u8>), RecorderError> {
        if !self.is_active() {
            return Err(RecorderError::NotRecording);
        }
        self.state = CaptureState::Inactive;
        let segment_id = self.segment_id.take().ok_or(RecorderError::NotRecording)?;
        let samples = std::mem::take(&mut self.samples);
        if samples.is_empty() {
            return Err(RecorderError::NothingCaptured);
        }

        let mono = downmix_to_mono(&samples, self.channels.max(1));
        let wav = encode_wav_mono16(&mono, self.sample_rate.max(1))?;
        log::debug!(
            "recorder: finalized {:.2}s clip for segment {segment_id}",
            mono.len() as f64 / self.sample_rate.max(1) as f64
        );
        Ok((segment_id, wav))
    }

    /// Abandon the open capture without producing a clip.
    pub fn cancel(&mut self) {
        self.state = CaptureState::Inactive;
        self.segment_id = None;
        self.samples.clear();
    }
}

// ---------------------------------------------------------------------------
// Sample helpers
// ---------------------------------------------------------------------------

/// Average interleaved frames down to a single channel.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Encode mono `f32` samples as a 16-bit signed little-endian WAV file.
pub fn encode_wav_mono16(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, RecorderError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| RecorderError::Encode(e.to_string()))?;
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| RecorderError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| RecorderError::Encode(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
