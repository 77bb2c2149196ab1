//! Session — the top-level controller tying one loaded material to the
//! playback engine, the segment recorder, and the per-segment clips.
//!
//! A session owns at most one material at a time.  Loading a new one
//! tears down the previous tick driver, resets the cursor, clears the
//! clip map, and picks the transport clock: materials with audio get a
//! [`MediaClock`] (the returned handle is wired to the host's media
//! element), text-only materials run on the simulated [`TimerClock`].
//!
//! While a capture is open all navigation is refused with
//! [`RecorderError::CaptureInProgress`] so the clip stays keyed to the
//! segment it was started on.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;

use crate::config::PlaybackConfig;
use crate::export::{merge_recordings, ExportError, ExportedAudio};
use crate::material::Material;
use crate::player::{
    CursorState, LoopSetting, MediaClock, MediaClockHandle, PlaybackMode, PlayerDriver,
    PlayerEngine, SkipDirection, TimerClock, MEDIA_TICK, TIMER_TICK,
};
use crate::record::{
    AudioChunk, CaptureError, CaptureState, MicCapture, RecorderError, RecordingMap,
    SegmentRecorder, StreamHandle,
};
use crate::segment::Segment;

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    /// No material is loaded.
    #[error("no material loaded")]
    NoMaterial,

    /// Recording was requested with no segment under the cursor.
    #[error("no active segment to record against")]
    NoActiveSegment,

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An open microphone stream plus the channel its chunks arrive on.
struct ActiveCapture {
    _stream: StreamHandle,
    rx: Receiver<AudioChunk>,
}

/// Controller for one practice session.
pub struct Session {
    material: Option<Material>,
    engine: Option<Arc<Mutex<PlayerEngine>>>,
    driver: Option<PlayerDriver>,
    recorder: SegmentRecorder,
    recordings: RecordingMap,
    capture: Option<ActiveCapture>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            material: None,
            engine: None,
            driver: None,
            recorder: SegmentRecorder::new(),
            recordings: RecordingMap::new(),
            capture: None,
        }
    }

    // -----------------------------------------------------------------------
    // Material lifecycle
    // -----------------------------------------------------------------------

    /// Load `material` and start its tick driver.
    ///
    /// Returns the media clock handle when the material has audio (the
    /// host mirrors its media element through it), `None` for
    /// text-only materials on the simulated clock.  Must be called
    /// from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`RecorderError::CaptureInProgress`] while a capture is open.
    pub fn load_material(
        &mut self,
        material: Material,
        playback: &PlaybackConfig,
    ) -> Result<Option<MediaClockHandle>, SessionError> {
        self.ensure_not_recording()?;

        // Drop aborts the previous tick loop before the engine goes.
        self.driver = None;
        self.engine = None;
        self.capture = None;
        self.recordings.clear();

        let span = material.total_span();
        let (clock, handle, period): (Box<dyn crate::player::TransportClock>, _, Duration) =
            if material.audio.is_some() {
                let (clock, handle) = MediaClock::new(span);
                (Box::new(clock), Some(handle), MEDIA_TICK)
            } else {
                (Box::new(TimerClock::new(span)), None, TIMER_TICK)
            };

        let engine = Arc::new(Mutex::new(PlayerEngine::new(
            material.segments.clone(),
            clock,
            playback.mode,
            playback.loop_setting,
        )));
        self.driver = Some(PlayerDriver::spawn(Arc::clone(&engine), period));
        self.engine = Some(engine);

        log::debug!(
            "session: loaded {:?} with {} segments over {span:.1}s",
            material.title,
            material.segments.len()
        );
        self.material = Some(material);
        Ok(handle)
    }

    /// Drop the current material, driver, and clips.
    pub fn unload(&mut self) {
        self.driver = None;
        self.engine = None;
        self.capture = None;
        self.recorder.cancel();
        self.recordings.clear();
        self.material = None;
    }

    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    // -----------------------------------------------------------------------
    // Transport and navigation
    // -----------------------------------------------------------------------

    pub fn play(&mut self) -> Result<(), SessionError> {
        self.ensure_not_recording()?;
        lock(self.engine()?).play();
        Ok(())
    }

    /// Pausing is always allowed, even mid-capture.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        lock(self.engine()?).pause();
        Ok(())
    }

    pub fn skip(&mut self, direction: SkipDirection) -> Result<(), SessionError> {
        self.ensure_not_recording()?;
        lock(self.engine()?).skip(direction);
        Ok(())
    }

    pub fn replay_current(&mut self) -> Result<(), SessionError> {
        self.ensure_not_recording()?;
        lock(self.engine()?).replay_current();
        Ok(())
    }

    /// Relative seek; `Ok(false)` when the clock cannot scrub.
    pub fn seek_relative(&mut self, delta: f64) -> Result<bool, SessionError> {
        self.ensure_not_recording()?;
        Ok(lock(self.engine()?).seek_relative(delta))
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) -> Result<(), SessionError> {
        lock(self.engine()?).set_mode(mode);
        Ok(())
    }

    pub fn set_loop_setting(&mut self, setting: LoopSetting) -> Result<(), SessionError> {
        lock(self.engine()?).set_loop_setting(setting);
        Ok(())
    }

    pub fn cursor(&self) -> Option<CursorState> {
        self.engine.as_ref().map(|e| lock(e).cursor())
    }

    pub fn active_segment(&self) -> Option<Segment> {
        let engine = self.engine.as_ref()?;
        let engine = lock(engine);
        engine.active_segment().cloned()
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Key a new capture to the active segment and pause playback.
    ///
    /// The microphone is attached separately (see [`start_recording`])
    /// so hosts and tests can push [`AudioChunk`]s directly through
    /// [`feed_chunk`].
    ///
    /// [`start_recording`]: Session::start_recording
    /// [`feed_chunk`]: Session::feed_chunk
    pub fn begin_recording(&mut self) -> Result<(), SessionError> {
        let segment = self.active_segment().ok_or(SessionError::NoActiveSegment)?;
        self.pause()?;
        self.recorder.start(segment.id)?;
        Ok(())
    }

    /// [`begin_recording`] plus an open microphone stream.
    ///
    /// [`begin_recording`]: Session::begin_recording
    pub fn start_recording(&mut self, mic: &MicCapture) -> Result<(), SessionError> {
        self.begin_recording()?;
        let (tx, rx) = std::sync::mpsc::channel();
        match mic.start(tx) {
            Ok(stream) => {
                self.capture = Some(ActiveCapture {
                    _stream: stream,
                    rx,
                });
                Ok(())
            }
            Err(e) => {
                self.recorder.cancel();
                Err(e.into())
            }
        }
    }

    /// Hand one chunk of interleaved samples to the recorder.
    pub fn feed_chunk(&mut self, chunk: &AudioChunk) {
        self.recorder.feed(chunk);
    }

    /// Pull every chunk the microphone has produced so far.
    pub fn drain_captured(&mut self) {
        let Some(capture) = &self.capture else {
            return;
        };
        let mut chunks = Vec::new();
        while let Ok(chunk) = capture.rx.try_recv() {
            chunks.push(chunk);
        }
        for chunk in &chunks {
            self.recorder.feed(chunk);
        }
    }

    pub fn pause_recording(&mut self) -> Result<(), SessionError> {
        self.drain_captured();
        self.recorder.pause()?;
        Ok(())
    }

    pub fn resume_recording(&mut self) -> Result<(), SessionError> {
        self.recorder.resume()?;
        Ok(())
    }

    /// Finish the capture and store the clip under its segment id.
    ///
    /// The clip replaces any earlier take for the same segment.
    pub fn stop_recording(&mut self) -> Result<String, SessionError> {
        self.drain_captured();
        let result = self.recorder.stop();
        self.capture = None;
        let (segment_id, wav) = result?;
        self.recordings.insert(segment_id.clone(), wav);
        Ok(segment_id)
    }

    /// Abandon the capture; nothing is stored.
    pub fn cancel_recording(&mut self) {
        self.recorder.cancel();
        self.capture = None;
    }

    pub fn delete_recording(&mut self, segment_id: &str) {
        self.recordings.remove(segment_id);
    }

    pub fn recording_state(&self) -> CaptureState {
        self.recorder.state()
    }

    pub fn recordings(&self) -> &RecordingMap {
        &self.recordings
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Merge all stored clips into one WAV in segment order.
    pub fn export(&self) -> Result<ExportedAudio, SessionError> {
        let material = self.material.as_ref().ok_or(SessionError::NoMaterial)?;
        Ok(merge_recordings(material, &self.recordings)?)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn engine(&self) -> Result<&Arc<Mutex<PlayerEngine>>, SessionError> {
        self.engine.as_ref().ok_or(SessionError::NoMaterial)
    }

    fn ensure_not_recording(&self) -> Result<(), SessionError> {
        if self.recorder.is_active() {
            return Err(RecorderError::CaptureInProgress.into());
        }
        Ok(())
    }
}

/// Lock the engine, recovering from a poisoned mutex — a panicked tick
/// must not wedge the whole session.
fn lock(engine: &Arc<Mutex<PlayerEngine>>) -> MutexGuard<'_, PlayerEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
