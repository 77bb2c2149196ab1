//! Material import flow — validation, alignment, fallback segmentation.
//!
//! [`MaterialImporter`] turns raw title + transcript (+ optional audio)
//! into a [`Material`].  The alignment call is the one long-latency
//! step; its progress is visible through a shared [`ImportStatus`] and
//! every one of its failures is absorbed by falling back to the local
//! heuristic (splitter + proportional timing).
//!
//! ```text
//! ImportRequest
//!   ├─ validate (empty title/transcript, offset < 0 or ≥ duration)  → ImportError
//!   ├─ audio? ──▶ aligner.align()  [Aligning]
//!   │              ├─ ok + invariants hold → timed segments
//!   │              └─ any failure → fallback
//!   └─ fallback: split_sentences + assign_times  [Segmenting]
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::align::{AlignedUnit, Aligner, AudioPayload};
use crate::segment::{
    assign_times, normalize_whitespace, preserves_text, split_sentences, Segment, TimingError,
};

use super::{format_duration, AudioRef, Difficulty, Material};

// ---------------------------------------------------------------------------
// ImportError
// ---------------------------------------------------------------------------

/// Hard failures of the import flow.  Service failures never show up
/// here — they divert to the fallback path instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Title empty after trimming.
    #[error("material title must not be empty")]
    EmptyTitle,

    /// Transcript empty after whitespace normalization.
    #[error("transcript must not be empty")]
    EmptyTranscript,

    /// Fallback timing rejected the inputs.
    #[error(transparent)]
    Timing(#[from] TimingError),

    /// A newer import started while this one was in flight; its result
    /// was discarded.
    #[error("import superseded by a newer request")]
    Superseded,
}

// ---------------------------------------------------------------------------
// ImportStatus
// ---------------------------------------------------------------------------

/// Phases of a running import, for the host's "working" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Idle,
    /// Waiting on the external aligner.
    Aligning,
    /// Running the local heuristic fallback.
    Segmenting,
    Ready,
    Failed,
}

impl ImportStatus {
    /// `true` while an import is actively working.
    pub fn is_busy(&self) -> bool {
        matches!(self, ImportStatus::Aligning | ImportStatus::Segmenting)
    }

    /// Short label suitable for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            ImportStatus::Idle => "Idle",
            ImportStatus::Aligning => "Aligning",
            ImportStatus::Segmenting => "Segmenting",
            ImportStatus::Ready => "Ready",
            ImportStatus::Failed => "Failed",
        }
    }
}

/// Thread-safe handle to the current [`ImportStatus`].
pub type SharedImportStatus = Arc<Mutex<ImportStatus>>;

// ---------------------------------------------------------------------------
// ImportRequest
// ---------------------------------------------------------------------------

/// Everything the user supplies for one import.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// Full transcript text.
    pub transcript: String,
    /// Audio payload, absent for text-only materials.
    pub audio: Option<AudioPayload>,
    /// Audio duration in seconds (operator-estimated when no audio).
    pub duration_secs: f64,
    /// Start offset for fallback timing.  Must be `< duration_secs`.
    pub offset_secs: f64,
}

// ---------------------------------------------------------------------------
// MaterialImporter
// ---------------------------------------------------------------------------

/// Drives the import flow.  Cheap to share (`&self` methods); a
/// generation counter makes superseded in-flight alignments inert.
pub struct MaterialImporter {
    aligner: Arc<dyn Aligner>,
    status: SharedImportStatus,
    generation: AtomicU64,
}

impl MaterialImporter {
    pub fn new(aligner: Arc<dyn Aligner>) -> Self {
        Self {
            aligner,
            status: Arc::new(Mutex::new(ImportStatus::Idle)),
            generation: AtomicU64::new(0),
        }
    }

    /// Handle the host polls for progress display.
    pub fn status(&self) -> SharedImportStatus {
        Arc::clone(&self.status)
    }

    /// Run one import to completion.
    ///
    /// # Errors
    ///
    /// Validation failures ([`ImportError::EmptyTitle`],
    /// [`ImportError::EmptyTranscript`], [`ImportError::Timing`]) abort
    /// with no partial material.  [`ImportError::Superseded`] means a
    /// newer import started while the aligner was in flight.
    pub async fn import(&self, request: ImportRequest) -> Result<Material, ImportError> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            self.set_status(ImportStatus::Failed);
            return Err(ImportError::EmptyTitle);
        }
        let transcript = normalize_whitespace(&request.transcript);
        if transcript.is_empty() {
            self.set_status(ImportStatus::Failed);
            return Err(ImportError::EmptyTranscript);
        }
        if request.offset_secs < 0.0 {
            self.set_status(ImportStatus::Failed);
            return Err(TimingError::NegativeOffset {
                offset: request.offset_secs,
            }
            .into());
        }
        if request.offset_secs >= request.duration_secs {
            self.set_status(ImportStatus::Failed);
            return Err(TimingError::OffsetExceedsDuration {
                offset: request.offset_secs,
                duration: request.duration_secs,
            }
            .into());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Alignment first, when audio exists; every failure is soft.
        let mut segments: Option<Vec<Segment>> = None;
        if let Some(audio) = &request.audio {
            self.set_status(ImportStatus::Aligning);
            let outcome = self.aligner.align(audio, &transcript).await;
            if self.generation.load(Ordering::SeqCst) != generation {
                log::debug!("import: discarding stale alignment response");
                return Err(ImportError::Superseded);
            }
            match outcome {
                Ok(units) => match aligned_segments(units, &transcript) {
                    Some(aligned) => segments = Some(aligned),
                    None => {
                        log::warn!("import: aligner output broke invariants, falling back");
                    }
                },
                Err(e) => {
                    log::warn!("import: alignment unavailable ({e}), falling back");
                }
            }
        }

        let segments = match segments {
            Some(s) => s,
            None => {
                self.set_status(ImportStatus::Segmenting);
                let units = split_sentences(&transcript);
                if units.is_empty() {
                    // Transcript was non-empty, so this cannot happen;
                    // guard anyway rather than build an empty material.
                    self.set_status(ImportStatus::Failed);
                    return Err(ImportError::EmptyTranscript);
                }
                assign_times(&units, request.duration_secs, request.offset_secs)?
            }
        };

        let audio = request.audio.as_ref().map(|payload| AudioRef {
            id: Material::new_id(),
            mime_type: payload.mime_type.clone(),
        });
        let span = if audio.is_some() {
            request.duration_secs
        } else {
            segments.last().map(|s| s.end).unwrap_or(0.0)
        };

        let material = Material {
            id: Material::new_id(),
            title,
            description: request.description,
            category: request.category,
            difficulty: request.difficulty,
            duration: format_duration(span),
            audio,
            segments,
        };

        self.set_status(ImportStatus::Ready);
        log::debug!(
            "import: material {:?} ready with {} segments",
            material.title,
            material.segments.len()
        );
        Ok(material)
    }

    fn set_status(&self, status: ImportStatus) {
        if let Ok(mut st) = self.status.lock() {
            *st = status;
        }
    }
}

/// Accept aligned units only when they keep the transcript intact and
/// stay ordered.  Starts may overlap the previous end by up to the
/// padding correction; ordering is judged by starts.
fn aligned_segments(units: Vec<AlignedUnit>, transcript: &str) -> Option<Vec<Segment>> {
    if units.is_empty() {
        return None;
    }
    let ordered = units.windows(2).all(|w| w[0].start <= w[1].start);
    if !ordered {
        return None;
    }
    let segments: Vec<Segment> = units
        .into_iter()
        .map(|u| Segment::new(u.text, u.start, u.end))
        .collect();
    if !preserves_text(&segments, transcript) {
        return None;
    }
    Some(segments)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignError;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Always succeeds with the given units.
    struct AlwaysOk(Vec<AlignedUnit>);

    #[async_trait]
    impl Aligner for AlwaysOk {
        async fn align(
            &self,
            _audio: &AudioPayload,
            _transcript: &str,
        ) -> Result<Vec<AlignedUnit>, AlignError> {
            Ok(self.0.clone())
        }
    }

    /// Always fails with a transport error.
    struct AlwaysFails;

    #[async_trait]
    impl Aligner for AlwaysFails {
        async fn align(
            &self,
            _audio: &AudioPayload,
            _transcript: &str,
        ) -> Result<Vec<AlignedUnit>, AlignError> {
            Err(AlignError::Request("connection refused".into()))
        }
    }

    /// Blocks the first call until released; later calls return at once.
    struct PendingAligner {
        release: Arc<Notify>,
        calls: std::sync::atomic::AtomicU64,
        units: Vec<AlignedUnit>,
    }

    #[async_trait]
    impl Aligner for PendingAligner {
        async fn align(
            &self,
            _audio: &AudioPayload,
            _transcript: &str,
        ) -> Result<Vec<AlignedUnit>, AlignError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.release.notified().await;
            }
            Ok(self.units.clone())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    const TRANSCRIPT: &str = "Okay. I think we should go. Right.";

    fn unit(text: &str, start: f64, end: f64) -> AlignedUnit {
        AlignedUnit {
            text: text.into(),
            start,
            end,
        }
    }

    fn payload() -> AudioPayload {
        AudioPayload {
            bytes: vec![0u8; 16],
            mime_type: "audio/mpeg".into(),
        }
    }

    fn request(audio: Option<AudioPayload>) -> ImportRequest {
        ImportRequest {
            title: "Going out".into(),
            description: String::new(),
            category: "dialogue".into(),
            difficulty: Difficulty::Easy,
            transcript: TRANSCRIPT.into(),
            audio,
            duration_secs: 10.0,
            offset_secs: 0.0,
        }
    }

    fn importer(aligner: impl Aligner + 'static) -> MaterialImporter {
        MaterialImporter::new(Arc::new(aligner))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let imp = importer(AlwaysFails);
        let mut req = request(None);
        req.title = "   ".into();
        assert!(matches!(
            imp.import(req).await,
            Err(ImportError::EmptyTitle)
        ));
        assert_eq!(*imp.status().lock().unwrap(), ImportStatus::Failed);
    }

    #[tokio::test]
    async fn empty_transcript_is_rejected() {
        let imp = importer(AlwaysFails);
        let mut req = request(None);
        req.transcript = " \n ".into();
        assert!(matches!(
            imp.import(req).await,
            Err(ImportError::EmptyTranscript)
        ));
    }

    #[tokio::test]
    async fn offset_past_duration_is_rejected_before_alignment() {
        let imp = importer(AlwaysOk(vec![unit(TRANSCRIPT, 0.0, 10.0)]));
        let mut req = request(Some(payload()));
        req.offset_secs = 10.0;
        assert!(matches!(
            imp.import(req).await,
            Err(ImportError::Timing(_))
        ));
    }

    #[tokio::test]
    async fn negative_offset_is_rejected_before_alignment() {
        let imp = importer(AlwaysFails);
        let mut req = request(None);
        req.offset_secs = -3.0;
        assert!(matches!(
            imp.import(req).await,
            Err(ImportError::Timing(TimingError::NegativeOffset { .. }))
        ));
        assert_eq!(*imp.status().lock().unwrap(), ImportStatus::Failed);
    }

    // -----------------------------------------------------------------------
    // Aligned path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn aligned_units_become_segments() {
        let imp = importer(AlwaysOk(vec![
            unit("Okay. I think we should go.", 0.0, 4.0),
            unit("Right.", 4.2, 5.0),
        ]));
        let material = imp.import(request(Some(payload()))).await.unwrap();
        assert_eq!(material.segments.len(), 2);
        assert_eq!(material.segments[0].text, "Okay. I think we should go.");
        assert_eq!(material.segments[1].start, 4.2);
        assert!(material.audio.is_some());
        assert_eq!(*imp.status().lock().unwrap(), ImportStatus::Ready);
    }

    #[tokio::test]
    async fn alignment_failure_falls_back_to_heuristic() {
        let imp = importer(AlwaysFails);
        let material = imp.import(request(Some(payload()))).await.unwrap();
        // Fallback merges the whole transcript into one short-unit-free
        // sequence and times it proportionally over 10s.
        assert!(!material.segments.is_empty());
        assert_eq!(material.segments[0].start, 0.0);
        assert_eq!(material.segments.last().unwrap().end, 10.0);
        assert!(crate::segment::preserves_text(
            &material.segments,
            TRANSCRIPT
        ));
    }

    #[tokio::test]
    async fn text_mangling_aligner_is_distrusted() {
        // The aligner dropped a word: invariants fail, fallback wins.
        let imp = importer(AlwaysOk(vec![unit("Okay. I think we should go.", 0.0, 5.0)]));
        let material = imp.import(request(Some(payload()))).await.unwrap();
        assert!(crate::segment::preserves_text(
            &material.segments,
            TRANSCRIPT
        ));
        assert_eq!(material.segments.last().unwrap().end, 10.0);
    }

    #[tokio::test]
    async fn out_of_order_units_are_distrusted() {
        let imp = importer(AlwaysOk(vec![
            unit("Okay. I think we should go.", 5.0, 9.0),
            unit("Right.", 0.0, 1.0),
        ]));
        let material = imp.import(request(Some(payload()))).await.unwrap();
        assert!(crate::segment::preserves_text(
            &material.segments,
            TRANSCRIPT
        ));
    }

    // -----------------------------------------------------------------------
    // Text-only path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn text_only_material_skips_alignment() {
        let imp = importer(AlwaysFails); // would error if called
        let material = imp.import(request(None)).await.unwrap();
        assert!(material.audio.is_none());
        assert!(!material.segments.is_empty());
        // Display duration comes from the segment layout.
        assert_eq!(material.duration, "00:10");
    }

    // -----------------------------------------------------------------------
    // Supersession
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn stale_inflight_alignment_is_discarded() {
        let release = Arc::new(Notify::new());
        let imp = Arc::new(importer(PendingAligner {
            release: Arc::clone(&release),
            calls: std::sync::atomic::AtomicU64::new(0),
            units: vec![unit(TRANSCRIPT, 0.0, 10.0)],
        }));

        let first = {
            let imp = Arc::clone(&imp);
            tokio::spawn(async move { imp.import(request(Some(payload()))).await })
        };
        tokio::task::yield_now().await;

        // A second import runs to completion while the first is still
        // waiting on its alignment response.
        let second = imp.import(request(Some(payload()))).await;
        assert!(second.is_ok());

        // The first import's response finally arrives — and is stale.
        release.notify_waiters();
        let first = first.await.unwrap();
        assert!(matches!(first, Err(ImportError::Superseded)));
    }
}
