//! Materials — complete listening-practice sessions.
//!
//! A [`Material`] bundles a title, optional audio reference, and the
//! ordered segment sequence produced at import time.  Materials without
//! audio are driven by a simulated clock spanning
//! [`Material::total_span`].

pub mod importer;
pub mod store;

pub use importer::{ImportError, ImportRequest, ImportStatus, MaterialImporter, SharedImportStatus};
pub use store::{AudioStore, FsAudioStore, MaterialStore, StoreError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::segment::Segment;

/// Simulated-clock span when a material has no segments, in seconds.
pub const DEFAULT_SPAN_SECS: f64 = 60.0;

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Subjective difficulty label shown in the library view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

// ---------------------------------------------------------------------------
// AudioRef / Material
// ---------------------------------------------------------------------------

/// Reference to an owned audio blob in the [`AudioStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRef {
    /// Blob id under which the bytes are stored.
    pub id: String,
    /// Mime type recorded at import time (e.g. `audio/mpeg`).
    pub mime_type: String,
}

/// A complete listening-practice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// Display duration, formatted `mm:ss`.
    pub duration: String,
    /// Owned audio resource, absent for text-only materials.
    pub audio: Option<AudioRef>,
    /// Ordered, time-monotonic segment sequence.
    pub segments: Vec<Segment>,
}

impl Material {
    /// Fresh id for a new material.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Total time span the player covers: the last segment's end, or
    /// [`DEFAULT_SPAN_SECS`] when there are no segments.
    pub fn total_span(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.end)
            .unwrap_or(DEFAULT_SPAN_SECS)
    }
}

/// Format whole seconds as `mm:ss` (e.g. `134.7` → `"02:14"`).
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
