//! Core [`Aligner`] trait and [`ApiAligner`] implementation.
//!
//! `ApiAligner` posts the audio payload plus an instruction text to an
//! external generative alignment endpoint and normalizes the reply into
//! [`AlignedUnit`]s.  Every failure mode is a value, never a panic — the
//! importer treats any [`AlignError`] as "no alignment available" and
//! falls back to the local heuristic.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::align::prompt::build_instructions;
use crate::config::ServiceConfig;

/// Seconds subtracted from every reported start time.  The service
/// systematically detects speech onset late; ends are reported fine.
pub const START_PADDING_SECS: f64 = 0.6;

// ---------------------------------------------------------------------------
// AudioPayload / AlignedUnit
// ---------------------------------------------------------------------------

/// Raw audio bytes plus their mime type, as handed to the service.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// One timed transcript unit as returned by the aligner, with the
/// start-padding correction already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedUnit {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

// ---------------------------------------------------------------------------
// AlignError
// ---------------------------------------------------------------------------

/// Errors from the alignment service.  All of them are soft: the caller
/// falls back to heuristic segmentation instead of surfacing them.
#[derive(Debug, Error)]
pub enum AlignError {
    /// No API credential configured; the service cannot be called.
    #[error("no alignment service credential configured")]
    MissingCredential,

    /// HTTP transport or connection error.
    #[error("alignment request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("alignment request timed out")]
    Timeout,

    /// The response could not be parsed as the expected JSON shape.
    #[error("failed to parse alignment response: {0}")]
    Parse(String),

    /// The service replied with zero usable units.
    #[error("alignment service returned no segments")]
    EmptyResult,
}

impl From<reqwest::Error> for AlignError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AlignError::Timeout
        } else {
            AlignError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Aligner trait
// ---------------------------------------------------------------------------

/// Async trait for audio/transcript alignment backends.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Aligner>` between the importer and its spawned tasks.
#[async_trait]
pub trait Aligner: Send + Sync {
    async fn align(
        &self,
        audio: &AudioPayload,
        transcript: &str,
    ) -> Result<Vec<AlignedUnit>, AlignError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WireResponse {
    segments: Vec<WireSegment>,
}

#[derive(Debug, Deserialize)]
struct WireSegment {
    text: String,
    #[serde(rename = "startTime")]
    start_time: f64,
    #[serde(rename = "endTime")]
    end_time: f64,
}

/// Apply the start-padding correction and basic shape validation.
fn normalize_units(wire: Vec<WireSegment>) -> Result<Vec<AlignedUnit>, AlignError> {
    if wire.is_empty() {
        return Err(AlignError::EmptyResult);
    }
    let mut units = Vec::with_capacity(wire.len());
    for seg in wire {
        if seg.text.trim().is_empty() {
            return Err(AlignError::Parse("segment with empty text".into()));
        }
        if !seg.end_time.is_finite() || !seg.start_time.is_finite() {
            return Err(AlignError::Parse("non-finite timestamp".into()));
        }
        let start = (seg.start_time - START_PADDING_SECS).max(0.0);
        if seg.end_time <= start {
            return Err(AlignError::Parse(format!(
                "segment ends at {} before it starts at {}",
                seg.end_time, start
            )));
        }
        units.push(AlignedUnit {
            text: seg.text,
            start,
            end: seg.end_time,
        });
    }
    Ok(units)
}

// ---------------------------------------------------------------------------
// ApiAligner
// ---------------------------------------------------------------------------

/// Calls a JSON alignment endpoint at `{base_url}/v1/align`.
///
/// All connection details (`base_url`, `api_key`, `model`) come from the
/// [`ServiceConfig`] passed to [`ApiAligner::from_config`].
pub struct ApiAligner {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl ApiAligner {
    /// Build an `ApiAligner` from the service config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is the last-resort
    /// fallback if the builder fails.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Aligner for ApiAligner {
    async fn align(
        &self,
        audio: &AudioPayload,
        transcript: &str,
    ) -> Result<Vec<AlignedUnit>, AlignError> {
        let key = self.config.api_key.as_deref().unwrap_or("");
        if key.is_empty() {
            return Err(AlignError::MissingCredential);
        }

        let url = format!("{}/v1/align", self.config.base_url);
        let body = serde_json::json!({
            "model": self.config.model,
            "audio": {
                "data": BASE64_STANDARD.encode(&audio.bytes),
                "mime_type": audio.mime_type,
            },
            "instructions": build_instructions(transcript),
        });

        let response = self.client.post(&url).bearer_auth(key).json(&body).send().await?;

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| AlignError::Parse(e.to_string()))?;

        let units = normalize_units(wire.segments)?;
        log::debug!("aligner returned {} units", units.len());
        Ok(units)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(text: &str, start: f64, end: f64) -> WireSegment {
        WireSegment {
            text: text.into(),
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn start_padding_is_subtracted() {
        let units = normalize_units(vec![wire("hello there", 2.0, 4.0)]).unwrap();
        assert_eq!(units[0].start, 1.4);
        assert_eq!(units[0].end, 4.0);
    }

    #[test]
    fn start_padding_clamps_at_zero() {
        // Reported start 0.3 → adjusted start must be 0, not -0.3.
        let units = normalize_units(vec![wire("hi", 0.3, 1.5)]).unwrap();
        assert_eq!(units[0].start, 0.0);
        assert_eq!(units[0].end, 1.5);
    }

    #[test]
    fn empty_response_is_an_error() {
        assert!(matches!(
            normalize_units(Vec::new()),
            Err(AlignError::EmptyResult)
        ));
    }

    #[test]
    fn blank_text_is_malformed() {
        let err = normalize_units(vec![wire("   ", 0.0, 1.0)]).unwrap_err();
        assert!(matches!(err, AlignError::Parse(_)));
    }

    #[test]
    fn end_before_corrected_start_is_malformed() {
        // end 0.1 < corrected start 0.4 after padding.
        let err = normalize_units(vec![wire("x", 1.0, 0.1)]).unwrap_err();
        assert!(matches!(err, AlignError::Parse(_)));
    }

    #[test]
    fn wire_json_uses_camel_case_times() {
        let json = r#"{"segments":[{"text":"a","startTime":1.0,"endTime":2.0}]}"#;
        let resp: WireResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.segments.len(), 1);
        assert_eq!(resp.segments[0].start_time, 1.0);
    }

    #[test]
    fn missing_credential_without_network() {
        let config = ServiceConfig {
            api_key: None,
            ..ServiceConfig::default()
        };
        let aligner = ApiAligner::from_config(&config);
        let payload = AudioPayload {
            bytes: vec![0u8; 4],
            mime_type: "audio/wav".into(),
        };
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let err = rt.block_on(aligner.align(&payload, "text")).unwrap_err();
        assert!(matches!(err, AlignError::MissingCredential));
    }

    /// `ApiAligner` must be usable as `dyn Aligner`.
    #[test]
    fn aligner_is_object_safe() {
        let aligner: Box<dyn Aligner> = Box::new(ApiAligner::from_config(&ServiceConfig::default()));
        drop(aligner);
    }
}
