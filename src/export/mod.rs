//! Export — merge per-segment recordings into one downloadable WAV.
//!
//! Clips are taken in the material's segment order (unrecorded segments
//! contribute nothing), decoded to mono PCM, concatenated sample-for-
//! sample with no cross-fades or padding, and re-encoded as a single
//! 16-bit signed little-endian mono WAV.  The sample rate is inherited
//! from the first clip; mismatched later rates are not resampled (known
//! simplification — clips from one session share a device).

use std::io::Cursor;

use thiserror::Error;

use crate::material::Material;
use crate::record::{downmix_to_mono, encode_wav_mono16, RecordingMap};

/// Max characters of the material title used in the filename.
const FILENAME_TITLE_CHARS: usize = 20;

// ---------------------------------------------------------------------------
// ExportError
// ---------------------------------------------------------------------------

/// Errors from the merge step.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No segment has a recording.
    #[error("nothing to export — no segment has a recording")]
    NothingToExport,

    /// A stored clip could not be decoded.
    #[error("failed to decode clip for segment {segment_id}: {reason}")]
    Decode { segment_id: String, reason: String },

    /// The merged stream could not be encoded.
    #[error("failed to encode merged audio: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// ExportedAudio
// ---------------------------------------------------------------------------

/// The merged, downloadable artifact.
#[derive(Debug, Clone)]
pub struct ExportedAudio {
    /// Suggested download filename, derived from the material title.
    pub filename: String,
    /// Complete WAV file bytes.
    pub wav: Vec<u8>,
    /// Sample rate of the output, taken from the first clip.
    pub sample_rate: u32,
}

// ---------------------------------------------------------------------------
// merge_recordings
// ---------------------------------------------------------------------------

/// Concatenate all recorded clips in segment order into one mono WAV.
///
/// # Errors
///
/// [`ExportError::NothingToExport`] when no segment has a clip;
/// [`ExportError::Decode`] when a stored clip is not readable audio.
pub fn merge_recordings(
    material: &Material,
    recordings: &RecordingMap,
) -> Result<ExportedAudio, ExportError> {
    let mut merged: Vec<f32> = Vec::new();
    let mut sample_rate: Option<u32> = None;

    for segment in &material.segments {
        let Some(bytes) = recordings.get(&segment.id) else {
            continue;
        };
        let (samples, rate) = decode_clip(bytes).map_err(|reason| ExportError::Decode {
            segment_id: segment.id.clone(),
            reason,
        })?;
        match sample_rate {
            None => sample_rate = Some(rate),
            Some(first) if first != rate => {
                log::warn!(
                    "export: clip for segment {} is {rate} Hz, output stays {first} Hz",
                    segment.id
                );
            }
            Some(_) => {}
        }
        merged.extend(samples);
    }

    let Some(sample_rate) = sample_rate else {
        return Err(ExportError::NothingToExport);
    };

    let wav =
        encode_wav_mono16(&merged, sample_rate).map_err(|e| ExportError::Encode(e.to_string()))?;
    log::debug!(
        "export: merged {} samples at {sample_rate} Hz",
        merged.len()
    );

    Ok(ExportedAudio {
        filename: export_filename(&material.title),
        wav,
        sample_rate,
    })
}

/// Decode one stored clip into mono `f32` samples plus its rate.
fn decode_clip(bytes: &[u8]) -> Result<(Vec<f32>, u32), String> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?,
    };
    Ok((
        downmix_to_mono(&interleaved, spec.channels),
        spec.sample_rate,
    ))
}

/// `"My very long material title"` → `"My-very-long-materia.wav"`.
fn export_filename(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(FILENAME_TITLE_CHARS)
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "practice.wav".to_string()
    } else {
        format!("{stem}.wav")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{format_duration, Difficulty};
    use crate::segment::Segment;

    fn material_with_segments(segments: Vec<Segment>) -> Material {
        Material {
            id: Material::new_id(),
            title: "Morning practice".into(),
            description: String::new(),
            category: "news".into(),
            difficulty: Difficulty::Medium,
            duration: format_duration(10.0),
            audio: None,
            segments,
        }
    }

    /// A clip whose every sample has the same known amplitude.
    fn clip(level: f32, frames: usize, rate: u32) -> Vec<u8> {
        encode_wav_mono16(&vec![level; frames], rate).unwrap()
    }

    fn decode(wav: &[u8]) -> (Vec<f32>, u32) {
        decode_clip(wav).unwrap()
    }

    #[test]
    fn empty_map_is_nothing_to_export() {
        let material = material_with_segments(vec![Segment::new("a", 0.0, 1.0)]);
        let recordings = RecordingMap::new();
        assert!(matches!(
            merge_recordings(&material, &recordings),
            Err(ExportError::NothingToExport)
        ));
    }

    #[test]
    fn clips_concatenate_in_segment_order() {
        let segments = vec![
            Segment::new("first", 0.0, 1.0),
            Segment::new("second", 1.0, 2.0),
            Segment::new("third", 2.0, 3.0),
        ];
        let material = material_with_segments(segments);

        let mut recordings = RecordingMap::new();
        // Insert out of order; output must follow segment order.
        recordings.insert(material.segments[2].id.clone(), clip(0.75, 30, 16_000));
        recordings.insert(material.segments[0].id.clone(), clip(0.25, 20, 16_000));

        let out = merge_recordings(&material, &recordings).unwrap();
        let (samples, rate) = decode(&out.wav);
        assert_eq!(rate, 16_000);
        assert_eq!(samples.len(), 50);
        assert!((samples[0] - 0.25).abs() < 0.01, "first clip leads");
        assert!((samples[20] - 0.75).abs() < 0.01, "second block follows");
    }

    #[test]
    fn unrecorded_segments_contribute_nothing() {
        let segments = vec![Segment::new("a", 0.0, 1.0), Segment::new("b", 1.0, 2.0)];
        let material = material_with_segments(segments);

        let mut recordings = RecordingMap::new();
        recordings.insert(material.segments[1].id.clone(), clip(0.5, 10, 16_000));

        let out = merge_recordings(&material, &recordings).unwrap();
        let (samples, _) = decode(&out.wav);
        assert_eq!(samples.len(), 10);
    }

    #[test]
    fn sample_rate_comes_from_first_clip() {
        let segments = vec![Segment::new("a", 0.0, 1.0), Segment::new("b", 1.0, 2.0)];
        let material = material_with_segments(segments);

        let mut recordings = RecordingMap::new();
        recordings.insert(material.segments[0].id.clone(), clip(0.1, 8, 44_100));
        recordings.insert(material.segments[1].id.clone(), clip(0.1, 8, 48_000));

        let out = merge_recordings(&material, &recordings).unwrap();
        assert_eq!(out.sample_rate, 44_100);
        let (samples, rate) = decode(&out.wav);
        assert_eq!(rate, 44_100);
        // No resampling: both blocks carried over sample-for-sample.
        assert_eq!(samples.len(), 16);
    }

    #[test]
    fn garbage_clip_is_a_decode_error() {
        let material = material_with_segments(vec![Segment::new("a", 0.0, 1.0)]);
        let mut recordings = RecordingMap::new();
        recordings.insert(material.segments[0].id.clone(), vec![0xde, 0xad, 0xbe]);
        assert!(matches!(
            merge_recordings(&material, &recordings),
            Err(ExportError::Decode { .. })
        ));
    }

    #[test]
    fn filename_derives_from_truncated_title() {
        assert_eq!(export_filename("Morning practice"), "Morning-practice.wav");
        assert_eq!(
            export_filename("A very long material title that keeps going"),
            "A-very-long-material.wav"
        );
        assert_eq!(export_filename("  "), "practice.wav");
        assert_eq!(export_filename("naïve / risky: name?"), "naïve--risky-name.wav");
    }

    #[test]
    fn output_is_sixteen_bit_mono() {
        let material = material_with_segments(vec![Segment::new("a", 0.0, 1.0)]);
        let mut recordings = RecordingMap::new();
        recordings.insert(material.segments[0].id.clone(), clip(0.3, 5, 16_000));

        let out = merge_recordings(&material, &recordings).unwrap();
        let reader = hound::WavReader::new(Cursor::new(out.wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    }
}
