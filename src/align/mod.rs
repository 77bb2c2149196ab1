//! External alignment service boundary.
//!
//! This module provides:
//! * [`Aligner`] — async trait implemented by alignment backends.
//! * [`ApiAligner`] — REST adapter for a generative alignment endpoint.
//! * [`AlignedUnit`] / [`AudioPayload`] — boundary types.
//! * [`AlignError`] — soft failure values; the importer reacts to any of
//!   them by switching to heuristic segmentation.
//!
//! The adapter applies a fixed start-time padding correction
//! ([`START_PADDING_SECS`]) because the service detects speech onset
//! systematically late.

pub mod aligner;
pub mod prompt;

pub use aligner::{
    AlignError, AlignedUnit, Aligner, ApiAligner, AudioPayload, START_PADDING_SECS,
};
pub use prompt::build_instructions;
