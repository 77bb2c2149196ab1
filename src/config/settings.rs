//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and
//! `Clone` so they can be round-tripped through TOML files and shared
//! across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::player::{LoopSetting, PlaybackMode};

use super::AppPaths;

/// Environment variable checked for the external-service credential when
/// the settings file carries none.
pub const API_KEY_ENV: &str = "SHADOWING_API_KEY";

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Settings shared by the alignment and definition-lookup adapters.
///
/// One credential covers both services; when `api_key` is absent the
/// adapters fail softly and the import falls back to heuristic
/// segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service endpoint.
    pub base_url: String,
    /// API key — `None` disables both adapters (soft failure).
    pub api_key: Option<String>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum seconds to wait for a response before timing out.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.example-align.dev".into(),
            api_key: None,
            model: "align-v1".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Player defaults applied when a session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Sentence-by-sentence or continuous playthrough.
    pub mode: PlaybackMode,
    /// Repetitions per segment in sentence mode.
    pub loop_setting: LoopSetting,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Sentence,
            loop_setting: LoopSetting::Count(1),
        }
    }
}

// ---------------------------------------------------------------------------
// ImportConfig
// ---------------------------------------------------------------------------

/// Defaults for the material import flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Operator-supplied start offset for fallback timing, in seconds.
    pub fallback_offset_secs: f64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            fallback_offset_secs: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Alignment / definition service settings.
    pub service: ServiceConfig,
    /// Player defaults.
    pub playback: PlaybackConfig,
    /// Import defaults.
    pub import: ImportConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist
    /// yet (first-run scenario) so callers never need to special-case a
    /// missing file.  A credential found in [`API_KEY_ENV`] fills in a
    /// missing `service.api_key`.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&AppPaths::new().settings_file)?;
        if config.service.api_key.is_none() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                if !key.is_empty() {
                    config.service.api_key = Some(key);
                }
            }
        }
        Ok(config)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
