//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\shadowing\
//!   macOS:   ~/Library/Application Support/shadowing/
//!   Linux:   ~/.config/shadowing/
//!
//! Data dir (material records + audio blobs):
//!   Windows: %LOCALAPPDATA%\shadowing\
//!   macOS:   ~/Library/Application Support/shadowing/
//!   Linux:   ~/.local/share/shadowing/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for serialized material records.
    pub materials_dir: PathBuf,
    /// Directory for opaque audio blobs (imports + recordings).
    pub audio_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "shadowing";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide
    /// a standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let materials_dir = data_dir.join("materials");
        let audio_dir = data_dir.join("audio");

        Self {
            config_dir,
            settings_file,
            materials_dir,
            audio_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
