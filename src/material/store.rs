//! Persistence boundary — material records and opaque audio blobs.
//!
//! Materials are serialized as one JSON record per file; audio payloads
//! (imports and per-segment recordings) live behind the [`AudioStore`]
//! trait so hosts can substitute their own blob storage.  The core only
//! ever needs "store / retrieve / delete bytes by id".

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use super::Material;

/// Errors from the persistence layer.  Resource errors: surfaced to the
/// caller, prior state preserved.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no record with id {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// MaterialStore
// ---------------------------------------------------------------------------

/// JSON-file-per-material store.
pub struct MaterialStore {
    root: PathBuf,
}

impl MaterialStore {
    /// A store rooted at `root`, created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// Persist `material`, overwriting any previous record with its id.
    pub fn save(&self, material: &Material) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(material)?;
        fs::write(self.record_path(&material.id), json)?;
        Ok(())
    }

    /// Load the material with `id`.
    pub fn load(&self, id: &str) -> Result<Material, StoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// All stored materials, in no particular order.  Unreadable records
    /// are skipped with a warning rather than failing the listing.
    pub fn list(&self) -> Result<Vec<Material>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut materials = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|s| Ok(serde_json::from_str::<Material>(&s)?))
            {
                Ok(m) => materials.push(m),
                Err(e) => log::warn!("skipping unreadable material record {path:?}: {e}"),
            }
        }
        Ok(materials)
    }

    /// Delete the record with `id`.  Missing records are not an error.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AudioStore
// ---------------------------------------------------------------------------

/// Opaque binary audio storage keyed by id.
pub trait AudioStore: Send + Sync {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Result<Vec<u8>, StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Filesystem-backed [`AudioStore`]: one `<id>.bin` per blob.
pub struct FsAudioStore {
    root: PathBuf,
}

impl FsAudioStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.bin"))
    }
}

impl AudioStore for FsAudioStore {
    fn put(&self, id: &str, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.blob_path(id), bytes)?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.blob_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(fs::read(path)?)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.blob_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
