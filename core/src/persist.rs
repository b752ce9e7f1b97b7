//! Persisted state blobs
//!
//! Each store serializes independently to one JSON file per namespaced key
//! under the state directory. There is no cross-key transactionality: a store
//! is written whenever it mutates, and inconsistencies between two dependent
//! blobs are repaired by the defensive reconciliation pass at next load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreResult;

/// Storage key for the filesystem tree blob.
pub const KEY_FS: &str = "os:fs:v1";
/// Storage key for the block-device table blob.
pub const KEY_DEVICES: &str = "os:blockdevices:v1";
/// Storage key for the window-manager blob.
pub const KEY_WM: &str = "os:wm:v1";
/// Storage key for user settings.
pub const KEY_SETTINGS: &str = "os:settings:v1";
/// Storage key for session flags (boot-seen, frequent apps).
pub const KEY_SESSION: &str = "os:session:v1";

/// Directory-backed key/value store for JSON blobs.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        // "os:fs:v1" -> "os.fs.v1.json"
        self.dir.join(format!("{}.json", key.replace(':', ".")))
    }

    /// Load a blob. A missing file is `None`; a corrupt file is logged and
    /// treated as missing so the owning store can fall back to its defaults.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        let path = self.blob_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding corrupt state blob");
                Ok(None)
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> CoreResult<()> {
        let path = self.blob_path(key);
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        count: u32,
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();

        let blob = Blob {
            name: "sr0".into(),
            count: 2,
        };
        store.save(KEY_DEVICES, &blob).unwrap();

        let loaded: Option<Blob> = store.load(KEY_DEVICES).unwrap();
        assert_eq!(loaded, Some(blob));
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        let loaded: Option<Blob> = store.load(KEY_FS).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_blob_is_discarded() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("os.fs.v1.json"), "{not json").unwrap();

        let loaded: Option<Blob> = store.load(KEY_FS).unwrap();
        assert!(loaded.is_none());
    }
}
