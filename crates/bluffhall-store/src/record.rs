//! Keyed record stores.
//!
//! A store maps a key (a channel id) to the latest encoded record for that
//! key. Every save overwrites the whole record; there is no history.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::StoreError;

/// Blocking key/value storage for encoded records.
///
/// Implementations are called from the background writer (via
/// `spawn_blocking`) and once at startup, never from inside a room.
pub trait RecordStore: Send + Sync + 'static {
    /// Replace the record stored under `key`.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Delete the record under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Every stored record, as `(key, bytes)` pairs ordered by key.
    fn load_all(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError>;
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One JSON file per key under a directory.
///
/// Writes go to `<file>.tmp` first and are renamed over the live file, so
/// a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    const EXTENSION: &'static str = "json";

    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        debug!(dir = %dir.display(), "file store opened");
        Ok(Self { dir })
    }

    /// The directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_key(key), Self::EXTENSION))
    }
}

impl RecordStore for FileStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(bytes).map_err(|e| StoreError::io(&tmp, e))?;
        file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn load_all(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut records = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(Self::EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(key) = decode_key(stem) else {
                warn!(file = %path.display(), "skipping record with unreadable name");
                continue;
            };
            match fs::read(&path) {
                Ok(bytes) => records.push((key, bytes)),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable record"),
            }
        }

        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}

/// Escape a key into a portable file stem. Alphanumerics, `-` and `_`
/// pass through; every other byte becomes `~XX`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("~{byte:02X}"));
        }
    }
    out
}

fn decode_key(stem: &str) -> Option<String> {
    let raw = stem.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'~' {
            let hex = stem.get(i + 1..i + 3)?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(bytes).ok()
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. Lost on exit; used by tests and the demo.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned map is still structurally valid.
        self.records.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
