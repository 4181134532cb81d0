//! Content-addressed cache of rendered images.
//!
//! Keys are the SHA-256 of whatever describes the image (the sorted hand,
//! the wire stage, the width). The cache is purely derived data: a purge
//! only costs re-rendering.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::writer::run_blocking;
use crate::StoreError;

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// PNG files under `<dir>/<sha256>.png`.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache key for a content description.
    pub fn key_for(content: &[u8]) -> String {
        sha256_hex(content)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.png"))
    }

    /// Cached bytes for `key`, if present and readable.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(%key, "image cache hit");
                Some(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "unreadable cached image");
                None
            }
        }
    }

    /// Store `bytes` under `key`.
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        fs::write(&path, bytes).map_err(|e| StoreError::io(path, e))
    }

    /// [`get`](Self::get) off the async worker threads.
    pub async fn fetch(&self, key: &str) -> Option<Vec<u8>> {
        let cache = self.clone();
        let key = key.to_owned();
        match run_blocking(move || Ok(cache.get(&key))).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "image cache lookup failed");
                None
            }
        }
    }

    /// [`put`](Self::put) off the async worker threads.
    pub async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let cache = self.clone();
        let key = key.to_owned();
        run_blocking(move || cache.put(&key, &bytes)).await
    }

    /// Delete every cached image. Returns how many files were removed.
    pub fn purge(&self) -> Result<usize, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("png") {
                fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
                removed += 1;
            }
        }
        debug!(removed, "image cache purged");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_key_is_stable_and_content_sensitive() {
        assert_eq!(ImageCache::key_for(b"hand:1,2"), ImageCache::key_for(b"hand:1,2"));
        assert_ne!(ImageCache::key_for(b"hand:1,2"), ImageCache::key_for(b"hand:2,1"));
    }

    #[tokio::test]
    async fn test_store_then_fetch_on_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::open(dir.path().join("images")).unwrap();
        let key = ImageCache::key_for(b"penalty:3");

        assert_eq!(cache.fetch(&key).await, None);
        cache.store(&key, vec![0x89, b'P', b'N', b'G']).await.unwrap();
        assert_eq!(cache.fetch(&key).await, Some(vec![0x89, b'P', b'N', b'G']));
        assert_eq!(cache.purge().unwrap(), 1);
        assert_eq!(cache.fetch(&key).await, None);
    }
}
