//! On-disk content store, one file per cache key.
//!
//! Raw response bytes live under the application cache root, named by their
//! cache key. Entries are created or overwritten on every successful fetch
//! and never explicitly deleted; a missing entry is a normal cache miss,
//! not an error.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::Error;

/// Handle to the file-backed content store.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open the store, creating the cache root directory if absent.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| Error::Storage(format!("create cache root {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Read the bytes stored under a key.
    ///
    /// Returns None on a cache miss.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, Error> {
        match tokio::fs::read(self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("read {key}: {e}"))),
        }
    }

    /// Write or overwrite the bytes stored under a key.
    ///
    /// The bytes land in a temp file in the cache root and are renamed into
    /// place, so a concurrent `get` observes either the previous entry or
    /// the new one, never a partial write.
    pub async fn put(&self, key: &str, bytes: Bytes) -> Result<(), Error> {
        let root = self.root.clone();
        let path = self.entry_path(key);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), Error> {
            let mut tmp = tempfile::NamedTempFile::new_in(&root)
                .map_err(|e| Error::Storage(format!("create temp file for {key}: {e}")))?;
            tmp.write_all(&bytes)
                .map_err(|e| Error::Storage(format!("write {key}: {e}")))?;
            tmp.persist(&path)
                .map_err(|e| Error::Storage(format!("persist {key}: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Storage(format!("store worker failed: {e}")))?
    }

    /// Write only if the candidate bytes differ from the stored bytes.
    ///
    /// Compares content digests (absent entry = no match) and returns
    /// whether a write happened. Used by the background refresh to avoid
    /// redundant re-renders when a fetch returns byte-identical content.
    pub async fn put_if_changed(&self, key: &str, bytes: Bytes) -> Result<bool, Error> {
        if let Some(existing) = self.get(key).await?
            && content_digest(&existing) == content_digest(&bytes)
        {
            tracing::debug!("unchanged content for {key}, skipping write");
            return Ok(false);
        }
        self.put(key, bytes).await?;
        Ok(true)
    }

    /// Whether an entry exists for a key.
    pub async fn contains(&self, key: &str) -> Result<bool, Error> {
        match tokio::fs::metadata(self.entry_path(key)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(format!("stat {key}: {e}"))),
        }
    }

    /// Number of entries currently stored.
    pub async fn entry_count(&self) -> Result<usize, Error> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| Error::Storage(format!("read cache root: {e}")))?;
        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("read cache root: {e}")))?
        {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                count += 1;
            }
        }
        Ok(count)
    }
}

fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
