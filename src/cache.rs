//! Content-addressed on-disk cache for expensive external calls.
//!
//! Every external request the pipeline makes (reader fetches, extraction
//! prompts, validation prompts) is memoized here so a run can be interrupted
//! and resumed without paying for the same call twice.
//!
//! # Layout
//!
//! ```text
//! cache_dir/
//! ├── reader/       # raw article text, or the literal `None` for dead URLs
//! ├── predictions/  # JSON array of PredictionRecord per archive URL
//! └── validation/   # JSON `true` / `false` per PredictionRecord
//! ```
//!
//! File names are lowercase hex SHA-256 digests of the request. Entries never
//! expire and are never overwritten: the first write wins. Each write is
//! staged in a temp file inside the namespace directory and moved into place
//! whole, so a crash mid-write leaves no entry behind. A JSON entry that no
//! longer parses is removed and reported as a miss.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::task;
use tracing::{debug, instrument, warn};

/// Independent key spaces inside the cache root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Raw text returned by the reader service.
    Reader,
    /// Filtered extraction results.
    Predictions,
    /// Validation verdicts.
    Validation,
}

impl Namespace {
    pub fn dir_name(self) -> &'static str {
        match self {
            Namespace::Reader => "reader",
            Namespace::Predictions => "predictions",
            Namespace::Validation => "validation",
        }
    }
}

/// Fingerprint of an arbitrary request descriptor.
pub fn fingerprint(descriptor: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(descriptor.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of a serializable value, taken over its compact JSON form.
pub fn fingerprint_json<T: Serialize>(value: &T) -> Result<String, Box<dyn Error>> {
    let descriptor = serde_json::to_string(value)?;
    Ok(fingerprint(&descriptor))
}

/// Handle to the cache root. Cheap to clone; each component owns a copy.
#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, namespace: Namespace, key: &str) -> PathBuf {
        self.root.join(namespace.dir_name()).join(key)
    }

    /// Read a text entry. `Ok(None)` is a miss.
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        match fs::read_to_string(self.entry_path(namespace, key)).await {
            Ok(blob) => {
                debug!(bytes = blob.len(), "Cache hit");
                Ok(Some(blob))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss");
                Ok(None)
            }
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Write a text entry, creating the namespace directory first.
    ///
    /// An existing entry is left untouched.
    #[instrument(level = "debug", skip(self, blob), fields(bytes = blob.len()))]
    pub async fn put(&self, namespace: Namespace, key: &str, blob: &str) -> Result<(), Box<dyn Error>> {
        let dir = self.root.join(namespace.dir_name());
        fs::create_dir_all(&dir).await?;

        let target = self.entry_path(namespace, key);
        let blob = blob.to_owned();
        let written = task::spawn_blocking(move || -> std::io::Result<bool> {
            let mut staged = NamedTempFile::new_in(&dir)?;
            staged.write_all(blob.as_bytes())?;
            staged.as_file().sync_all()?;
            match staged.persist_noclobber(&target) {
                Ok(_) => Ok(true),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
                Err(e) => Err(e.error),
            }
        })
        .await??;

        if written {
            debug!("Cache entry written");
        } else {
            debug!("Cache entry already present; keeping first write");
        }
        Ok(())
    }

    /// Delete an entry. Removing a missing entry is not an error.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove(&self, namespace: Namespace, key: &str) -> Result<(), Box<dyn Error>> {
        match fs::remove_file(self.entry_path(namespace, key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Read and deserialize a JSON entry.
    ///
    /// An entry that does not parse is removed so the next `put` can replace it.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<Option<T>, Box<dyn Error>> {
        let Some(blob) = self.get(namespace, key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&blob) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    namespace = namespace.dir_name(),
                    key,
                    error = %e,
                    "Dropping unreadable cache entry"
                );
                self.remove(namespace, key).await?;
                Ok(None)
            }
        }
    }

    /// Serialize a value as pretty JSON and store it.
    pub async fn put_json<T: Serialize>(
        &self,
        namespace: Namespace,
        key: &str,
        value: &T,
    ) -> Result<(), Box<dyn Error>> {
        let blob = serde_json::to_string_pretty(value)?;
        self.put(namespace, key, &blob).await
    }
}
