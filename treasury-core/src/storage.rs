//! Snapshot store
//!
//! Whole-document persistence, one JSON file per collection:
//!
//! - `accounts` - the full account table
//! - `mutes` - active moderation mutes
//! - `tournament` - the active tournament, if any
//!
//! Documents are wrapped in a versioned envelope so the store owns the
//! snapshot format version. There are no partial updates: every write
//! replaces the collection file atomically (temp file + rename).
//!
//! A missing file is reported as `Ok(None)` so a fresh install can start
//! empty; an unreadable or corrupt file is a hard error, because starting
//! with an empty ledger would silently lose every balance.

use crate::{
    error::{Error, Result},
    Config,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Whole-document snapshot store
pub struct Store {
    root: PathBuf,
    write_retries: u32,
}

impl Store {
    /// Open or create the store directory
    pub fn open(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        tracing::info!(path = %config.data_dir.display(), "Opened snapshot store");

        Ok(Self {
            root: config.data_dir.clone(),
            write_retries: config.flush.write_retries.max(1),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }

    /// Read a whole collection document
    ///
    /// Returns `Ok(None)` when the collection has never been written.
    pub fn read<T: DeserializeOwned>(&self, collection: &str) -> Result<Option<T>> {
        let path = self.collection_path(collection);

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "failed to read collection {}: {}",
                    collection, e
                )))
            }
        };

        let envelope: Envelope<T> = serde_json::from_str(&raw).map_err(|e| {
            Error::Storage(format!("collection {} is corrupt: {}", collection, e))
        })?;

        if envelope.version != SNAPSHOT_VERSION {
            return Err(Error::Storage(format!(
                "collection {} has snapshot version {}, expected {}",
                collection, envelope.version, SNAPSHOT_VERSION
            )));
        }

        Ok(Some(envelope.data))
    }

    /// Overwrite a whole collection document
    ///
    /// Retries transient failures before surfacing an error; the caller
    /// decides whether to keep the in-memory state dirty and try again.
    /// Sleeps between attempts, so async callers run it on the blocking
    /// pool.
    pub fn write<T: Serialize>(&self, collection: &str, data: &T) -> Result<()> {
        let envelope = Envelope {
            version: SNAPSHOT_VERSION,
            data,
        };
        let text = serde_json::to_string(&envelope)?;

        let mut last_err = None;
        for attempt in 1..=self.write_retries {
            match self.write_atomic(collection, &text) {
                Ok(()) => {
                    tracing::debug!(collection, attempt, "Collection written");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        collection,
                        attempt,
                        retries = self.write_retries,
                        error = %e,
                        "Snapshot write failed"
                    );
                    last_err = Some(e);
                    std::thread::sleep(std::time::Duration::from_millis(50 * attempt as u64));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::Storage(format!("write to collection {} failed", collection))
        }))
    }

    fn write_atomic(&self, collection: &str, text: &str) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp = self.root.join(format!("{}.json.tmp", collection));

        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}
