//! JSON file backed key-value store
//!
//! The whole store is one JSON object. It is read lazily on first access and
//! every write replaces the file in full: the new object is written to a
//! sibling temporary file, unique to that write, which is then renamed over
//! the target.
//!
//! All access from one instance is serialised through a single async mutex
//! that also guards the in-memory copy, so the cache and the file never
//! disagree. Separate instances (or processes) sharing a path are not
//! coordinated; the last writer wins.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use super::traits::KeyValueStore;

type Entries = Map<String, Value>;

/// Persistent store serialised as a flat JSON object at a fixed path
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<Entries>>,
    populate: Mutex<()>,
}

impl FileStore {
    /// Create a store over `path`; nothing is read until first access
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: Mutex::new(None), populate: Mutex::new(()) }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock the cache, loading the backing file on first use
    async fn loaded(&self) -> StorageResult<MutexGuard<'_, Option<Entries>>> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(read_entries(&self.path).await?);
        }
        Ok(cache)
    }

    /// Apply `change` to a copy of the entries, persist it, then swap it in
    async fn update<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Entries) + Send,
    {
        let mut cache = self.loaded().await?;
        let mut next = cache.clone().unwrap_or_default();
        change(&mut next);
        write_entries(&self.path, &next).await?;
        *cache = Some(next);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let cache = self.loaded().await?;
        Ok(cache.as_ref().and_then(|entries| entries.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
        .await?;
        debug!(key, path = %self.path.display(), "store entry written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.update(|entries| {
            entries.remove(key);
        })
        .await?;
        debug!(key, path = %self.path.display(), "store entry deleted");
        Ok(())
    }

    fn populate_lock(&self) -> &Mutex<()> {
        &self.populate
    }
}

/// Read the backing file; a missing file is an empty store
async fn read_entries(path: &Path) -> StorageResult<Entries> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "store file not found, starting empty");
            return Ok(Entries::new());
        }
        Err(source) => return Err(StorageError::Read { path: path.to_path_buf(), source }),
    };

    let entries: Entries = serde_json::from_slice(&bytes)
        .map_err(|source| StorageError::Corrupt { path: path.to_path_buf(), source })?;
    debug!(path = %path.display(), keys = entries.len(), "store file loaded");
    Ok(entries)
}

/// Replace the backing file with `entries`
async fn write_entries(path: &Path, entries: &Entries) -> StorageResult<()> {
    let write_error = |source| StorageError::Write { path: path.to_path_buf(), source };

    let bytes = serde_json::to_vec(entries).map_err(|source| StorageError::Serialization {
        key: path.display().to_string(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let staging = staging_path(path);
    let written = match tokio::fs::write(&staging, &bytes).await {
        Ok(()) => tokio::fs::rename(&staging, path).await,
        Err(err) => Err(err),
    };
    if let Err(source) = written {
        // Never leave a partial staging file next to the store.
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(write_error(source));
    }
    Ok(())
}

/// `<name>.<uuid>.tmp` beside `path`, so concurrent writers never share one
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(|| OsString::from("store"), OsString::from);
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    path.with_file_name(name)
}
