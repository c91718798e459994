//! Store doubles for tests
//!
//! [`RecordingStore`] wraps any [`KeyValueStore`] and keeps a log of every
//! operation, so tests can assert which keys a component read or wrote.
//! A failure can be armed per key to exercise error paths.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use crate::storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};

/// One recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(String),
    Set(String),
    Delete(String),
}

impl StoreOp {
    pub fn key(&self) -> &str {
        match self {
            Self::Get(key) | Self::Set(key) | Self::Delete(key) => key,
        }
    }
}

/// Decorator that records every call made to the wrapped store
///
/// ```
/// # async fn example() {
/// use bunq_common::storage::KeyValueStore;
/// use bunq_common::testing::{RecordingStore, StoreOp};
///
/// let store = RecordingStore::in_memory();
/// store.set("deviceId", serde_json::json!(1)).await.unwrap();
/// assert_eq!(store.ops(), vec![StoreOp::Set("deviceId".into())]);
/// # }
/// ```
#[derive(Debug)]
pub struct RecordingStore<S = MemoryStore> {
    inner: Arc<S>,
    ops: Arc<Mutex<Vec<StoreOp>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl<S> Clone for RecordingStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ops: Arc::clone(&self.ops),
            failing: Arc::clone(&self.failing),
        }
    }
}

impl RecordingStore<MemoryStore> {
    /// Record over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: KeyValueStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    /// Record over a store that is also used elsewhere
    pub fn from_arc(inner: Arc<S>) -> Self {
        Self {
            inner,
            ops: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// All calls so far, in order
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().clone()
    }

    /// Whether any call mentioned `key`
    pub fn touched(&self, key: &str) -> bool {
        self.ops.lock().iter().any(|op| op.key() == key)
    }

    /// Number of writes to `key`
    pub fn writes_of(&self, key: &str) -> usize {
        self.ops.lock().iter().filter(|op| matches!(op, StoreOp::Set(k) if k == key)).count()
    }

    /// Number of reads of `key`
    pub fn reads_of(&self, key: &str) -> usize {
        self.ops.lock().iter().filter(|op| matches!(op, StoreOp::Get(k) if k == key)).count()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().clear();
    }

    /// Make every later call on `key` fail with a read error
    pub fn fail_key(&self, key: &str) {
        self.failing.lock().insert(key.to_string());
    }

    fn record(&self, op: StoreOp) -> StorageResult<()> {
        let failing = self.failing.lock().contains(op.key());
        let key = op.key().to_string();
        self.ops.lock().push(op);
        if failing {
            return Err(StorageError::Read {
                path: PathBuf::from(key),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for RecordingStore<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.record(StoreOp::Get(key.to_string()))?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.record(StoreOp::Set(key.to_string()))?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.record(StoreOp::Delete(key.to_string()))?;
        self.inner.delete(key).await
    }

    fn populate_lock(&self) -> &AsyncMutex<()> {
        self.inner.populate_lock()
    }
}
