//! Store contract and typed helpers

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::{StorageError, StorageResult};
use crate::error::BoxError;

/// Deferred computation of a missing value
///
/// Evaluated at most once by [`KeyValueStore::get_or_create`]. Producers may
/// suspend (generate keys, call the network) but must not call
/// `get_or_create` on the same store, which would wait on itself.
pub type Producer<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<Value, BoxError>> + Send + 'a>;

/// Pluggable key-value store
///
/// Implementations must make `set` durable before returning and keep any
/// in-memory cache consistent with the backing medium.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Look up a key; `Ok(None)` when the key has never been stored
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Store a value, replacing any previous value for the key
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Remove a key; removing a missing key is not an error
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Mutex serialising populate-on-miss producers for this instance
    fn populate_lock(&self) -> &Mutex<()>;

    /// Return the value for `key`, producing and storing it on first miss
    ///
    /// Concurrent callers on the same missing key observe a single
    /// producer run and all receive the value it stored. A failed producer
    /// stores nothing.
    async fn get_or_create(&self, key: &str, producer: Producer<'_>) -> StorageResult<Value> {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let _guard = self.populate_lock().lock().await;

        // Another caller may have populated the key while we waited.
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        debug!(key, "store miss, running producer");
        let value = producer()
            .await
            .map_err(|source| StorageError::Producer { key: key.to_string(), source })?;
        self.set(key, value.clone()).await?;
        Ok(value)
    }
}

/// Typed access on top of any [`KeyValueStore`]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Look up a key and deserialize it
    fn get_as<'a, T>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<T>>>
    where
        T: DeserializeOwned + Send + 'a,
    {
        Box::pin(async move {
            match self.get(key).await? {
                Some(value) => serde_json::from_value(value)
                    .map(Some)
                    .map_err(|source| StorageError::Serialization { key: key.to_string(), source }),
                None => Ok(None),
            }
        })
    }

    /// Serialize and store a value
    fn set_as<'a, T>(&'a self, key: &'a str, value: &'a T) -> BoxFuture<'a, StorageResult<()>>
    where
        T: Serialize + Sync + 'a,
    {
        Box::pin(async move {
            let value = serde_json::to_value(value)
                .map_err(|source| StorageError::Serialization { key: key.to_string(), source })?;
            self.set(key, value).await
        })
    }

    /// Typed [`KeyValueStore::get_or_create`]
    ///
    /// A producer error comes back as [`StorageError::Producer`] with the
    /// original error boxed as its source.
    fn get_or_create_with<'a, T, E, F, Fut>(
        &'a self,
        key: &'a str,
        producer: F,
    ) -> BoxFuture<'a, StorageResult<T>>
    where
        T: Serialize + DeserializeOwned + Send + 'a,
        E: Into<BoxError> + Send + 'a,
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        Box::pin(async move {
            let produce: Producer<'a> = Box::new(move || -> BoxFuture<'a, Result<Value, BoxError>> {
                Box::pin(async move {
                    let produced: T = match producer().await {
                        Ok(produced) => produced,
                        Err(err) => {
                            let err: BoxError = err.into();
                            return Err(err);
                        }
                    };
                    serde_json::to_value(produced).map_err(|source| {
                        Box::new(StorageError::Serialization { key: key.to_string(), source })
                            as BoxError
                    })
                })
            });

            let value = match self.get_or_create(key, produce).await {
                Ok(value) => value,
                Err(StorageError::Producer { key, source }) => {
                    return Err(match source.downcast::<StorageError>() {
                        Ok(inner) => *inner,
                        Err(source) => StorageError::Producer { key, source },
                    });
                }
                Err(other) => return Err(other),
            };

            serde_json::from_value(value)
                .map_err(|source| StorageError::Serialization { key: key.to_string(), source })
        })
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
