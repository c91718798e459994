//! Key-value stores with populate-on-miss semantics
//!
//! A store maps string keys to JSON values. Two backends ship with the
//! crate:
//!
//! - [`MemoryStore`]: process memory only, lost on restart
//! - [`FileStore`]: a single JSON object on disk, rewritten in full on every
//!   write
//!
//! Both implement [`KeyValueStore`], whose `get_or_create` evaluates a
//! producer at most once per store instance for a missing key, even under
//! concurrent callers. [`KeyValueStoreExt`] layers typed access on top.
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # async fn example() -> Result<(), bunq_common::StorageError> {
//! use bunq_common::storage::{KeyValueStoreExt, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let id: u64 = store
//!     .get_or_create_with("deviceId", || async { Ok::<_, std::io::Error>(42_u64) })
//!     .await?;
//! assert_eq!(id, 42);
//! # Ok(())
//! # }
//! ```

pub mod error;
#[cfg(feature = "runtime")]
pub mod file;
#[cfg(feature = "runtime")]
pub mod memory;
#[cfg(feature = "runtime")]
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
#[cfg(feature = "runtime")]
pub use file::FileStore;
#[cfg(feature = "runtime")]
pub use memory::MemoryStore;
#[cfg(feature = "runtime")]
pub use traits::{KeyValueStore, KeyValueStoreExt, Producer};
