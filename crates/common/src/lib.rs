//! Modular common utilities shared across the bunq-session crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification and the storage error type
//! - `runtime`: async infrastructure (key-value stores, keyed throttle)
//! - `test-utils`: helpers for tests in downstream crates
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod storage;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(feature = "test-utils")]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{BoxError, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{Throttle, ThrottleConfig, ThrottlePermit};
#[cfg(feature = "foundation")]
pub use storage::{StorageError, StorageResult};
#[cfg(feature = "runtime")]
pub use storage::{FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore};
