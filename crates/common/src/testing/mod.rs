//! Helpers for tests in this and downstream crates
//!
//! - **[`async_utils`]**: `assert_eventually_async!`, timeouts, scheduler
//!   settling
//! - **[`mocks`]**: [`RecordingStore`], a store decorator that logs calls
//! - **[`temp`]**: self-cleaning scratch directories

pub mod async_utils;
pub mod mocks;
pub mod temp;

// Note: `assert_eventually_async!` is exported at the crate root
pub use async_utils::{settle, timeout_ok};
pub use mocks::{RecordingStore, StoreOp};
pub use temp::TempDir;
