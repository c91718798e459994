//! Admission control for outbound calls
//!
//! - **[`Throttle`]**: per-key concurrency gate whose slots stay occupied for
//!   a configurable window after release. Used to pace API calls per HTTP
//!   method.
//!
//! Keys are independent and admission within a key is FIFO. Queue depth is
//! unbounded; callers decide how many requests they issue.

pub mod throttle;

pub use throttle::{Throttle, ThrottleConfig, ThrottlePermit};
