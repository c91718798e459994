//! # bunq core
//!
//! Session bootstrap and request dispatch, independent of any HTTP stack.
//!
//! This crate contains:
//! - Port interfaces ([`Transport`], [`KeyPairGenerator`]) implemented in
//!   `bunq-infra` or by test doubles
//! - [`SessionManager`]: the four-stage handshake state machine
//! - [`ThrottledTransport`]: per-verb pacing in front of any transport
//! - [`BunqClient`]: dispatch with one re-authentication retry, verb
//!   wrappers and the pagination stream
//!
//! ## Architecture Principles
//! - Depends only on `bunq-common` and `bunq-domain`
//! - All I/O goes through the ports and the key-value store trait

pub mod client;
pub mod session;
pub mod transport;

pub use client::BunqClient;
pub use session::ports::KeyPairGenerator;
pub use session::{SessionManager, SessionSettings, SessionState};
pub use transport::ports::Transport;
pub use transport::ThrottledTransport;
