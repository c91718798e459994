//! # bunq Infrastructure
//!
//! Infrastructure implementations of the `bunq-core` ports.
//!
//! This crate contains:
//! - The reqwest-based [`HttpTransport`] (URL resolution, bunq headers,
//!   request signing, response verification, envelope parsing)
//! - [`RsaKeyPairGenerator`] for the client key pair
//! - Configuration loading from environment variables or files
//! - Tracing initialisation
//! - [`BunqClientBuilder`], which wires store, transport, pacing and session
//!   manager together from a `ClientConfig`
//!
//! ## Architecture
//! - Implements traits defined in `bunq-core`
//! - Contains all "impure" code (network, key generation, environment)

pub mod builder;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use builder::BunqClientBuilder;
pub use crypto::RsaKeyPairGenerator;
pub use http::{HttpClient, HttpClientBuilder, HttpTransport};
