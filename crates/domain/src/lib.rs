//! # bunq domain
//!
//! Data model shared by the bunq session crates.
//!
//! This crate contains:
//! - Handshake artifacts (`Session`, `Installation`, `DeviceId`,
//!   `ClientKeyPair`) as they are persisted in a store
//! - The API request/response model and the response envelope parser
//! - `AuthContext`, the authorization passed along with every call
//! - `ClientConfig` and the `BunqError` taxonomy
//!
//! ## Architecture
//! - Depends only on the foundation tier of `bunq-common`
//! - No I/O, no async runtime

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::{ClientConfig, RateLimit, RateLimits, ReauthPolicy, StoreConfig};
pub use errors::{BunqError, BunqResult, ErrorCategory, HandshakeStage};
pub use types::{
    ApiObject, ApiRequest, ApiResponse, AuthContext, ClientKeyPair, DeviceId, HttpMethod,
    Installation, Pagination, RequestOptions, Session, UserType,
};
