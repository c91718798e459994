//! Port interface for sending API calls
//!
//! Implemented by the reqwest transport in `bunq-infra`.

use async_trait::async_trait;
use bunq_domain::{ApiRequest, ApiResponse, AuthContext, BunqResult};

/// Sends one request and parses the response envelope
///
/// Implementations must report a non-2xx response as
/// [`BunqError::Status`](bunq_domain::BunqError::Status) carrying the HTTP
/// status, so callers can recognise authentication failures. Connection
/// level failures are `BunqError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` authorized by `auth`
    async fn send(&self, request: &ApiRequest, auth: &AuthContext) -> BunqResult<ApiResponse>;
}
