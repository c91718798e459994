//! Per-verb pacing in front of a transport
//!
//! Every verb with a configured limit gets its own [`Throttle`], so a burst
//! of GETs never delays a POST. Handshake calls go through the same gate as
//! regular requests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bunq_common::resilience::{Throttle, ThrottleConfig};
use bunq_domain::{ApiRequest, ApiResponse, AuthContext, BunqResult, HttpMethod, RateLimits};
use tracing::trace;

use super::ports::Transport;

/// Transport decorator applying [`RateLimits`]
pub struct ThrottledTransport {
    inner: Arc<dyn Transport>,
    throttles: HashMap<HttpMethod, Throttle<HttpMethod>>,
}

impl ThrottledTransport {
    pub fn new(inner: Arc<dyn Transport>, limits: &RateLimits) -> Self {
        let throttles = [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete]
            .into_iter()
            .filter_map(|method| {
                limits.for_method(method).map(|limit| {
                    let config = ThrottleConfig::new(limit.max_concurrent, limit.window());
                    (method, Throttle::new(config))
                })
            })
            .collect();
        Self { inner, throttles }
    }

    /// Throttle applied to `method`, if any
    pub fn throttle(&self, method: HttpMethod) -> Option<&Throttle<HttpMethod>> {
        self.throttles.get(&method)
    }
}

#[async_trait]
impl Transport for ThrottledTransport {
    async fn send(&self, request: &ApiRequest, auth: &AuthContext) -> BunqResult<ApiResponse> {
        let Some(throttle) = self.throttles.get(&request.method) else {
            return self.inner.send(request, auth).await;
        };

        let _permit = throttle.admit(request.method).await;
        trace!(method = %request.method, resource = %request.resource, "throttle admitted request");
        self.inner.send(request, auth).await
    }
}
