//! Client configuration
//!
//! Deserialisable from JSON or TOML; every field has a default except the
//! API key, which `validate` insists on.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_DEVICE_DESCRIPTION, DEFAULT_TIMEOUT_SECS, GET_RATE_LIMIT,
    POST_RATE_LIMIT, PRODUCTION_HOST, PUT_RATE_LIMIT, SANDBOX_HOST,
};
use crate::errors::{BunqError, BunqResult};
use crate::types::HttpMethod;

/// Where handshake artifacts are kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process memory; every restart performs a new installation
    #[default]
    Memory,
    /// Single JSON file at `path`
    File { path: PathBuf },
}

/// Which HTTP statuses count as an expired session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReauthPolicy {
    /// 401 only
    #[default]
    Unauthorized,
    /// 401 and 403
    UnauthorizedOrForbidden,
}

impl ReauthPolicy {
    /// Whether a response with `status` should trigger re-authentication
    pub const fn triggers(self, status: u16) -> bool {
        match self {
            Self::Unauthorized => status == 401,
            Self::UnauthorizedOrForbidden => status == 401 || status == 403,
        }
    }
}

/// Pacing for one HTTP verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub max_concurrent: usize,
    pub window_ms: u64,
}

impl RateLimit {
    pub const fn new(max_concurrent: usize, window_ms: u64) -> Self {
        Self { max_concurrent, window_ms }
    }

    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl From<(usize, u64)> for RateLimit {
    fn from((max_concurrent, window_ms): (usize, u64)) -> Self {
        Self::new(max_concurrent, window_ms)
    }
}

/// Per-verb pacing; `None` leaves the verb unthrottled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    pub get: Option<RateLimit>,
    pub post: Option<RateLimit>,
    pub put: Option<RateLimit>,
    pub delete: Option<RateLimit>,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            get: Some(GET_RATE_LIMIT.into()),
            post: Some(POST_RATE_LIMIT.into()),
            put: Some(PUT_RATE_LIMIT.into()),
            delete: None,
        }
    }
}

impl RateLimits {
    /// No pacing at all
    pub const fn unlimited() -> Self {
        Self { get: None, post: None, put: None, delete: None }
    }

    pub const fn for_method(&self, method: HttpMethod) -> Option<RateLimit> {
        match method {
            HttpMethod::Get => self.get,
            HttpMethod::Post => self.post,
            HttpMethod::Put => self.put,
            HttpMethod::Delete => self.delete,
        }
    }
}

/// Everything needed to build a client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Long-lived API secret
    pub api_key: String,
    pub device_description: String,
    /// Reuse a stored session across restarts
    pub persist_session: bool,
    pub sandbox: bool,
    pub api_version: String,
    /// Replaces `https://{host}/{api_version}` when set
    pub base_url: Option<String>,
    pub store: StoreConfig,
    pub rate_limits: RateLimits,
    pub reauth_policy: ReauthPolicy,
    pub timeout_secs: u64,
    pub sign_requests: bool,
    pub verify_responses: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            device_description: DEFAULT_DEVICE_DESCRIPTION.to_string(),
            persist_session: true,
            sandbox: false,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
            store: StoreConfig::default(),
            rate_limits: RateLimits::default(),
            reauth_policy: ReauthPolicy::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            sign_requests: true,
            verify_responses: true,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Self::default() }
    }

    pub const fn host(&self) -> &'static str {
        if self.sandbox {
            SANDBOX_HOST
        } else {
            PRODUCTION_HOST
        }
    }

    /// Versioned base URL without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}/{}", self.host(), self.api_version),
        }
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// Returns `BunqError::Config` naming the first offending field.
    pub fn validate(&self) -> BunqResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(BunqError::Config("api_key is required".into()));
        }
        if self.api_version.trim().is_empty() {
            return Err(BunqError::Config("api_version must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(BunqError::Config("timeout_secs must be greater than 0".into()));
        }
        for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete] {
            if let Some(limit) = self.rate_limits.for_method(method) {
                if limit.max_concurrent == 0 {
                    return Err(BunqError::Config(format!(
                        "rate limit for {method} must allow at least one request"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("device_description", &self.device_description)
            .field("persist_session", &self.persist_session)
            .field("sandbox", &self.sandbox)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("store", &self.store)
            .field("rate_limits", &self.rate_limits)
            .field("reauth_policy", &self.reauth_policy)
            .field("timeout_secs", &self.timeout_secs)
            .field("sign_requests", &self.sign_requests)
            .field("verify_responses", &self.verify_responses)
            .finish()
    }
}
