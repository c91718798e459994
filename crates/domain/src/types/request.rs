//! Outbound request description

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_wire_name_conversions;

/// HTTP verbs the API uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl_wire_name_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Delete => "DELETE",
});

/// Per-call knobs on top of the method, resource and body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Extra headers, sent after the defaults (a repeated name overrides)
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the resolved URL
    pub query: Vec<(String, String)>,
    /// Override the context's signing switch for this call
    pub sign_request: Option<bool>,
    /// Override the context's verification switch for this call
    pub verify_response: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Neither sign the request nor verify the response
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.sign_request = Some(false);
        self.verify_response = Some(false);
        self
    }
}

/// One call to the API
///
/// `resource` is either a path relative to the versioned base URL
/// (`"user/1/monetary-account"`), a server-rooted path that already carries
/// the version (`"/v1/user/1/payment?older_id=9"`, as found in pagination
/// cursors) or an absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub resource: String,
    pub body: Option<Value>,
    pub options: RequestOptions,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, resource: impl Into<String>) -> Self {
        Self { method, resource: resource.into(), body: None, options: RequestOptions::default() }
    }

    pub fn get(resource: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, resource)
    }

    pub fn post(resource: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, resource).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}
