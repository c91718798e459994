//! bunq wire protocol over [`HttpClient`]
//!
//! Resolves resources against the versioned base URL, adds the bunq headers,
//! signs request bodies and verifies response bodies when the
//! [`AuthContext`] asks for it, and turns the JSON envelope into an
//! [`ApiResponse`]. Non-2xx answers become [`BunqError::Status`] carrying
//! the server's error description.

use async_trait::async_trait;
use bunq_core::Transport;
use bunq_domain::constants::{
    DEFAULT_GEOLOCATION, DEFAULT_LANGUAGE, DEFAULT_REGION, HEADER_CLIENT_AUTHENTICATION,
    HEADER_CLIENT_REQUEST_ID, HEADER_CLIENT_SIGNATURE, HEADER_GEOLOCATION, HEADER_LANGUAGE,
    HEADER_REGION, HEADER_SERVER_SIGNATURE,
};
use bunq_domain::types::response::error_description;
use bunq_domain::{
    ApiRequest, ApiResponse, AuthContext, BunqError, BunqResult, ClientConfig, HttpMethod,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::client::HttpClient;
use crate::crypto::{sign_body, verify_body, KeyCache};
use crate::errors::InfraError;

/// [`Transport`] speaking to the bunq API over HTTPS
#[derive(Debug)]
pub struct HttpTransport {
    http: HttpClient,
    base_url: Url,
    keys: KeyCache,
}

impl HttpTransport {
    /// Transport for the host, version and timeout in `config`
    pub fn new(config: &ClientConfig) -> BunqResult<Self> {
        let http = HttpClient::builder().timeout(config.timeout()).build()?;
        Self::with_client(http, &config.base_url())
    }

    /// Transport over an existing client; `base_url` includes the version
    pub fn with_client(http: HttpClient, base_url: &str) -> BunqResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(InfraError::from)?;
        Ok(Self { http, base_url, keys: KeyCache::new() })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `resource` with `query` appended
    ///
    /// Absolute URLs are used as is, server-rooted paths (`/v1/...`) keep
    /// their own version prefix, anything else is relative to the base URL.
    pub fn resolve(&self, resource: &str, query: &[(String, String)]) -> BunqResult<Url> {
        let mut url = if resource.starts_with("http://") || resource.starts_with("https://") {
            Url::parse(resource)
        } else if resource.starts_with('/') {
            self.base_url.join(resource)
        } else {
            Url::parse(&format!("{}/{resource}", self.base_url.as_str().trim_end_matches('/')))
        }
        .map_err(InfraError::from)?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn headers(&self, request: &ApiRequest, auth: &AuthContext, body: &str) -> BunqResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        insert(&mut headers, HEADER_CLIENT_REQUEST_ID, &Uuid::new_v4().to_string())?;
        insert(&mut headers, HEADER_LANGUAGE, DEFAULT_LANGUAGE)?;
        insert(&mut headers, HEADER_REGION, DEFAULT_REGION)?;
        insert(&mut headers, HEADER_GEOLOCATION, DEFAULT_GEOLOCATION)?;
        if request.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(token) = auth.token() {
            insert(&mut headers, HEADER_CLIENT_AUTHENTICATION, token)?;
        }
        for (name, value) in &request.options.headers {
            insert(&mut headers, name, value)?;
        }

        if request.options.sign_request.unwrap_or(auth.sign_requests) {
            match &auth.client_key {
                Some(client_key) => {
                    let key = self.keys.signing_key(client_key.private_key_pem())?;
                    insert(&mut headers, HEADER_CLIENT_SIGNATURE, &sign_body(&key, body.as_bytes()))?;
                }
                None => debug!("signing requested without a client key, sending unsigned"),
            }
        }
        Ok(headers)
    }

    fn verify(&self, auth: &AuthContext, headers: &HeaderMap, body: &[u8]) -> BunqResult<()> {
        let Some(server_public_key) = auth.server_public_key.as_deref() else {
            return Ok(());
        };
        let signature = headers
            .get(HEADER_SERVER_SIGNATURE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                BunqError::InvalidResponse(format!("missing {HEADER_SERVER_SIGNATURE} header"))
            })?;
        let key = self.keys.verifying_key(server_public_key)?;
        verify_body(&key, body, signature)
    }
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) -> BunqResult<()> {
    let name = HeaderName::try_from(name)
        .map_err(|err| BunqError::Config(format!("invalid header name {name:?}: {err}")))?;
    let value = HeaderValue::try_from(value)
        .map_err(|err| BunqError::Config(format!("invalid value for header {name}: {err}")))?;
    headers.insert(name, value);
    Ok(())
}

const fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn rejection(status: StatusCode, body: &[u8]) -> BunqError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| error_description(&value))
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_else(|| "unknown status".to_owned());
    BunqError::status(status.as_u16(), message)
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(
        name = "bunq_request",
        skip_all,
        fields(method = %request.method, resource = %request.resource)
    )]
    async fn send(&self, request: &ApiRequest, auth: &AuthContext) -> BunqResult<ApiResponse> {
        let url = self.resolve(&request.resource, &request.options.query)?;
        let body = request.body.as_ref().map(Value::to_string).unwrap_or_default();
        let headers = self.headers(request, auth, &body)?;

        let mut builder = self.http.request(method_of(request.method), url).headers(headers);
        if request.body.is_some() {
            builder = builder.body(body);
        }

        let response = self.http.send(builder).await?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(InfraError::from)?;

        if !status.is_success() {
            let err = rejection(status, &bytes);
            debug!(status = status.as_u16(), error = %err, "request rejected");
            return Err(err);
        }

        if request.options.verify_response.unwrap_or(auth.verify_responses) {
            if let Err(err) = self.verify(auth, &response_headers, &bytes) {
                warn!(error = %err, "response signature verification failed");
                return Err(err);
            }
        }

        let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
            BunqError::InvalidResponse(format!("response body is not JSON: {err}"))
        })?;
        ApiResponse::from_envelope(status.as_u16(), value)
    }
}
