//! Request dispatch
//!
//! [`BunqClient`] makes sure a session exists before each call and recovers
//! once from an expired session: on an authentication-class rejection it
//! re-authenticates and retries the same request exactly once. A second
//! rejection of the same class is returned as
//! [`BunqError::AuthExpired`]. Every other failure passes through untouched.

mod pagination;

use std::sync::Arc;

use bunq_domain::{
    ApiObject, ApiRequest, ApiResponse, BunqError, BunqResult, HttpMethod, ReauthPolicy,
    RequestOptions, UserType,
};
use futures::stream::BoxStream;
use serde_json::Value;
use tracing::{debug, warn};

use crate::session::SessionManager;
use crate::transport::Transport;

/// Authenticated API client
pub struct BunqClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    reauth_policy: ReauthPolicy,
}

impl BunqClient {
    /// `transport` should be the same (throttled) transport the session
    /// manager uses, so handshake calls and requests share the pacing.
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionManager>,
        reauth_policy: ReauthPolicy,
    ) -> Self {
        Self { transport, session, reauth_policy }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn reauth_policy(&self) -> ReauthPolicy {
        self.reauth_policy
    }

    /// Send `request`, authenticating first
    pub async fn request(&self, request: ApiRequest) -> BunqResult<ApiResponse> {
        let context = self.session.ensure_authenticated().await?;

        let status = match self.transport.send(&request, &context).await {
            Err(BunqError::Status { status, message }) if self.reauth_policy.triggers(status) => {
                warn!(
                    method = %request.method,
                    resource = %request.resource,
                    status,
                    message = %message,
                    "request rejected, re-authenticating once"
                );
                status
            }
            other => return other,
        };

        let context = self.session.reauthenticate_after(context.token()).await?;
        match self.transport.send(&request, &context).await {
            Err(BunqError::Status { status: retry_status, message })
                if self.reauth_policy.triggers(retry_status) =>
            {
                debug!(first_status = status, retry_status, "retry rejected as well");
                Err(BunqError::AuthExpired { status: retry_status, message })
            }
            other => other,
        }
    }

    pub async fn get(&self, resource: &str) -> BunqResult<ApiResponse> {
        self.request(ApiRequest::new(HttpMethod::Get, resource)).await
    }

    pub async fn post(&self, resource: &str, body: Value) -> BunqResult<ApiResponse> {
        self.request(ApiRequest::new(HttpMethod::Post, resource).with_body(body)).await
    }

    pub async fn put(&self, resource: &str, body: Value) -> BunqResult<ApiResponse> {
        self.request(ApiRequest::new(HttpMethod::Put, resource).with_body(body)).await
    }

    pub async fn delete(&self, resource: &str) -> BunqResult<ApiResponse> {
        self.request(ApiRequest::new(HttpMethod::Delete, resource)).await
    }

    /// Every object of a paginated collection, newest page first
    ///
    /// Follows the `older_url` cursor until a page has none. Each call starts
    /// a new traversal; an error ends the stream after being yielded.
    pub fn list(&self, resource: &str) -> BoxStream<'_, BunqResult<ApiObject>> {
        self.list_with(resource, RequestOptions::default())
    }

    /// [`list`](Self::list) with options applied to every page request
    pub fn list_with(
        &self,
        resource: &str,
        options: RequestOptions,
    ) -> BoxStream<'_, BunqResult<ApiObject>> {
        pagination::paginate(self, resource.to_owned(), options)
    }

    /// User id of the session
    pub async fn user_id(&self) -> BunqResult<u64> {
        self.session.current_user_id().await
    }

    /// Account kind of the session
    pub async fn user_type(&self) -> BunqResult<UserType> {
        self.session.current_user_type().await
    }
}
