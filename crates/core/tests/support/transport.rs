//! Scripted in-memory transport

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bunq_core::Transport;
use bunq_domain::{
    ApiObject, ApiRequest, ApiResponse, AuthContext, BunqError, BunqResult, HttpMethod,
    Pagination, UserType,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub const INSTALLATION_TOKEN: &str = "installation-token";
pub const SERVER_PUBLIC_KEY: &str = "SERVER-PUBLIC-KEY";
pub const DEVICE_ID: u64 = 7001;

/// Canned outcome of one call
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(ApiResponse),
    Status(u16, String),
    Network(String),
}

impl Reply {
    pub fn status(status: u16, message: &str) -> Self {
        Self::Status(status, message.to_string())
    }

    fn into_result(self) -> BunqResult<ApiResponse> {
        match self {
            Self::Ok(response) => Ok(response),
            Self::Status(status, message) => Err(BunqError::status(status, message)),
            Self::Network(message) => Err(BunqError::Transport(message)),
        }
    }
}

/// One page of `Payment` objects with ids `ids` and an optional older cursor
pub fn page(ids: &[u64], older: Option<&str>) -> Reply {
    let objects = ids.iter().map(|id| ApiObject::new("Payment", json!({ "id": id }))).collect();
    let mut response = ApiResponse::new(objects);
    if let Some(older) = older {
        response = response
            .with_pagination(Pagination { older_url: Some(older.to_string()), ..Pagination::default() });
    }
    Reply::Ok(response)
}

/// What the transport saw for one call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub resource: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
    pub signed: bool,
    pub verified: bool,
}

struct State {
    scripted: HashMap<String, VecDeque<Reply>>,
    routes: HashMap<String, Reply>,
    revoked: HashSet<String>,
    calls: Vec<RecordedCall>,
    sessions_created: u64,
    user: (UserType, u64),
}

/// Remote API double
pub struct MockTransport {
    state: Mutex<State>,
    latency: Duration,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Every call sleeps `latency` before answering
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                scripted: HashMap::new(),
                routes: HashMap::new(),
                revoked: HashSet::new(),
                calls: Vec::new(),
                sessions_created: 0,
                user: (UserType::Person, 42),
            }),
            latency,
        }
    }

    /// Queue a one-shot reply for `resource`; queued replies win over
    /// everything else, handshake resources included
    pub fn script(&self, resource: &str, reply: Reply) {
        self.state.lock().scripted.entry(resource.to_string()).or_default().push_back(reply);
    }

    /// Reply to `resource` with `reply` every time
    pub fn route(&self, resource: &str, reply: Reply) {
        self.state.lock().routes.insert(resource.to_string(), reply);
    }

    /// Make non-handshake calls carrying `token` fail with 401
    pub fn revoke(&self, token: &str) {
        self.state.lock().revoked.insert(token.to_string());
    }

    /// Sessions are created for this user
    pub fn set_user(&self, user_type: UserType, id: u64) {
        self.state.lock().user = (user_type, id);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, resource: &str) -> usize {
        self.state.lock().calls.iter().filter(|call| call.resource == resource).count()
    }

    pub fn sessions_created(&self) -> u64 {
        self.state.lock().sessions_created
    }

    fn answer(&self, request: &ApiRequest, auth: &AuthContext) -> Reply {
        let mut state = self.state.lock();
        if let Some(reply) =
            state.scripted.get_mut(&request.resource).and_then(VecDeque::pop_front)
        {
            return reply;
        }

        match request.resource.as_str() {
            "installation" => Reply::Ok(ApiResponse::new(vec![
                ApiObject::new("Id", json!({"id": 1})),
                ApiObject::new("Token", json!({"id": 2, "token": INSTALLATION_TOKEN})),
                ApiObject::new("ServerPublicKey", json!({"server_public_key": SERVER_PUBLIC_KEY})),
            ])),
            "device-server" => {
                Reply::Ok(ApiResponse::new(vec![ApiObject::new("Id", json!({"id": DEVICE_ID}))]))
            }
            "session-server" => {
                state.sessions_created += 1;
                let token = format!("session-token-{}", state.sessions_created);
                let (user_type, user_id) = state.user;
                Reply::Ok(ApiResponse::new(vec![
                    ApiObject::new("Id", json!({"id": 100 + state.sessions_created})),
                    ApiObject::new("Token", json!({"id": 3, "token": token})),
                    ApiObject::new(user_type.as_str(), json!({"id": user_id})),
                ]))
            }
            resource => {
                if auth.token().is_some_and(|token| state.revoked.contains(token)) {
                    return Reply::status(401, "Insufficient authorisation.");
                }
                state
                    .routes
                    .get(resource)
                    .cloned()
                    .unwrap_or_else(|| Reply::status(404, "Route not found."))
            }
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest, auth: &AuthContext) -> BunqResult<ApiResponse> {
        self.state.lock().calls.push(RecordedCall {
            method: request.method,
            resource: request.resource.clone(),
            query: request.options.query.clone(),
            body: request.body.clone(),
            token: auth.token().map(str::to_owned),
            signed: request.options.sign_request.unwrap_or(auth.sign_requests),
            verified: request.options.verify_response.unwrap_or(auth.verify_responses),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.answer(request, auth).into_result()
    }
}
