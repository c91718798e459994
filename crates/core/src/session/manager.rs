//! Handshake state machine
//!
//! Concurrent callers of [`SessionManager::ensure_authenticated`] share one
//! handshake: the first caller that finds the session missing takes the
//! login lock and runs whichever stages are incomplete; everyone queued
//! behind it rechecks after acquiring the lock and returns the result. The
//! lock guard is dropped on every exit path, so a failed attempt never
//! blocks the next one.

use std::mem;
use std::sync::Arc;

use bunq_common::storage::{KeyValueStore, KeyValueStoreExt};
use bunq_domain::constants::{
    OBJECT_ID, OBJECT_SERVER_PUBLIC_KEY, OBJECT_TOKEN, OBJECT_USER_COMPANY, OBJECT_USER_PERSON,
    RESOURCE_DEVICE_SERVER, RESOURCE_INSTALLATION, RESOURCE_SESSION_SERVER,
    STORE_KEY_CLIENT_PRIVATE_KEY, STORE_KEY_DEVICE_ID, STORE_KEY_INSTALLATION, STORE_KEY_SESSION,
};
use bunq_domain::{
    ApiRequest, ApiResponse, AuthContext, BunqError, BunqResult, ClientConfig, ClientKeyPair,
    DeviceId, HandshakeStage, Installation, RequestOptions, Session, UserType,
};
use parking_lot::RwLock;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::KeyPairGenerator;
use super::state::SessionState;
use crate::transport::Transport;

/// The part of [`ClientConfig`] the handshake uses
#[derive(Clone)]
pub struct SessionSettings {
    pub api_key: String,
    pub device_description: String,
    pub persist_session: bool,
    pub sign_requests: bool,
    pub verify_responses: bool,
}

impl SessionSettings {
    /// Settings with the defaults of [`ClientConfig`]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from(&ClientConfig::new(api_key))
    }

    #[must_use]
    pub fn persist_session(mut self, persist: bool) -> Self {
        self.persist_session = persist;
        self
    }
}

impl From<&ClientConfig> for SessionSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            device_description: config.device_description.clone(),
            persist_session: config.persist_session,
            sign_requests: config.sign_requests,
            verify_responses: config.verify_responses,
        }
    }
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("api_key", &"<redacted>")
            .field("device_description", &self.device_description)
            .field("persist_session", &self.persist_session)
            .field("sign_requests", &self.sign_requests)
            .field("verify_responses", &self.verify_responses)
            .finish()
    }
}

/// Artifacts materialised so far by this manager
#[derive(Default)]
struct Artifacts {
    client_key: Option<ClientKeyPair>,
    installation: Option<Installation>,
    device_id: Option<DeviceId>,
    session: SessionState,
}

/// Establishes and renews the authenticated session
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    store: Arc<dyn KeyValueStore>,
    keys: Arc<dyn KeyPairGenerator>,
    settings: SessionSettings,
    login: Mutex<()>,
    artifacts: RwLock<Artifacts>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        keys: Arc<dyn KeyPairGenerator>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            transport,
            store,
            keys,
            settings,
            login: Mutex::new(()),
            artifacts: RwLock::new(Artifacts::default()),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Snapshot of the session state
    pub fn state(&self) -> SessionState {
        self.artifacts.read().session.clone()
    }

    /// The current session, if one is held
    pub fn session(&self) -> Option<Session> {
        self.artifacts.read().session.session().cloned()
    }

    /// Run the handshake stages that are still missing
    ///
    /// Idempotent: once a session is held this returns immediately. Any
    /// stage failure is returned as is; nothing is retried here.
    pub async fn ensure_authenticated(&self) -> BunqResult<AuthContext> {
        self.authenticate().await.map(|(context, _)| context)
    }

    /// User id of the session, authenticating first if needed
    pub async fn current_user_id(&self) -> BunqResult<u64> {
        self.authenticate().await.map(|(_, session)| session.user_id)
    }

    /// Account kind of the session, authenticating first if needed
    pub async fn current_user_type(&self) -> BunqResult<UserType> {
        self.authenticate().await.map(|(_, session)| session.user_type)
    }

    /// Drop the held session and obtain a new one
    ///
    /// Earlier stages are reused unless their artifacts are missing. With
    /// persistence enabled the new session overwrites the stored one.
    pub async fn force_reauthenticate(&self) -> BunqResult<AuthContext> {
        info!("forcing re-authentication");
        self.invalidate();
        self.ensure_authenticated().await
    }

    /// Re-authenticate after `rejected_token` was refused
    ///
    /// The session is only dropped if it still carries that token, so when
    /// several requests fail with the same expired session only one new
    /// session is created.
    pub async fn reauthenticate_after(&self, rejected_token: Option<&str>) -> BunqResult<AuthContext> {
        let dropped = match rejected_token {
            Some(token) => self.invalidate_if_current(token),
            None => self.invalidate(),
        };
        debug!(dropped, "re-authenticating after rejected request");
        self.ensure_authenticated().await
    }

    /// Mark the held session unusable; returns whether one was held
    pub fn invalidate(&self) -> bool {
        let mut artifacts = self.artifacts.write();
        if artifacts.session.is_authenticated() {
            artifacts.session = SessionState::Invalidated;
            true
        } else {
            debug!(state = artifacts.session.label(), "no session to invalidate");
            false
        }
    }

    fn invalidate_if_current(&self, token: &str) -> bool {
        let mut artifacts = self.artifacts.write();
        let current = artifacts.session.session().is_some_and(|session| session.token == token);
        if current {
            artifacts.session = SessionState::Invalidated;
        }
        current
    }

    async fn authenticate(&self) -> BunqResult<(AuthContext, Session)> {
        if let Some(ready) = self.session_context() {
            return Ok(ready);
        }

        let _login = self.login.lock().await;
        if let Some(ready) = self.session_context() {
            debug!("handshake completed by a concurrent caller");
            return Ok(ready);
        }

        self.run_handshake().await
    }

    #[instrument(name = "bunq_handshake", skip_all)]
    async fn run_handshake(&self) -> BunqResult<(AuthContext, Session)> {
        debug!(state = self.state().label(), "starting handshake");
        let client_key = self.client_key().await?;
        let installation = self.installation(&client_key).await?;

        let installation_context = self.context(&client_key, &installation, &installation.token);
        let device_id = self.device_id(&installation_context).await?;
        let session = self.session_stage(&installation_context).await?;

        info!(
            device_id = %device_id,
            user_id = session.user_id,
            user_type = %session.user_type,
            "authenticated"
        );
        let context = self.context(&client_key, &installation, &session.token);
        Ok((context, session))
    }

    async fn client_key(&self) -> BunqResult<ClientKeyPair> {
        let cached = self.artifacts.read().client_key.clone();
        if let Some(client_key) = cached {
            return Ok(client_key);
        }

        let keys = Arc::clone(&self.keys);
        let private_key_pem: String = self
            .store
            .get_or_create_with(STORE_KEY_CLIENT_PRIVATE_KEY, move || async move {
                info!(stage = "client_key_pair", "generating client key pair");
                keys.generate_private_key().await
            })
            .await?;

        let client_key = self.keys.load(&private_key_pem)?;
        self.artifacts.write().client_key = Some(client_key.clone());
        Ok(client_key)
    }

    async fn installation(&self, client_key: &ClientKeyPair) -> BunqResult<Installation> {
        let cached = self.artifacts.read().installation.clone();
        if let Some(installation) = cached {
            return Ok(installation);
        }

        let transport = Arc::clone(&self.transport);
        let public_key = client_key.public_key_pem().to_owned();
        let installation: Installation = self
            .store
            .get_or_create_with(STORE_KEY_INSTALLATION, move || async move {
                info!(stage = "installation", "registering client public key");
                let request =
                    ApiRequest::post(RESOURCE_INSTALLATION, json!({ "client_public_key": public_key }))
                        .with_options(RequestOptions::new().unsigned());
                let response = transport.send(&request, &AuthContext::anonymous()).await?;
                parse_installation(&response)
            })
            .await?;

        self.artifacts.write().installation = Some(installation.clone());
        Ok(installation)
    }

    async fn device_id(&self, context: &AuthContext) -> BunqResult<DeviceId> {
        let cached = self.artifacts.read().device_id;
        if let Some(device_id) = cached {
            return Ok(device_id);
        }

        let transport = Arc::clone(&self.transport);
        let context = context.clone();
        let body = json!({
            "secret": self.settings.api_key,
            "description": self.settings.device_description,
        });
        let device_id: DeviceId = self
            .store
            .get_or_create_with(STORE_KEY_DEVICE_ID, move || async move {
                info!(stage = "device_registration", "registering device");
                let request = ApiRequest::post(RESOURCE_DEVICE_SERVER, body);
                let response = transport.send(&request, &context).await?;
                parse_device_id(&response)
            })
            .await?;

        self.artifacts.write().device_id = Some(device_id);
        Ok(device_id)
    }

    async fn session_stage(&self, context: &AuthContext) -> BunqResult<Session> {
        let stage = SessionStage::begin(&self.artifacts);
        match self.obtain_session(stage.previous(), context).await {
            Ok(session) => {
                stage.complete(session.clone());
                Ok(session)
            }
            Err(err) => {
                warn!(stage = "session", error = %err, "session stage failed");
                Err(err)
            }
        }
    }

    async fn obtain_session(
        &self,
        previous: &SessionState,
        context: &AuthContext,
    ) -> BunqResult<Session> {
        if !self.settings.persist_session {
            return self.create_session(context).await;
        }

        // Only a manager that never held a session may resume a stored one;
        // after invalidation the stored copy is the rejected session.
        if matches!(previous, SessionState::Unauthenticated) {
            if let Some(stored) = self.store.get_as::<Session>(STORE_KEY_SESSION).await? {
                info!(stage = "session", user_id = stored.user_id, "resumed stored session");
                return Ok(stored);
            }
        }

        let session = self.create_session(context).await?;
        self.store.set_as(STORE_KEY_SESSION, &session).await?;
        Ok(session)
    }

    async fn create_session(&self, context: &AuthContext) -> BunqResult<Session> {
        info!(stage = "session", "creating session");
        let request =
            ApiRequest::post(RESOURCE_SESSION_SERVER, json!({ "secret": self.settings.api_key }));
        let response = self.transport.send(&request, context).await?;
        parse_session(&response)
    }

    fn context(&self, client_key: &ClientKeyPair, installation: &Installation, token: &str) -> AuthContext {
        AuthContext::anonymous()
            .with_token(token)
            .signing(client_key.clone(), self.settings.sign_requests)
            .verifying(installation.server_public_key.clone(), self.settings.verify_responses)
    }

    fn session_context(&self) -> Option<(AuthContext, Session)> {
        let artifacts = self.artifacts.read();
        let session = artifacts.session.session()?;
        let client_key = artifacts.client_key.as_ref()?;
        let installation = artifacts.installation.as_ref()?;
        Some((self.context(client_key, installation, &session.token), session.clone()))
    }
}

/// Marks the session `Authenticating` for the duration of stage 4
///
/// Restores the previous state unless completed, including when the caller
/// abandons the handshake future.
struct SessionStage<'a> {
    artifacts: &'a RwLock<Artifacts>,
    previous: SessionState,
    completed: bool,
}

impl<'a> SessionStage<'a> {
    fn begin(artifacts: &'a RwLock<Artifacts>) -> Self {
        let previous = mem::replace(&mut artifacts.write().session, SessionState::Authenticating);
        Self { artifacts, previous, completed: false }
    }

    fn previous(&self) -> &SessionState {
        &self.previous
    }

    fn complete(mut self, session: Session) {
        self.artifacts.write().session = SessionState::Authenticated(session);
        self.completed = true;
    }
}

impl Drop for SessionStage<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.artifacts.write().session = mem::take(&mut self.previous);
        }
    }
}

fn missing(stage: HandshakeStage, what: &str) -> BunqError {
    BunqError::handshake(stage, format!("response has no {what}"))
}

fn parse_installation(response: &ApiResponse) -> BunqResult<Installation> {
    let token = response
        .first_of(OBJECT_TOKEN)
        .and_then(|object| object.str_field("token"))
        .ok_or_else(|| missing(HandshakeStage::Installation, "Token.token"))?;
    let server_public_key = response
        .first_of(OBJECT_SERVER_PUBLIC_KEY)
        .and_then(|object| object.str_field("server_public_key"))
        .ok_or_else(|| {
            missing(HandshakeStage::Installation, "ServerPublicKey.server_public_key")
        })?;

    Ok(Installation { token: token.to_owned(), server_public_key: server_public_key.to_owned() })
}

fn parse_device_id(response: &ApiResponse) -> BunqResult<DeviceId> {
    response
        .first_of(OBJECT_ID)
        .and_then(|object| object.u64_field("id"))
        .map(DeviceId)
        .ok_or_else(|| missing(HandshakeStage::DeviceRegistration, "Id.id"))
}

fn parse_session(response: &ApiResponse) -> BunqResult<Session> {
    let token = response
        .first_of(OBJECT_TOKEN)
        .and_then(|object| object.str_field("token"))
        .ok_or_else(|| missing(HandshakeStage::Session, "Token.token"))?;

    let (user, user_type) = match response.first_of(OBJECT_USER_PERSON) {
        Some(person) => (person, UserType::Person),
        None => response
            .first_of(OBJECT_USER_COMPANY)
            .map(|company| (company, UserType::Company))
            .ok_or_else(|| missing(HandshakeStage::Session, "UserPerson or UserCompany"))?,
    };
    let user_id = user
        .u64_field("id")
        .ok_or_else(|| missing(HandshakeStage::Session, "user id"))?;

    Ok(Session { token: token.to_owned(), user_id, user_type })
}
