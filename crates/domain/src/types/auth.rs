//! Authorization context
//!
//! Everything a transport needs to authorize, sign and verify one call. The
//! session manager produces a fresh context after every successful
//! handshake; nothing is installed on shared client state.

use std::fmt;

use super::session::ClientKeyPair;

/// Authorization for a single call
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// Value for `X-Bunq-Client-Authentication`; installation or session token
    pub token: Option<String>,
    /// Key used to sign request bodies
    pub client_key: Option<ClientKeyPair>,
    /// PEM key used to verify response signatures
    pub server_public_key: Option<String>,
    pub sign_requests: bool,
    pub verify_responses: bool,
}

impl AuthContext {
    /// No token, no signing, no verification (installation call)
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sign with `client_key` when `sign` is set
    #[must_use]
    pub fn signing(mut self, client_key: ClientKeyPair, sign: bool) -> Self {
        self.client_key = Some(client_key);
        self.sign_requests = sign;
        self
    }

    /// Verify against `server_public_key` when `verify` is set
    #[must_use]
    pub fn verifying(mut self, server_public_key: impl Into<String>, verify: bool) -> Self {
        self.server_public_key = Some(server_public_key.into());
        self.verify_responses = verify;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("client_key", &self.client_key)
            .field("server_public_key", &self.server_public_key.is_some())
            .field("sign_requests", &self.sign_requests)
            .field("verify_responses", &self.verify_responses)
            .finish()
    }
}
