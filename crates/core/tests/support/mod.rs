//! Shared test helpers for `bunq-core` integration tests.
//!
//! [`MockTransport`] plays the remote API: it answers the three handshake
//! resources by itself, serves scripted or routed replies for everything
//! else and records every call. [`FakeKeys`] stands in for RSA generation.

#![allow(dead_code)]

pub mod keys;
pub mod transport;

use std::sync::Arc;

use bunq_common::storage::KeyValueStore;
use bunq_core::{BunqClient, SessionManager, SessionSettings};
use bunq_domain::ReauthPolicy;

pub use keys::FakeKeys;
pub use transport::{page, MockTransport, RecordedCall, Reply};

pub const API_KEY: &str = "test-api-key";

pub fn manager(
    transport: &Arc<MockTransport>,
    store: Arc<dyn KeyValueStore>,
    keys: &Arc<FakeKeys>,
    settings: SessionSettings,
) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(transport.clone(), store, keys.clone(), settings))
}

pub fn client(
    transport: &Arc<MockTransport>,
    session: Arc<SessionManager>,
    policy: ReauthPolicy,
) -> BunqClient {
    BunqClient::new(transport.clone(), session, policy)
}
