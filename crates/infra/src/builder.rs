//! Wiring of a [`BunqClient`] from a [`ClientConfig`]
//!
//! The session manager and the client share one [`ThrottledTransport`], so
//! handshake calls count against the same per-verb limits as API calls.

use std::sync::Arc;

use bunq_common::storage::{FileStore, KeyValueStore, MemoryStore};
use bunq_core::{
    BunqClient, KeyPairGenerator, SessionManager, SessionSettings, ThrottledTransport, Transport,
};
use bunq_domain::{BunqResult, ClientConfig, StoreConfig};
use tracing::info;

use crate::crypto::RsaKeyPairGenerator;
use crate::http::HttpTransport;

/// Builds a [`BunqClient`]; every collaborator can be replaced
pub struct BunqClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    transport: Option<Arc<dyn Transport>>,
    keys: Option<Arc<dyn KeyPairGenerator>>,
}

impl BunqClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config, store: None, transport: None, keys: None }
    }

    /// Use `store` instead of the one described by `config.store`
    #[must_use]
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `transport` instead of an [`HttpTransport`]; it is still paced
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn key_generator(mut self, keys: Arc<dyn KeyPairGenerator>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Validate the configuration and assemble the client
    ///
    /// No network traffic happens here; the handshake runs on first use.
    ///
    /// # Errors
    /// `BunqError::Config` for an invalid configuration, or the transport's
    /// construction error.
    pub fn build(self) -> BunqResult<BunqClient> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => store_for(&self.config.store),
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        let keys: Arc<dyn KeyPairGenerator> = match self.keys {
            Some(keys) => keys,
            None => Arc::new(RsaKeyPairGenerator::new()),
        };

        let paced: Arc<dyn Transport> =
            Arc::new(ThrottledTransport::new(transport, &self.config.rate_limits));
        let session = Arc::new(SessionManager::new(
            Arc::clone(&paced),
            store,
            keys,
            SessionSettings::from(&self.config),
        ));

        info!(
            base_url = %self.config.base_url(),
            persist_session = self.config.persist_session,
            reauth_policy = ?self.config.reauth_policy,
            "bunq client ready"
        );
        Ok(BunqClient::new(paced, session, self.config.reauth_policy))
    }
}

fn store_for(config: &StoreConfig) -> Arc<dyn KeyValueStore> {
    match config {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::File { path } => Arc::new(FileStore::new(path.clone())),
    }
}

impl std::fmt::Debug for BunqClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BunqClientBuilder")
            .field("config", &self.config)
            .field("custom_store", &self.store.is_some())
            .field("custom_transport", &self.transport.is_some())
            .field("custom_keys", &self.keys.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bunq_domain::BunqError;

    use super::*;

    #[test]
    fn build_rejects_missing_api_key() {
        let err = BunqClientBuilder::new(ClientConfig::default()).build().err().unwrap();
        assert!(matches!(err, BunqError::Config(_)));
    }

    #[test]
    fn build_rejects_unparsable_base_url() {
        let mut config = ClientConfig::new("key");
        config.base_url = Some("not a url".into());
        assert!(matches!(BunqClientBuilder::new(config).build(), Err(BunqError::Config(_))));
    }

    #[tokio::test]
    async fn build_is_offline_and_unauthenticated() {
        let client = BunqClientBuilder::new(ClientConfig::new("key")).build().unwrap();
        assert!(client.session().session().is_none());
        assert!(client.session().settings().persist_session);
    }
}
