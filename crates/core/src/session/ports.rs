//! Port interface for client key material

use async_trait::async_trait;
use bunq_domain::{BunqResult, ClientKeyPair};

/// Creates and loads the client's RSA key pair
#[async_trait]
pub trait KeyPairGenerator: Send + Sync {
    /// Generate a fresh private key and return it as PKCS#1 PEM
    async fn generate_private_key(&self) -> BunqResult<String>;

    /// Parse a stored private key and derive its public half
    fn load(&self, private_key_pem: &str) -> BunqResult<ClientKeyPair>;
}
