//! Deterministic stand-in for RSA key generation

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bunq_core::KeyPairGenerator;
use bunq_domain::{BunqError, BunqResult, ClientKeyPair};

/// Produces `PRIVATE-KEY-<n>` and derives `PUBLIC(<private>)`
#[derive(Debug, Default)]
pub struct FakeKeys {
    generated: AtomicUsize,
}

impl FakeKeys {
    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyPairGenerator for FakeKeys {
    async fn generate_private_key(&self) -> BunqResult<String> {
        let n = self.generated.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::task::yield_now().await;
        Ok(format!("PRIVATE-KEY-{n}"))
    }

    fn load(&self, private_key_pem: &str) -> BunqResult<ClientKeyPair> {
        if !private_key_pem.starts_with("PRIVATE-KEY-") {
            return Err(BunqError::Crypto(format!("not a key: {private_key_pem}")));
        }
        Ok(ClientKeyPair::new(private_key_pem, format!("PUBLIC({private_key_pem})")))
    }
}
