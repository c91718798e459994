use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bunq_domain::{BunqError, BunqResult};
use parking_lot::Mutex;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::RsaPublicKey;
use sha2::Sha256;

use super::keys::parse_private_key;
use crate::errors::InfraError;

/// Sign `body` with `key`, returning the base64 signature
pub fn sign_body(key: &SigningKey<Sha256>, body: &[u8]) -> String {
    STANDARD.encode(key.sign(body).to_bytes())
}

/// Check a base64 `signature` over `body`
///
/// # Errors
/// `InvalidResponse` if the signature is not base64 or does not match.
pub fn verify_body(key: &VerifyingKey<Sha256>, body: &[u8], signature: &str) -> BunqResult<()> {
    let bytes = STANDARD.decode(signature.trim()).map_err(InfraError::from)?;
    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|err| BunqError::InvalidResponse(format!("malformed server signature: {err}")))?;
    key.verify(body, &signature)
        .map_err(|_| BunqError::InvalidResponse("server signature does not match body".into()))
}

fn parse_public_key(pem: &str) -> BunqResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|err| BunqError::Crypto(format!("invalid server public key: {err}")))
}

/// Parsed keys, reused while the PEM they came from stays the same
#[derive(Default)]
pub struct KeyCache {
    signing: Mutex<Option<(String, Arc<SigningKey<Sha256>>)>>,
    verifying: Mutex<Option<(String, Arc<VerifyingKey<Sha256>>)>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signing_key(&self, private_key_pem: &str) -> BunqResult<Arc<SigningKey<Sha256>>> {
        let mut slot = self.signing.lock();
        if let Some((pem, key)) = slot.as_ref() {
            if pem == private_key_pem {
                return Ok(Arc::clone(key));
            }
        }
        let key = Arc::new(SigningKey::<Sha256>::new(parse_private_key(private_key_pem)?));
        *slot = Some((private_key_pem.to_owned(), Arc::clone(&key)));
        Ok(key)
    }

    pub fn verifying_key(&self, public_key_pem: &str) -> BunqResult<Arc<VerifyingKey<Sha256>>> {
        let mut slot = self.verifying.lock();
        if let Some((pem, key)) = slot.as_ref() {
            if pem == public_key_pem {
                return Ok(Arc::clone(key));
            }
        }
        let key = Arc::new(VerifyingKey::<Sha256>::new(parse_public_key(public_key_pem)?));
        *slot = Some((public_key_pem.to_owned(), Arc::clone(&key)));
        Ok(key)
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCache")
            .field("signing", &self.signing.lock().is_some())
            .field("verifying", &self.verifying.lock().is_some())
            .finish()
    }
}
