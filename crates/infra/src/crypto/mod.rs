//! Client key pair generation and body signatures
//!
//! Keys are RSA. The private key is kept as PKCS#1 PEM (the form stored
//! under `clientPrivateKey`), public keys travel as SPKI PEM. Bodies are
//! signed SHA256-with-RSA (PKCS#1 v1.5) and signatures are base64.

pub mod keys;
pub mod signing;

pub use keys::RsaKeyPairGenerator;
pub use signing::{sign_body, verify_body, KeyCache};
