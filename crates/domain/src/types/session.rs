//! Handshake artifacts
//!
//! Each type serialises to exactly the value kept under its store key, so a
//! store file written by one process can be resumed by another.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{OBJECT_USER_COMPANY, OBJECT_USER_PERSON};
use crate::impl_wire_name_conversions;

/// Which of the two mutually exclusive account kinds a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "UserPerson")]
    Person,
    #[serde(rename = "UserCompany")]
    Company,
}

impl_wire_name_conversions!(UserType {
    Person => OBJECT_USER_PERSON,
    Company => OBJECT_USER_COMPANY,
});

/// Live authenticated context, stored under `session`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: u64,
    pub user_type: UserType,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("user_type", &self.user_type)
            .finish()
    }
}

/// Result of the one-time key exchange, stored under `installation`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    /// Authorizes device registration and session creation
    pub token: String,
    /// PEM public key used to verify response signatures
    pub server_public_key: String,
}

impl fmt::Debug for Installation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Installation")
            .field("token", &"<redacted>")
            .field("server_public_key", &self.server_public_key)
            .finish()
    }
}

/// Identifier of the registered device, stored under `deviceId` as a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local RSA key pair in PEM form
///
/// Only the private half is persisted (under `clientPrivateKey`); the public
/// half is derived from it when the pair is materialised.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientKeyPair {
    private_key_pem: String,
    public_key_pem: String,
}

impl ClientKeyPair {
    pub fn new(private_key_pem: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        Self { private_key_pem: private_key_pem.into(), public_key_pem: public_key_pem.into() }
    }

    /// PKCS#1 PEM private key
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// SPKI PEM public key, as sent to the installation endpoint
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }
}

impl fmt::Debug for ClientKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientKeyPair")
            .field("private_key_pem", &"<redacted>")
            .field("public_key_pem", &self.public_key_pem)
            .finish()
    }
}
