//! Session bootstrap and renewal
//!
//! The handshake runs four stages in order, each memoised in the
//! key-value store:
//!
//! 1. client key pair (`clientPrivateKey`)
//! 2. installation (`installation`)
//! 3. device registration (`deviceId`)
//! 4. session (`session`, only when sessions are persisted)

pub mod manager;
pub mod ports;
pub mod state;

pub use manager::{SessionManager, SessionSettings};
pub use ports::KeyPairGenerator;
pub use state::SessionState;
