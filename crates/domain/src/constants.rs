//! API constants
//!
//! Hosts, resource names, header names and the defaults the client starts
//! from when no configuration overrides them.

// Hosts
pub const PRODUCTION_HOST: &str = "api.bunq.com";
pub const SANDBOX_HOST: &str = "public-api.sandbox.bunq.com";
pub const DEFAULT_API_VERSION: &str = "v1";

// Client identity
pub const DEFAULT_DEVICE_DESCRIPTION: &str = "bunq-session";
pub const USER_AGENT: &str = concat!("bunq-session/", env!("CARGO_PKG_VERSION"));

// Store keys (persisted layout)
pub const STORE_KEY_CLIENT_PRIVATE_KEY: &str = "clientPrivateKey";
pub const STORE_KEY_INSTALLATION: &str = "installation";
pub const STORE_KEY_DEVICE_ID: &str = "deviceId";
pub const STORE_KEY_SESSION: &str = "session";

// Handshake resources
pub const RESOURCE_INSTALLATION: &str = "installation";
pub const RESOURCE_DEVICE_SERVER: &str = "device-server";
pub const RESOURCE_SESSION_SERVER: &str = "session-server";

// Object type names in the response envelope
pub const OBJECT_TOKEN: &str = "Token";
pub const OBJECT_SERVER_PUBLIC_KEY: &str = "ServerPublicKey";
pub const OBJECT_ID: &str = "Id";
pub const OBJECT_USER_PERSON: &str = "UserPerson";
pub const OBJECT_USER_COMPANY: &str = "UserCompany";

// Headers
pub const HEADER_CLIENT_AUTHENTICATION: &str = "X-Bunq-Client-Authentication";
pub const HEADER_CLIENT_SIGNATURE: &str = "X-Bunq-Client-Signature";
pub const HEADER_SERVER_SIGNATURE: &str = "X-Bunq-Server-Signature";
pub const HEADER_CLIENT_REQUEST_ID: &str = "X-Bunq-Client-Request-Id";
pub const HEADER_LANGUAGE: &str = "X-Bunq-Language";
pub const HEADER_REGION: &str = "X-Bunq-Region";
pub const HEADER_GEOLOCATION: &str = "X-Bunq-Geolocation";

pub const DEFAULT_LANGUAGE: &str = "en_US";
pub const DEFAULT_REGION: &str = "nl_NL";
pub const DEFAULT_GEOLOCATION: &str = "0 0 0 0 000";

// Rate limits: (max concurrent, window in ms) per verb
pub const GET_RATE_LIMIT: (usize, u64) = (3, 3000);
pub const POST_RATE_LIMIT: (usize, u64) = (5, 3000);
pub const PUT_RATE_LIMIT: (usize, u64) = (2, 3000);

// Transport
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const RSA_KEY_BITS: usize = 2048;
