//! Domain types and models
//!
//! - [`session`]: handshake artifacts in their persisted shape
//! - [`auth`]: the authorization context passed with each call
//! - [`request`]: outbound request description
//! - [`response`]: response envelope and pagination cursors

pub mod auth;
pub mod request;
pub mod response;
pub mod session;

pub use auth::AuthContext;
pub use request::{ApiRequest, HttpMethod, RequestOptions};
pub use response::{ApiObject, ApiResponse, Pagination};
pub use session::{ClientKeyPair, DeviceId, Installation, Session, UserType};
