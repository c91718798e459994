//! HTTP plumbing: the reqwest wrapper and the bunq transport built on it

pub mod client;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use transport::HttpTransport;
