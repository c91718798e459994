//! Conversions from external infrastructure errors into domain errors.

use base64::DecodeError as Base64Error;
use bunq_domain::BunqError;
use reqwest::Error as HttpError;
use rsa::Error as RsaError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BunqError);

impl From<InfraError> for BunqError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BunqError> for InfraError {
    fn from(value: BunqError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoBunqError {
    fn into_bunq(self) -> BunqError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BunqError */
/* -------------------------------------------------------------------------- */

impl IntoBunqError for HttpError {
    fn into_bunq(self) -> BunqError {
        if self.is_timeout() {
            return BunqError::Transport("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return BunqError::Transport(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return BunqError::status(code, status.canonical_reason().unwrap_or("unknown status"));
        }

        if self.is_builder() {
            return BunqError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() || self.is_body() {
            return BunqError::InvalidResponse(self.to_string());
        }

        BunqError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_bunq())
    }
}

/* -------------------------------------------------------------------------- */
/* rsa / base64 / url → BunqError */
/* -------------------------------------------------------------------------- */

impl IntoBunqError for RsaError {
    fn into_bunq(self) -> BunqError {
        BunqError::Crypto(self.to_string())
    }
}

impl From<RsaError> for InfraError {
    fn from(value: RsaError) -> Self {
        Self(value.into_bunq())
    }
}

impl IntoBunqError for Base64Error {
    fn into_bunq(self) -> BunqError {
        BunqError::InvalidResponse(format!("signature is not valid base64: {self}"))
    }
}

impl From<Base64Error> for InfraError {
    fn from(value: Base64Error) -> Self {
        Self(value.into_bunq())
    }
}

impl IntoBunqError for UrlError {
    fn into_bunq(self) -> BunqError {
        BunqError::Config(format!("invalid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        Self(value.into_bunq())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
