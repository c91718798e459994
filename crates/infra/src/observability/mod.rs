//! Tracing setup for binaries and tests embedding the client

use bunq_domain::{BunqError, BunqResult};
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,bunq_core=debug";

/// Install a fmt subscriber filtered by `RUST_LOG`, or by `default_filter`
/// when the variable is unset
///
/// Returns `Ok(false)` when a global subscriber was already installed.
///
/// # Errors
/// `BunqError::Config` if `default_filter` is not a valid directive.
pub fn init_tracing(default_filter: &str) -> BunqResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|err| BunqError::Config(format!("invalid log filter: {err}")))?,
    };

    Ok(tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init().is_ok())
}
