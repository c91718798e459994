//! Configuration loader
//!
//! Loads a [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `BUNQ_API_KEY` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `BUNQ_API_KEY`: API key (required)
//! - `BUNQ_SANDBOX`: Use the sandbox host (true/false)
//! - `BUNQ_PERSIST_SESSION`: Reuse a stored session across restarts
//! - `BUNQ_DEVICE_DESCRIPTION`: Description sent at device registration
//! - `BUNQ_API_VERSION`: Route prefix, `v1` by default
//! - `BUNQ_BASE_URL`: Replaces the computed base URL
//! - `BUNQ_STORE_PATH`: Keep handshake artifacts in this JSON file
//! - `BUNQ_REAUTH_ON_FORBIDDEN`: Treat 403 like 401 (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./bunq.json` or `./bunq.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use bunq_domain::{BunqError, BunqResult, ClientConfig, ReauthPolicy, StoreConfig};

const CONFIG_FILE_NAMES: [&str; 4] = ["bunq.json", "bunq.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the API key is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `BunqError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration does not validate
pub fn load() -> BunqResult<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `BUNQ_API_KEY` is required; every other variable falls back to the
/// [`ClientConfig`] default.
///
/// # Errors
/// Returns `BunqError::Config` if the API key is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> BunqResult<ClientConfig> {
    let mut config = ClientConfig::new(env_var("BUNQ_API_KEY")?);

    config.sandbox = env_bool("BUNQ_SANDBOX", config.sandbox)?;
    config.persist_session = env_bool("BUNQ_PERSIST_SESSION", config.persist_session)?;
    if let Some(description) = env_opt("BUNQ_DEVICE_DESCRIPTION") {
        config.device_description = description;
    }
    if let Some(version) = env_opt("BUNQ_API_VERSION") {
        config.api_version = version;
    }
    config.base_url = env_opt("BUNQ_BASE_URL");
    if let Some(path) = env_opt("BUNQ_STORE_PATH") {
        config.store = StoreConfig::File { path: PathBuf::from(path) };
    }
    if env_bool("BUNQ_REAUTH_ON_FORBIDDEN", false)? {
        config.reauth_policy = ReauthPolicy::UnauthorizedOrForbidden;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `BunqError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The configuration does not validate
pub fn load_from_file(path: Option<PathBuf>) -> BunqResult<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BunqError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BunqError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BunqError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> BunqResult<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BunqError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BunqError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BunqError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// Searches the current working directory first, then the directory of
/// the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    probe_dirs(&dirs)
}

fn probe_dirs(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Get required environment variable
///
/// # Errors
/// Returns `BunqError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> BunqResult<String> {
    env_opt(key)
        .ok_or_else(|| BunqError::Config(format!("Missing required environment variable: {key}")))
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Errors
/// Returns `BunqError::Config` for any other value.
fn env_bool(key: &str, default: bool) -> BunqResult<bool> {
    let Some(raw) = env_opt(key) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(BunqError::Config(format!("Invalid boolean for {key}: {other}"))),
    }
}
