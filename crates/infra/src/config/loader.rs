//! Configuration loader
//!
//! Loads service configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SELLERSYNC_API_TOKENS`: comma-separated account tokens (required)
//! - `SELLERSYNC_BASE_URL_STATISTICS` / `_CATALOG` / `_ANALYTICS`:
//!   marketplace base URL overrides
//! - `SELLERSYNC_PAGE_SIZE`: page size for offset/limit endpoints
//! - `SELLERSYNC_HTTP_TIMEOUT_SECS`: per-request timeout
//! - `SELLERSYNC_MAX_ATTEMPTS`: retry budget per request
//! - `SELLERSYNC_BASE_DELAY_MS`: backoff base delay
//! - `SELLERSYNC_RATE_LIMIT_COOLDOWN_SECS`: 429 cool-down
//! - `SELLERSYNC_PAGE_DELAY_MS`: inter-page pacing delay
//! - `SELLERSYNC_CREDENTIAL_DELAY_MS`: inter-credential pacing delay
//! - `SELLERSYNC_POLL_INTERVAL_SECS`: scheduler tick interval
//! - `SELLERSYNC_SCHEDULER_ENABLED`: whether the scheduler runs
//! - `SELLERSYNC_TOPIC_PREFIX`: sink topic prefix
//! - `SELLERSYNC_SINK_PATH`: sink output file (stdout when unset)
//! - `SELLERSYNC_BIND_ADDR`: REST server bind address

use std::path::{Path, PathBuf};

use sellersync_domain::{Config, Result, SellersyncError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SellersyncError::Config` if configuration cannot be loaded
/// from either source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `SELLERSYNC_API_TOKENS` is required; every other variable falls back
/// to its default.
///
/// # Errors
/// Returns `SellersyncError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let tokens = split_and_trim(&env_var("SELLERSYNC_API_TOKENS")?);
    if tokens.iter().all(|t| t.is_empty()) {
        return Err(SellersyncError::Config(
            "SELLERSYNC_API_TOKENS contains no usable tokens".to_string(),
        ));
    }

    let mut config = Config::default();
    config.marketplace.tokens = tokens;

    if let Ok(value) = std::env::var("SELLERSYNC_BASE_URL_STATISTICS") {
        config.marketplace.base_urls.statistics = value;
    }
    if let Ok(value) = std::env::var("SELLERSYNC_BASE_URL_CATALOG") {
        config.marketplace.base_urls.catalog = value;
    }
    if let Ok(value) = std::env::var("SELLERSYNC_BASE_URL_ANALYTICS") {
        config.marketplace.base_urls.analytics = value;
    }

    config.marketplace.page_size =
        env_parse_or("SELLERSYNC_PAGE_SIZE", config.marketplace.page_size)?;
    config.marketplace.request_timeout_secs =
        env_parse_or("SELLERSYNC_HTTP_TIMEOUT_SECS", config.marketplace.request_timeout_secs)?;

    config.fetch.max_attempts = env_parse_or("SELLERSYNC_MAX_ATTEMPTS", config.fetch.max_attempts)?;
    config.fetch.base_delay_ms =
        env_parse_or("SELLERSYNC_BASE_DELAY_MS", config.fetch.base_delay_ms)?;
    config.fetch.rate_limit_cooldown_secs = env_parse_or(
        "SELLERSYNC_RATE_LIMIT_COOLDOWN_SECS",
        config.fetch.rate_limit_cooldown_secs,
    )?;
    config.fetch.page_delay_ms =
        env_parse_or("SELLERSYNC_PAGE_DELAY_MS", config.fetch.page_delay_ms)?;
    config.fetch.credential_delay_ms =
        env_parse_or("SELLERSYNC_CREDENTIAL_DELAY_MS", config.fetch.credential_delay_ms)?;

    config.scheduler.interval_secs =
        env_parse_or("SELLERSYNC_POLL_INTERVAL_SECS", config.scheduler.interval_secs)?;
    config.scheduler.enabled = env_bool("SELLERSYNC_SCHEDULER_ENABLED", true);

    if let Ok(value) = std::env::var("SELLERSYNC_TOPIC_PREFIX") {
        config.publish.topic_prefix = value;
    }
    config.publish.output_path = std::env::var("SELLERSYNC_SINK_PATH").ok();

    if let Ok(value) = std::env::var("SELLERSYNC_BIND_ADDR") {
        config.server.bind_addr = value;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SellersyncError::Config` if no file is found or the file
/// cannot be parsed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SellersyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SellersyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SellersyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SellersyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SellersyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SellersyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory and up to two parent levels,
/// then relative to the executable location.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("sellersync.json"),
            cwd.join("sellersync.toml"),
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("../sellersync.json"),
            cwd.join("../sellersync.toml"),
            cwd.join("../../sellersync.json"),
            cwd.join("../../sellersync.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("sellersync.json"),
                exe_dir.join("sellersync.toml"),
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SellersyncError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable, falling back to `default`
///
/// # Errors
/// Returns `SellersyncError::Config` when the variable is set but does
/// not parse.
fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| SellersyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive); returns `default` when the variable is not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn split_and_trim(raw: &str) -> Vec<String> {
    raw.split(',').map(|part| part.trim().to_string()).filter(|part| !part.is_empty()).collect()
}
