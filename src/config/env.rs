use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::ServerConfig;
use crate::core::synthesis::SynthesisBackend;

/// Reads an environment variable, treating empty values as unset.
pub(super) fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an environment variable, failing on malformed values.
pub(super) fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, String> {
    match env_string(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid value for {name}: '{raw}'")),
        None => Ok(None),
    }
}

pub(super) fn parse_backend(name: &str) -> Result<SynthesisBackend, String> {
    SynthesisBackend::from_str(name)
        .ok_or_else(|| format!("Unknown synthesis backend '{name}' (expected 'google' or 'tone')"))
}

/// Builds a configuration from environment variables on top of defaults.
pub(super) fn from_env_vars() -> Result<ServerConfig, String> {
    let defaults = ServerConfig::default();

    let backend = match env_string("SYNTHESIS_BACKEND") {
        Some(name) => parse_backend(&name)?,
        None => defaults.backend,
    };

    Ok(ServerConfig {
        host: env_string("HOST").unwrap_or(defaults.host),
        port: env_parse("PORT")?.unwrap_or(defaults.port),
        backend,
        synthesis_base_url: env_string("SYNTHESIS_BASE_URL"),
        synthesis_timeout_ms: env_parse("SYNTHESIS_TIMEOUT_MS")?
            .unwrap_or(defaults.synthesis_timeout_ms),
        synthesis_concurrency: env_parse("SYNTHESIS_CONCURRENCY")?
            .unwrap_or(defaults.synthesis_concurrency),
        max_segment_chars: env_parse("MAX_SEGMENT_CHARS")?.unwrap_or(defaults.max_segment_chars),
        default_language: env_string("DEFAULT_LANGUAGE").unwrap_or(defaults.default_language),
        quota_limit: env_parse("QUOTA_LIMIT")?.unwrap_or(defaults.quota_limit),
        quota_window_seconds: env_parse("QUOTA_WINDOW_SECONDS")?
            .unwrap_or(defaults.quota_window_seconds),
        cache_max_entries: env_parse("CACHE_MAX_ENTRIES")?.unwrap_or(defaults.cache_max_entries),
        cache_max_bytes: env_parse("CACHE_MAX_BYTES")?.unwrap_or(defaults.cache_max_bytes),
        cache_stale_after_seconds: env_parse("CACHE_STALE_AFTER_SECONDS")?,
        emotion_profiles_path: env_string("EMOTION_PROFILES_PATH").map(PathBuf::from),
        rate_limit_requests_per_second: env_parse("RATE_LIMIT_REQUESTS_PER_SECOND")?
            .unwrap_or(defaults.rate_limit_requests_per_second),
        rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE")?
            .unwrap_or(defaults.rate_limit_burst_size),
        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
    })
}
