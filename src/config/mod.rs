//! Configuration module for the speech server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//!
//! # Example
//! ```rust,no_run
//! use emotive_speech::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::emotion::EmotionRegistry;
use crate::core::pipeline::PipelineConfig;
use crate::core::synthesis::{BoxedSynthesizer, SynthesisBackend, create_synthesis_client};
use crate::errors::{SpeechError, SpeechResult};

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    // Synthesis backend
    pub backend: SynthesisBackend,
    pub synthesis_base_url: Option<String>,
    pub synthesis_timeout_ms: u64,
    pub synthesis_concurrency: usize,
    pub max_segment_chars: usize,
    pub default_language: String,

    // Local quota on backend calls
    pub quota_limit: u32,
    pub quota_window_seconds: u64,

    // Audio cache
    pub cache_max_entries: u64,
    pub cache_max_bytes: u64,
    pub cache_stale_after_seconds: Option<u64>,

    /// YAML file with profiles replacing or extending the built-in set
    pub emotion_profiles_path: Option<PathBuf>,

    // Security
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            backend: SynthesisBackend::default(),
            synthesis_base_url: None,
            synthesis_timeout_ms: pipeline.segment_timeout.as_millis() as u64,
            synthesis_concurrency: pipeline.synthesis_concurrency,
            max_segment_chars: pipeline.max_segment_chars,
            default_language: pipeline.default_language,
            quota_limit: pipeline.quota_limit,
            quota_window_seconds: pipeline.quota_window.as_secs(),
            cache_max_entries: pipeline.cache_max_entries,
            cache_max_bytes: pipeline.cache_max_bytes,
            cache_stale_after_seconds: None,
            emotion_profiles_path: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// The `.env` file is loaded in `main.rs` before this runs, so actual
    /// environment variables take precedence over `.env` values.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::from_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = YamlConfig::from_file(path)?;
        let mut config = env::from_env_vars()?;
        config.apply_yaml(yaml_config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) -> Result<(), String> {
        if let Some(server) = yaml.server {
            if let Some(host) = server.host {
                self.host = host;
            }
            if let Some(port) = server.port {
                self.port = port;
            }
        }

        if let Some(synthesis) = yaml.synthesis {
            if let Some(backend) = synthesis.backend {
                self.backend = env::parse_backend(&backend)?;
            }
            if synthesis.base_url.is_some() {
                self.synthesis_base_url = synthesis.base_url;
            }
            if let Some(timeout) = synthesis.timeout_ms {
                self.synthesis_timeout_ms = timeout;
            }
            if let Some(concurrency) = synthesis.concurrency {
                self.synthesis_concurrency = concurrency;
            }
            if let Some(max_chars) = synthesis.max_segment_chars {
                self.max_segment_chars = max_chars;
            }
            if let Some(language) = synthesis.default_language {
                self.default_language = language;
            }
        }

        if let Some(quota) = yaml.quota {
            if let Some(limit) = quota.limit {
                self.quota_limit = limit;
            }
            if let Some(window) = quota.window_seconds {
                self.quota_window_seconds = window;
            }
        }

        if let Some(cache) = yaml.cache {
            if let Some(entries) = cache.max_entries {
                self.cache_max_entries = entries;
            }
            if let Some(bytes) = cache.max_bytes {
                self.cache_max_bytes = bytes;
            }
            if cache.stale_after_seconds.is_some() {
                self.cache_stale_after_seconds = cache.stale_after_seconds;
            }
        }

        if let Some(path) = yaml.emotions.and_then(|e| e.profiles_path) {
            self.emotion_profiles_path = Some(PathBuf::from(path));
        }

        if let Some(security) = yaml.security {
            if security.cors_allowed_origins.is_some() {
                self.cors_allowed_origins = security.cors_allowed_origins;
            }
            if let Some(rps) = security.rate_limit_requests_per_second {
                self.rate_limit_requests_per_second = rps;
            }
            if let Some(burst) = security.rate_limit_burst_size {
                self.rate_limit_burst_size = burst;
            }
        }

        Ok(())
    }

    /// Checks limits and budgets.
    pub fn validate(&self) -> SpeechResult<()> {
        if self.synthesis_timeout_ms == 0 {
            return Err(SpeechError::InvalidConfiguration(
                "SYNTHESIS_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit_requests_per_second == 0 || self.rate_limit_burst_size == 0 {
            return Err(SpeechError::InvalidConfiguration(
                "HTTP rate limit values must be greater than zero".to_string(),
            ));
        }
        self.pipeline_config().validate()
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pipeline limits derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_segment_chars: self.max_segment_chars,
            segment_timeout: Duration::from_millis(self.synthesis_timeout_ms),
            synthesis_concurrency: self.synthesis_concurrency,
            quota_limit: self.quota_limit,
            quota_window: Duration::from_secs(self.quota_window_seconds),
            cache_max_entries: self.cache_max_entries,
            cache_max_bytes: self.cache_max_bytes,
            stale_after: self.cache_stale_after_seconds.map(Duration::from_secs),
            default_language: self.default_language.clone(),
        }
    }

    /// Built-in profiles, with the configured profile file applied on top.
    pub fn emotion_registry(&self) -> SpeechResult<EmotionRegistry> {
        match &self.emotion_profiles_path {
            Some(path) => EmotionRegistry::from_yaml_file(path),
            None => EmotionRegistry::new(crate::core::emotion::builtin_profiles()),
        }
    }

    /// The configured synthesis backend.
    pub fn synthesis_client(&self) -> SpeechResult<BoxedSynthesizer> {
        create_synthesis_client(
            self.backend,
            self.synthesis_base_url.as_deref(),
            Duration::from_millis(self.synthesis_timeout_ms),
        )
    }
}
