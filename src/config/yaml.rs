use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional so a file may set only what it needs. Values
/// present here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// synthesis:
///   backend: "google"
///   base_url: "https://translate.google.com/translate_tts"
///   timeout_ms: 10000
///   concurrency: 2
///   max_segment_chars: 500
///   default_language: "en"
///
/// quota:
///   limit: 100
///   window_seconds: 3600
///
/// cache:
///   max_entries: 256
///   max_bytes: 67108864
///   stale_after_seconds: 86400
///
/// emotions:
///   profiles_path: "/etc/emotive-speech/profiles.yaml"
///
/// security:
///   cors_allowed_origins: "https://example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub synthesis: Option<SynthesisYaml>,
    pub quota: Option<QuotaYaml>,
    pub cache: Option<CacheYaml>,
    pub emotions: Option<EmotionsYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Synthesis backend configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisYaml {
    /// Backend name: "google" or "tone"
    pub backend: Option<String>,
    /// Endpoint override for network backends
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub max_segment_chars: Option<usize>,
    pub default_language: Option<String>,
}

/// Local synthesis quota from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QuotaYaml {
    pub limit: Option<u32>,
    pub window_seconds: Option<u64>,
}

/// Audio cache budgets from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheYaml {
    pub max_entries: Option<u64>,
    pub max_bytes: Option<u64>,
    pub stale_after_seconds: Option<u64>,
}

/// Emotion profile overrides from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EmotionsYaml {
    /// YAML file with profiles that replace or extend the built-in set
    pub profiles_path: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: Option<u32>,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080

synthesis:
  backend: "tone"
  timeout_ms: 2500
  concurrency: 4
  max_segment_chars: 200
  default_language: "fr"

quota:
  limit: 10
  window_seconds: 60

cache:
  max_entries: 32
  max_bytes: 1048576
  stale_after_seconds: 600

emotions:
  profiles_path: "/tmp/profiles.yaml"

security:
  cors_allowed_origins: "*"
  rate_limit_requests_per_second: 5
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host, Some("127.0.0.1".to_string()));
        assert_eq!(server.port, Some(8080));

        let synthesis = config.synthesis.as_ref().unwrap();
        assert_eq!(synthesis.backend, Some("tone".to_string()));
        assert_eq!(synthesis.timeout_ms, Some(2500));
        assert_eq!(synthesis.concurrency, Some(4));
        assert_eq!(synthesis.default_language, Some("fr".to_string()));

        assert_eq!(config.quota.as_ref().unwrap().limit, Some(10));
        assert_eq!(config.cache.as_ref().unwrap().stale_after_seconds, Some(600));
        assert_eq!(
            config.emotions.as_ref().unwrap().profiles_path,
            Some("/tmp/profiles.yaml".to_string())
        );
        let security = config.security.as_ref().unwrap();
        assert_eq!(security.rate_limit_requests_per_second, Some(5));
        assert!(security.rate_limit_burst_size.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.quota.is_none());
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "quota:\n  limit: 7\n").unwrap();

        let config = YamlConfig::from_file(&config_path).unwrap();
        assert_eq!(config.quota.unwrap().limit, Some(7));
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");
        fs::write(&config_path, "invalid: yaml: content:").unwrap();

        let result = YamlConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
