//! Google Translate speech backend.
//!
//! Speaks the public `translate_tts` endpoint, which returns MP3 for inputs
//! of at most 100 characters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

use super::SynthesisClient;
use super::languages::normalize_language;
use crate::errors::{SpeechError, SpeechResult};

/// Public endpoint.
pub const GOOGLE_TRANSLATE_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest input the endpoint accepts.
pub const GOOGLE_MAX_SEGMENT_CHARS: usize = 100;

const NORMAL_SPEED: &str = "1";
const SLOW_SPEED: &str = "0.3";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; emotive-speech)";

/// HTTP client for the Google Translate speech endpoint.
pub struct GoogleTranslateSynthesizer {
    client: reqwest::Client,
    base_url: Url,
    request_counter: AtomicU64,
}

impl GoogleTranslateSynthesizer {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> SpeechResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            SpeechError::InvalidConfiguration(format!("Invalid synthesis URL '{base_url}': {e}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SpeechError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            request_counter: AtomicU64::new(0),
        })
    }

    fn build_url(&self, text: &str, language: &str, slow: bool) -> Url {
        let mut url = self.base_url.clone();
        let textlen = text.chars().count().to_string();
        url.query_pairs_mut()
            .append_pair("ie", "UTF-8")
            .append_pair("client", "tw-ob")
            .append_pair("tl", language)
            .append_pair("q", text)
            .append_pair("total", "1")
            .append_pair("idx", "0")
            .append_pair("textlen", &textlen)
            .append_pair("ttsspeed", if slow { SLOW_SPEED } else { NORMAL_SPEED });
        url
    }

    /// Number of requests issued so far.
    pub fn request_count(&self) -> u64 {
        self.request_counter.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SynthesisClient for GoogleTranslateSynthesizer {
    async fn synthesize(&self, text: &str, language: &str, slow: bool) -> SpeechResult<Bytes> {
        let language = self.normalize_language(language)?;
        let chars = text.chars().count();
        if chars > GOOGLE_MAX_SEGMENT_CHARS {
            return Err(SpeechError::InvalidConfiguration(format!(
                "Segment of {chars} characters exceeds the backend limit of {GOOGLE_MAX_SEGMENT_CHARS}"
            )));
        }

        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(request_id, chars, language = %language, slow, "Requesting Google Translate speech");

        let response = self
            .client
            .get(self.build_url(text, &language, slow))
            .send()
            .await
            .map_err(|e| {
                warn!(request_id, error = %e, "Google Translate speech request failed");
                if e.is_timeout() {
                    SpeechError::NetworkError(format!("Request timed out: {e}"))
                } else {
                    SpeechError::NetworkError(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(request_id, status = %status, "Google Translate speech returned error");

            return Err(match status.as_u16() {
                429 => SpeechError::QuotaExceededUpstream(format!(
                    "Google Translate throttled the request ({status})"
                )),
                400 | 404 => SpeechError::UnsupportedLanguage(language),
                _ => SpeechError::NetworkError(format!("Speech endpoint error ({status}): {body}")),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::NetworkError(format!("Failed to read audio: {e}")))?;

        debug!(request_id, audio_bytes = audio.len(), "Received synthesized audio");
        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "google"
    }

    fn max_segment_chars(&self) -> Option<usize> {
        Some(GOOGLE_MAX_SEGMENT_CHARS)
    }

    fn normalize_language(&self, code: &str) -> SpeechResult<String> {
        normalize_language(code)
            .map(str::to_string)
            .ok_or_else(|| SpeechError::UnsupportedLanguage(code.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer() -> GoogleTranslateSynthesizer {
        GoogleTranslateSynthesizer::new(GOOGLE_TRANSLATE_TTS_URL, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_url_parameters() {
        let url = synthesizer().build_url("Hello world", "en", false);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("q".to_string(), "Hello world".to_string())));
        assert!(pairs.contains(&("tl".to_string(), "en".to_string())));
        assert!(pairs.contains(&("textlen".to_string(), "11".to_string())));
        assert!(pairs.contains(&("ttsspeed".to_string(), NORMAL_SPEED.to_string())));
    }

    #[test]
    fn test_slow_hint_changes_speed() {
        let url = synthesizer().build_url("Hi", "en", true);
        assert!(
            url.query_pairs()
                .any(|(k, v)| k == "ttsspeed" && v == SLOW_SPEED)
        );
    }

    #[test]
    fn test_normalize_language() {
        let s = synthesizer();
        assert_eq!(s.normalize_language("EN_us").unwrap(), "en");
        assert_eq!(
            s.normalize_language("klingon"),
            Err(SpeechError::UnsupportedLanguage("klingon".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unsupported_language_rejected_before_request() {
        let s = synthesizer();
        let result = s.synthesize("Hello", "xx", false).await;
        assert_eq!(result, Err(SpeechError::UnsupportedLanguage("xx".to_string())));
        assert_eq!(s.request_count(), 0);
    }

    #[tokio::test]
    async fn test_overlong_segment_rejected() {
        let s = synthesizer();
        let text = "a".repeat(GOOGLE_MAX_SEGMENT_CHARS + 1);
        assert!(matches!(
            s.synthesize(&text, "en", false).await,
            Err(SpeechError::InvalidConfiguration(_))
        ));
    }
}
