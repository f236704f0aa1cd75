//! Speech-synthesis backends.
//!
//! The pipeline talks to a backend only through [`SynthesisClient`]: text and
//! a language code in, encoded audio bytes out. Any transport detail is
//! mapped into [`SpeechError`] before it crosses this boundary.
//!
//! # Supported Backends
//!
//! | Backend | Output | Max chars | Network |
//! |---------|--------|-----------|---------|
//! | `google` | MP3 | 100 | Yes |
//! | `tone` | WAV (16-bit mono) | unlimited | No |

mod google;
pub mod languages;
mod tone;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use google::{GOOGLE_MAX_SEGMENT_CHARS, GOOGLE_TRANSLATE_TTS_URL, GoogleTranslateSynthesizer};
pub use tone::{ToneConfig, ToneSynthesizer};

use crate::errors::{SpeechError, SpeechResult};

/// Narrow interface to an external speech-synthesis capability.
#[async_trait]
pub trait SynthesisClient: Send + Sync {
    /// Synthesizes one segment into encoded audio.
    ///
    /// # Errors
    ///
    /// `NetworkError`, `QuotaExceededUpstream` or `UnsupportedLanguage`.
    async fn synthesize(&self, text: &str, language: &str, slow: bool) -> SpeechResult<Bytes>;

    /// Backend name used in logs.
    fn name(&self) -> &'static str;

    /// Longest segment the backend accepts, in characters.
    fn max_segment_chars(&self) -> Option<usize> {
        None
    }

    /// Canonical form of `code`, or `UnsupportedLanguage`.
    ///
    /// The default accepts any non-empty code and lowercases it.
    fn normalize_language(&self, code: &str) -> SpeechResult<String> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SpeechError::UnsupportedLanguage(code.to_string()));
        }
        Ok(code.to_lowercase().replace('_', "-"))
    }
}

/// Shared handle to a backend.
pub type BoxedSynthesizer = Arc<dyn SynthesisClient>;

/// Selectable backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisBackend {
    /// Google Translate speech endpoint
    #[default]
    Google,
    /// Offline deterministic tone generator
    Tone,
}

impl SynthesisBackend {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SynthesisBackend::Google => "google",
            SynthesisBackend::Tone => "tone",
        }
    }

    /// Parses a backend name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" | "gtts" | "google-translate" => Some(SynthesisBackend::Google),
            "tone" | "offline" => Some(SynthesisBackend::Tone),
            _ => None,
        }
    }
}

impl fmt::Display for SynthesisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Factory function to create a synthesis backend.
///
/// `base_url` is only used by network backends; `None` selects the
/// backend's public endpoint.
pub fn create_synthesis_client(
    backend: SynthesisBackend,
    base_url: Option<&str>,
    timeout: Duration,
) -> SpeechResult<BoxedSynthesizer> {
    match backend {
        SynthesisBackend::Google => Ok(Arc::new(GoogleTranslateSynthesizer::new(
            base_url.unwrap_or(GOOGLE_TRANSLATE_TTS_URL),
            timeout,
        )?)),
        SynthesisBackend::Tone => Ok(Arc::new(ToneSynthesizer::default())),
    }
}
