//! Error taxonomy shared by every stage of the speech pipeline.
//!
//! Input errors (`UnknownEmotion`, `EmptyInput`, `UnsupportedLanguage`,
//! `TooManySegments`) are rejected before any backend call. Backend errors
//! (`NetworkError`, `QuotaExceededUpstream`) abort the whole assembly and are
//! retryable. `DecodeError` is a hard failure: the same bytes will fail again.

use std::time::Duration;

use thiserror::Error;

use crate::core::cache::CacheStatus;

/// Errors produced while turning text into emotion-shaped audio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// The emotion identifier is not registered
    #[error("Unknown emotion: {0}")]
    UnknownEmotion(String),

    /// The text is empty after rules and trimming
    #[error("Input text is empty")]
    EmptyInput,

    /// The backend cannot speak the requested language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The backend was unreachable or a segment call timed out
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The backend reported throttling
    #[error("Upstream quota exceeded: {0}")]
    QuotaExceededUpstream(String),

    /// A segment's bytes are not decodable audio
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The assembled track could not be written to the output container
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// The local quota window is exhausted
    #[error("Rate limited: retry after {}s (stale data available: {stale_available})", .retry_after.as_secs())]
    RateLimited {
        /// Time until the current quota window resets
        retry_after: Duration,
        /// Whether an older rendering of the same key exists
        stale_available: bool,
    },

    /// The request needs more synthesis calls than a whole quota window allows
    #[error("Request needs {segments} synthesis calls but the quota allows {quota} per window")]
    TooManySegments { segments: usize, quota: u32 },

    /// Registry, profile or service configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for pipeline operations.
pub type SpeechResult<T> = Result<T, SpeechError>;

impl SpeechError {
    /// Returns whether the same request may succeed if repeated later.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SpeechError::NetworkError(_)
                | SpeechError::QuotaExceededUpstream(_)
                | SpeechError::RateLimited { .. }
        )
    }

    /// Returns whether the error was caused by the caller's input.
    #[inline]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SpeechError::UnknownEmotion(_)
                | SpeechError::EmptyInput
                | SpeechError::UnsupportedLanguage(_)
                | SpeechError::TooManySegments { .. }
        )
    }

    /// Cache status reported alongside this error, if any.
    pub fn cache_status(&self) -> Option<CacheStatus> {
        match self {
            SpeechError::RateLimited { .. } => Some(CacheStatus::RateLimitedNoData),
            _ => None,
        }
    }

    /// Short machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SpeechError::UnknownEmotion(_) => "unknown_emotion",
            SpeechError::EmptyInput => "empty_input",
            SpeechError::UnsupportedLanguage(_) => "unsupported_language",
            SpeechError::NetworkError(_) => "network_error",
            SpeechError::QuotaExceededUpstream(_) => "quota_exceeded_upstream",
            SpeechError::DecodeError(_) => "decode_error",
            SpeechError::EncodeError(_) => "encode_error",
            SpeechError::RateLimited { .. } => "rate_limited",
            SpeechError::TooManySegments { .. } => "too_many_segments",
            SpeechError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SpeechError::NetworkError("timeout".into()).is_retryable());
        assert!(SpeechError::QuotaExceededUpstream("429".into()).is_retryable());
        assert!(
            SpeechError::RateLimited {
                retry_after: Duration::from_secs(10),
                stale_available: false,
            }
            .is_retryable()
        );
        assert!(!SpeechError::DecodeError("garbage".into()).is_retryable());
        assert!(!SpeechError::EmptyInput.is_retryable());
        assert!(!SpeechError::UnknownEmotion("bored".into()).is_retryable());
    }

    #[test]
    fn test_input_errors() {
        assert!(SpeechError::EmptyInput.is_input_error());
        assert!(SpeechError::UnknownEmotion("x".into()).is_input_error());
        assert!(!SpeechError::NetworkError("x".into()).is_input_error());
    }

    #[test]
    fn test_rate_limited_maps_to_no_data_status() {
        let err = SpeechError::RateLimited {
            retry_after: Duration::from_secs(5),
            stale_available: false,
        };
        assert_eq!(err.cache_status(), Some(CacheStatus::RateLimitedNoData));
        assert_eq!(SpeechError::EmptyInput.cache_status(), None);
    }

    #[test]
    fn test_error_display() {
        let err = SpeechError::RateLimited {
            retry_after: Duration::from_secs(42),
            stale_available: true,
        };
        assert_eq!(
            err.to_string(),
            "Rate limited: retry after 42s (stale data available: true)"
        );
        assert_eq!(
            SpeechError::UnknownEmotion("grumpy".into()).to_string(),
            "Unknown emotion: grumpy"
        );
    }
}
