use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::core::audio::OutputFormat;
use crate::core::emotion::{EffectOverrides, EmotionId};
use crate::core::pipeline::EffectParams;
use crate::errors::{AppError, AppResult, SpeechError};
use crate::state::AppState;

pub const CACHE_STATUS_HEADER: &str = "x-cache-status";
pub const CACHE_KEY_HEADER: &str = "x-cache-key";
pub const SEGMENT_COUNT_HEADER: &str = "x-segment-count";

/// Body of `POST /speak`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    /// Language code; the configured default when absent
    #[serde(default)]
    pub language: Option<String>,
    /// Emotion name (case-insensitive, aliases accepted)
    #[serde(default)]
    pub emotion: Option<String>,
    /// "wav" (default) or "pcm16"
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub overrides: Option<EffectOverrides>,
    /// Accept an older rendering when the quota is exhausted (default true)
    #[serde(default)]
    pub allow_stale: Option<bool>,
}

impl SpeakRequest {
    fn emotion(&self) -> Result<EmotionId, SpeechError> {
        match self.emotion.as_deref() {
            None => Ok(EmotionId::default()),
            Some(name) => EmotionId::from_str(name)
                .ok_or_else(|| SpeechError::UnknownEmotion(name.to_string())),
        }
    }

    fn params(&self) -> AppResult<EffectParams> {
        let format = match self.format.as_deref() {
            None => OutputFormat::default(),
            Some(name) => OutputFormat::from_str(name).ok_or_else(|| {
                AppError::BadRequest(format!("Unsupported output format '{name}'"))
            })?,
        };
        Ok(EffectParams {
            format,
            overrides: self.overrides.unwrap_or_default(),
            allow_stale: self.allow_stale.unwrap_or(true),
        })
    }
}

/// Render text as emotion-shaped speech
///
/// Returns the encoded audio with the cache outcome in `X-Cache-Status`.
pub async fn speak_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeakRequest>,
) -> AppResult<Response> {
    let emotion = request.emotion()?;
    let params = request.params()?;
    let language = request.language.as_deref().unwrap_or("");

    let resolution = state
        .pipeline
        .resolve(&request.text, language, emotion, &params)
        .await?;

    info!(
        emotion = %emotion,
        status = %resolution.status,
        key = %resolution.key,
        bytes = resolution.audio.len(),
        "Speak request served"
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(resolution.format.mime_type()),
    );
    if let Ok(disposition) = HeaderValue::from_str(&format!(
        "attachment; filename=\"speech.{}\"",
        resolution.format.extension()
    )) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    headers.insert(
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static(resolution.status.as_str()),
    );
    if let Ok(key) = HeaderValue::from_str(&resolution.key.to_string()) {
        headers.insert(HeaderName::from_static(CACHE_KEY_HEADER), key);
    }
    headers.insert(
        HeaderName::from_static(SEGMENT_COUNT_HEADER),
        HeaderValue::from(resolution.segments),
    );

    Ok((StatusCode::OK, headers, resolution.audio).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> SpeakRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = request(r#"{"text": "Hello"}"#);
        assert_eq!(req.emotion().unwrap(), EmotionId::Neutral);
        let params = req.params().unwrap();
        assert_eq!(params.format, OutputFormat::Wav);
        assert!(params.allow_stale);
        assert!(params.overrides.is_empty());
    }

    #[test]
    fn test_unknown_emotion_and_format() {
        let req = request(r#"{"text": "Hi", "emotion": "grumpy", "format": "flac"}"#);
        assert!(matches!(req.emotion(), Err(SpeechError::UnknownEmotion(name)) if name == "grumpy"));
        assert!(matches!(req.params(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_overrides_parsed() {
        let req = request(
            r#"{"text": "Hi", "emotion": "Sad", "format": "pcm16",
                "overrides": {"gain_delta_db": 2.5}, "allow_stale": false}"#,
        );
        assert_eq!(req.emotion().unwrap(), EmotionId::Sad);
        let params = req.params().unwrap();
        assert_eq!(params.format, OutputFormat::Pcm16);
        assert_eq!(params.overrides.gain_delta_db, Some(2.5));
        assert!(!params.allow_stale);
    }
}
