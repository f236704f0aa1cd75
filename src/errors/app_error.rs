use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::speech_error::SpeechError;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Speech(e) => match e {
                SpeechError::UnknownEmotion(_)
                | SpeechError::EmptyInput
                | SpeechError::TooManySegments { .. } => StatusCode::BAD_REQUEST,
                SpeechError::UnsupportedLanguage(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SpeechError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                SpeechError::DecodeError(_) => StatusCode::BAD_GATEWAY,
                SpeechError::NetworkError(_) | SpeechError::QuotaExceededUpstream(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                SpeechError::EncodeError(_) | SpeechError::InvalidConfiguration(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Speech(e) => e.code(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        if let AppError::Speech(ref e) = self {
            body["retryable"] = json!(e.is_retryable());
            if let Some(cache_status) = e.cache_status() {
                body["cache_status"] = json!(cache_status.as_str());
            }
            if let SpeechError::RateLimited {
                stale_available, ..
            } = e
            {
                body["stale_available"] = json!(stale_available);
            }
        }

        let mut response = (status, Json(body)).into_response();
        if let AppError::Speech(SpeechError::RateLimited { retry_after, .. }) = &self {
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SpeechError::EmptyInput, StatusCode::BAD_REQUEST),
            (SpeechError::UnknownEmotion("x".into()), StatusCode::BAD_REQUEST),
            (
                SpeechError::UnsupportedLanguage("xx".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (SpeechError::DecodeError("bad".into()), StatusCode::BAD_GATEWAY),
            (
                SpeechError::NetworkError("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                SpeechError::QuotaExceededUpstream("429".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::from(SpeechError::RateLimited {
            retry_after: Duration::from_secs(90),
            stale_available: false,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "90");
    }
}
