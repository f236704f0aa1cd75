//! Emotion-shaped text-to-speech with a content-addressed cache and a local
//! quota on backend synthesis calls.

pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use crate::core::*;
pub use errors::{AppError, AppResult, SpeechError, SpeechResult};
pub use state::AppState;
