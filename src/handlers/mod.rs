//! HTTP request handlers
//!
//! - `api` - Health check and pipeline statistics
//! - `emotions` - Emotion profile listing
//! - `speak` - Text-to-emotional-speech endpoint

pub mod api;
pub mod emotions;
pub mod speak;
