use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::core::emotion::{ClauseSplit, EmotionId};
use crate::state::AppState;

/// Audio parameters of one registered profile.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionInfo {
    pub id: EmotionId,
    pub tempo_multiplier: f32,
    pub gain_delta_db: f32,
    pub sentence_pause_ms: u32,
    pub clause_pause_ms: u32,
    pub emphasis_pause_ms: u32,
    pub prefer_slow_synthesis: bool,
    pub clause_split: ClauseSplit,
    /// Kinds of the profile's text rules, in order
    pub text_rules: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct EmotionsResponse {
    pub emotions: Vec<EmotionInfo>,
    pub count: usize,
}

/// List registered emotion profiles
pub async fn list_emotions(State(state): State<Arc<AppState>>) -> Json<EmotionsResponse> {
    let emotions: Vec<EmotionInfo> = state
        .pipeline
        .registry()
        .profiles()
        .into_iter()
        .map(|profile| EmotionInfo {
            id: profile.id,
            tempo_multiplier: profile.tempo_multiplier,
            gain_delta_db: profile.gain_delta_db,
            sentence_pause_ms: profile.sentence_pause_ms,
            clause_pause_ms: profile.clause_pause_ms,
            emphasis_pause_ms: profile.emphasis_pause_ms,
            prefer_slow_synthesis: profile.prefer_slow_synthesis,
            clause_split: profile.clause_split,
            text_rules: profile.text_rules.iter().map(|rule| rule.kind()).collect(),
        })
        .collect();

    let count = emotions.len();
    Json(EmotionsResponse { emotions, count })
}
