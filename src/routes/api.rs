use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, emotions, speak};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/emotions", get(emotions::list_emotions))
        .route("/speak", post(speak::speak_handler))
        .route("/stats", get(api::pipeline_stats))
        .layer(TraceLayer::new_for_http())
}

/// API routes plus the public health check, with state attached.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::health_check))
        .merge(create_api_router())
        .with_state(state)
}
