use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::pipeline::PipelineService;
use crate::errors::SpeechResult;

/// Shared application state handed to every handler.
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: Arc<PipelineService>,
}

impl AppState {
    /// Builds the registry, backend and pipeline described by `config`.
    pub fn new(config: ServerConfig) -> SpeechResult<Arc<Self>> {
        let registry = Arc::new(config.emotion_registry()?);
        let client = config.synthesis_client()?;
        let pipeline = Arc::new(PipelineService::new(
            config.pipeline_config(),
            registry,
            client,
        )?);
        Ok(Arc::new(Self { config, pipeline }))
    }

    /// State around an already constructed pipeline.
    pub fn with_pipeline(config: ServerConfig, pipeline: Arc<PipelineService>) -> Arc<Self> {
        Arc::new(Self { config, pipeline })
    }
}
