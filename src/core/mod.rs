pub mod audio;
pub mod cache;
pub mod emotion;
pub mod pipeline;
pub mod synthesis;
pub mod text;

// Re-export commonly used types for convenience
pub use audio::{AudioBuffer, AudioEffectsEngine, OutputFormat};
pub use cache::{AudioCache, CacheEntry, CacheKey, CacheStatus, QuotaUsage, QuotaWindow};
pub use emotion::{EffectOverrides, EmotionId, EmotionProfile, EmotionRegistry, TextRule};
pub use pipeline::{EffectParams, PipelineConfig, PipelineService, PipelineStats, Resolution};
pub use synthesis::{
    BoxedSynthesizer, GoogleTranslateSynthesizer, SynthesisBackend, SynthesisClient,
    ToneSynthesizer, create_synthesis_client,
};
pub use text::{TextEmotionProcessor, TextSegment};
