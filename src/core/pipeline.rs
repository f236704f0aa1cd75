//! The speech pipeline service: cache, quota, text, synthesis, assembly.
//!
//! ```text
//! resolve(text, language, emotion, params)
//!     │
//!     ├─ key in cache, fresh ──────────────────────────────▶ HIT
//!     ├─ key in cache, stale, quota exhausted ─────────────▶ RATE_LIMITED_SERVED_STALE
//!     └─ otherwise (coalesced per key)
//!           segments = TextEmotionProcessor::process
//!           quota.try_acquire(segments) ──── exhausted ────▶ RateLimited (NO_DATA)
//!           SynthesisClient × N  (ordered, per-call timeout)
//!           AudioEffectsEngine::assemble
//!           cache.insert ──────────────────────────────────▶ MISS
//! ```
//!
//! A [`PipelineService`] owns its cache and quota window. Several services can
//! run side by side (one per tenant, one per test) without sharing state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::audio::{AudioEffectsEngine, OutputFormat};
use crate::core::cache::{
    AudioCache, CacheEntry, CacheKey, CacheStatus, QuotaUsage, QuotaWindow, normalize_text,
};
use crate::core::emotion::{EffectOverrides, EmotionId, EmotionProfile, EmotionRegistry};
use crate::core::synthesis::BoxedSynthesizer;
use crate::core::text::{DEFAULT_MAX_SEGMENT_CHARS, TextEmotionProcessor, TextSegment};
use crate::errors::{SpeechError, SpeechResult};

// =============================================================================
// Configuration
// =============================================================================

/// Limits and budgets of one [`PipelineService`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Longest segment sent to the backend (further capped by the backend)
    pub max_segment_chars: usize,
    /// Upper bound on each segment synthesis call
    pub segment_timeout: Duration,
    /// Segment calls in flight per request (order is always preserved)
    pub synthesis_concurrency: usize,
    /// Synthesis calls allowed per quota window
    pub quota_limit: u32,
    pub quota_window: Duration,
    pub cache_max_entries: u64,
    pub cache_max_bytes: u64,
    /// Age after which a cached rendering is refreshed when quota allows
    pub stale_after: Option<Duration>,
    /// Language used when a request does not name one
    pub default_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_segment_chars: DEFAULT_MAX_SEGMENT_CHARS,
            segment_timeout: Duration::from_secs(10),
            synthesis_concurrency: 1,
            quota_limit: 100,
            quota_window: Duration::from_secs(3600),
            cache_max_entries: 256,
            cache_max_bytes: 64 * 1024 * 1024,
            stale_after: None,
            default_language: "en".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Rejects zero limits and budgets.
    pub fn validate(&self) -> SpeechResult<()> {
        let checks = [
            (self.max_segment_chars == 0, "max_segment_chars must be greater than zero"),
            (self.segment_timeout.is_zero(), "segment_timeout must be greater than zero"),
            (
                self.synthesis_concurrency == 0,
                "synthesis_concurrency must be greater than zero",
            ),
            (self.quota_limit == 0, "quota_limit must be greater than zero"),
            (self.quota_window.is_zero(), "quota_window must be greater than zero"),
            (self.cache_max_entries == 0, "cache_max_entries must be greater than zero"),
            (self.cache_max_bytes == 0, "cache_max_bytes must be greater than zero"),
            (
                self.default_language.trim().is_empty(),
                "default_language must not be empty",
            ),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(SpeechError::InvalidConfiguration(message.to_string())),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Request and Result Types
// =============================================================================

/// Per-request effect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    pub format: OutputFormat,
    pub overrides: EffectOverrides,
    /// Serve an older rendering of the same key when the quota is exhausted
    pub allow_stale: bool,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            overrides: EffectOverrides::default(),
            allow_stale: true,
        }
    }
}

impl EffectParams {
    pub fn with_format(format: OutputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }
}

/// Outcome of [`PipelineService::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub audio: Bytes,
    pub status: CacheStatus,
    pub key: CacheKey,
    pub format: OutputFormat,
    /// Segments the track was assembled from
    pub segments: usize,
}

/// Counters and budgets of a running service.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub backend: &'static str,
    pub cache_entries: u64,
    pub cache_bytes: u64,
    pub cache_max_entries: u64,
    pub cache_max_bytes: u64,
    pub quota: QuotaUsage,
    pub hits: u64,
    pub misses: u64,
    pub served_stale: u64,
    pub rate_limited: u64,
    pub synthesis_calls: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    served_stale: AtomicU64,
    rate_limited: AtomicU64,
    synthesis_calls: AtomicU64,
}

// =============================================================================
// Pipeline Service
// =============================================================================

/// Owns the cache and quota state and runs the full text-to-audio pipeline.
pub struct PipelineService {
    config: PipelineConfig,
    registry: Arc<EmotionRegistry>,
    client: BoxedSynthesizer,
    processor: TextEmotionProcessor,
    engine: AudioEffectsEngine,
    cache: AudioCache,
    quota: QuotaWindow,
    counters: Counters,
    closed: AtomicBool,
}

impl PipelineService {
    /// Creates a service with an empty cache and a fresh quota window.
    ///
    /// The maximum segment length is the smaller of the configured value and
    /// the backend's own input limit.
    pub fn new(
        config: PipelineConfig,
        registry: Arc<EmotionRegistry>,
        client: BoxedSynthesizer,
    ) -> SpeechResult<Self> {
        config.validate()?;

        let max_chars = client
            .max_segment_chars()
            .map_or(config.max_segment_chars, |limit| limit.min(config.max_segment_chars));
        let cache = AudioCache::new(config.cache_max_entries, config.cache_max_bytes)?;
        let quota = QuotaWindow::new(config.quota_limit, config.quota_window);

        info!(
            backend = client.name(),
            max_segment_chars = max_chars,
            quota_limit = config.quota_limit,
            quota_window_secs = config.quota_window.as_secs(),
            cache_max_entries = config.cache_max_entries,
            cache_max_bytes = config.cache_max_bytes,
            "Speech pipeline initialized"
        );

        Ok(Self {
            processor: TextEmotionProcessor::new(max_chars),
            engine: AudioEffectsEngine::new(),
            registry,
            client,
            cache,
            quota,
            config,
            counters: Counters::default(),
            closed: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &EmotionRegistry {
        &self.registry
    }

    #[inline]
    pub fn backend_name(&self) -> &'static str {
        self.client.name()
    }

    /// Effective maximum segment length.
    #[inline]
    pub fn max_segment_chars(&self) -> usize {
        self.processor.max_segment_chars()
    }

    /// Resolves one request to encoded audio and reports how it was served.
    ///
    /// Input errors (`UnknownEmotion`, `EmptyInput`, `UnsupportedLanguage`,
    /// `TooManySegments`) are raised before any quota or backend use.
    pub async fn resolve(
        &self,
        text: &str,
        language: &str,
        emotion: EmotionId,
        params: &EffectParams,
    ) -> SpeechResult<Resolution> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SpeechError::InvalidConfiguration(
                "pipeline has been shut down".to_string(),
            ));
        }

        let base = self.registry.lookup(emotion)?;
        let profile = effective_profile(&base, &params.overrides)?;
        let text = normalize_text(text);
        if text.is_empty() {
            return Err(SpeechError::EmptyInput);
        }
        let language = if language.trim().is_empty() {
            self.client.normalize_language(&self.config.default_language)?
        } else {
            self.client.normalize_language(language)?
        };

        let key = CacheKey::compute(&text, &language, emotion, &profile, params.format);

        let stale = match self.cache.get(&key).await {
            Some(entry) if !entry.is_stale(self.config.stale_after) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, emotion = %emotion, "Cache hit");
                return Ok(self.resolution(key, &entry, CacheStatus::Hit));
            }
            other => other,
        };

        let segments = self.processor.process(&text, &profile)?;
        self.check_segment_budget(segments.len())?;

        if let Some(entry) = stale {
            if !self.quota.has_capacity(segments.len() as u32) {
                return self.rate_limited_with_stale(key, entry, params.allow_stale);
            }
            debug!(key = %key, "Refreshing stale cache entry");
            self.cache.invalidate(&key).await;
            return match self
                .render_coalesced(key, segments, &language, &profile, params.format)
                .await
            {
                Ok(resolution) => Ok(resolution),
                Err(e) => self.refresh_failed(key, entry, params.allow_stale, e).await,
            };
        }

        let result = self
            .render_coalesced(key, segments, &language, &profile, params.format)
            .await;
        if matches!(result, Err(SpeechError::RateLimited { .. })) {
            self.counters.rate_limited.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Convenience entry point returning only the audio bytes.
    pub async fn generate_speech(
        &self,
        text: &str,
        language: &str,
        emotion: EmotionId,
        format: OutputFormat,
    ) -> SpeechResult<Bytes> {
        self.resolve(text, language, emotion, &EffectParams::with_format(format))
            .await
            .map(|resolution| resolution.audio)
    }

    /// Snapshot of cache, quota and outcome counters.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            backend: self.client.name(),
            cache_entries: self.cache.entry_count(),
            cache_bytes: self.cache.total_bytes(),
            cache_max_entries: self.cache.max_entries(),
            cache_max_bytes: self.cache.max_bytes(),
            quota: self.quota.usage(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            served_stale: self.counters.served_stale.load(Ordering::Relaxed),
            rate_limited: self.counters.rate_limited.load(Ordering::Relaxed),
            synthesis_calls: self.counters.synthesis_calls.load(Ordering::Relaxed),
        }
    }

    /// Drops every cached rendering. The quota window is untouched.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Speech cache cleared");
    }

    /// Stops accepting requests and releases cached audio.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cache.clear().await;
        info!("Speech pipeline shut down");
    }

    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn check_segment_budget(&self, segments: usize) -> SpeechResult<()> {
        if segments > self.quota.limit() as usize {
            return Err(SpeechError::TooManySegments {
                segments,
                quota: self.quota.limit(),
            });
        }
        Ok(())
    }

    fn resolution(&self, key: CacheKey, entry: &CacheEntry, status: CacheStatus) -> Resolution {
        Resolution {
            audio: entry.audio.clone(),
            status,
            key,
            format: entry.format,
            segments: entry.segments,
        }
    }

    fn rate_limited_with_stale(
        &self,
        key: CacheKey,
        entry: Arc<CacheEntry>,
        allow_stale: bool,
    ) -> SpeechResult<Resolution> {
        self.counters.rate_limited.fetch_add(1, Ordering::Relaxed);
        if allow_stale {
            self.counters.served_stale.fetch_add(1, Ordering::Relaxed);
            warn!(key = %key, "Quota exhausted, serving stale rendering");
            return Ok(self.resolution(key, &entry, CacheStatus::RateLimitedServedStale));
        }
        warn!(key = %key, "Quota exhausted, stale rendering declined");
        Err(SpeechError::RateLimited {
            retry_after: self.quota.retry_after(),
            stale_available: true,
        })
    }

    /// Puts back the stale entry a failed refresh displaced.
    ///
    /// Losing the quota to a concurrent request still serves the stale
    /// rendering when the caller accepts it.
    async fn refresh_failed(
        &self,
        key: CacheKey,
        entry: Arc<CacheEntry>,
        allow_stale: bool,
        error: SpeechError,
    ) -> SpeechResult<Resolution> {
        self.cache.insert(key, entry.clone()).await;
        match error {
            SpeechError::RateLimited { .. } => self.rate_limited_with_stale(key, entry, allow_stale),
            e => Err(e),
        }
    }

    /// Renders `key` once even when several callers miss it together.
    ///
    /// The caller that runs the render reports `MISS`; callers that waited on
    /// it receive the same bytes and report `HIT`.
    async fn render_coalesced(
        &self,
        key: CacheKey,
        segments: Vec<TextSegment>,
        language: &str,
        profile: &EmotionProfile,
        format: OutputFormat,
    ) -> SpeechResult<Resolution> {
        let result = self
            .cache
            .get_or_try_insert(key, self.render(segments, language, profile, format))
            .await;

        match result {
            Ok((entry, true)) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                info!(
                    key = %key,
                    emotion = %profile.id,
                    segments = entry.segments,
                    bytes = entry.size(),
                    status = ?CacheStatus::Miss,
                    "Rendered speech"
                );
                Ok(self.resolution(key, &entry, CacheStatus::Miss))
            }
            Ok((entry, false)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Joined in-flight rendering");
                Ok(self.resolution(key, &entry, CacheStatus::Hit))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Speech rendering failed");
                Err(e)
            }
        }
    }

    async fn render(
        &self,
        segments: Vec<TextSegment>,
        language: &str,
        profile: &EmotionProfile,
        format: OutputFormat,
    ) -> SpeechResult<Arc<CacheEntry>> {
        let units = segments.len() as u32;
        self.quota
            .try_acquire(units)
            .map_err(|retry_after| SpeechError::RateLimited {
                retry_after,
                stale_available: false,
            })?;
        self.counters
            .synthesis_calls
            .fetch_add(u64::from(units), Ordering::Relaxed);

        let audios = self
            .synthesize_all(&segments, language, profile.prefer_slow_synthesis)
            .await?;

        let engine = self.engine.clone();
        let profile = profile.clone();
        let count = segments.len();
        let audio = tokio::task::spawn_blocking(move || {
            engine.assemble(&audios, &segments, &profile, format)
        })
        .await
        .map_err(|e| SpeechError::EncodeError(format!("assembly task failed: {e}")))??;

        Ok(Arc::new(CacheEntry::new(audio, format, count)))
    }

    /// Synthesizes every segment, preserving order. The first failure aborts.
    async fn synthesize_all(
        &self,
        segments: &[TextSegment],
        language: &str,
        slow: bool,
    ) -> SpeechResult<Vec<Bytes>> {
        let calls: Vec<_> = segments
            .iter()
            .map(|segment| Box::pin(self.synthesize_segment(segment, language, slow)))
            .collect();

        stream::iter(calls)
            .buffered(self.config.synthesis_concurrency)
            .try_collect()
            .await
    }

    async fn synthesize_segment(
        &self,
        segment: &TextSegment,
        language: &str,
        slow: bool,
    ) -> SpeechResult<Bytes> {
        let timeout = self.config.segment_timeout;
        debug!(
            segment = segment.index,
            chars = segment.char_len(),
            backend = self.client.name(),
            "Synthesizing segment"
        );

        tokio::time::timeout(
            timeout,
            self.client.synthesize(segment.speech_text(), language, slow),
        )
        .await
        .unwrap_or_else(|_| {
            Err(SpeechError::NetworkError(format!(
                "segment {} timed out after {}ms",
                segment.index,
                timeout.as_millis()
            )))
        })
    }
}

impl std::fmt::Debug for PipelineService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineService")
            .field("backend", &self.client.name())
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("closed", &self.is_shut_down())
            .finish()
    }
}

/// Applies per-request overrides and checks the result is renderable.
fn effective_profile(base: &EmotionProfile, overrides: &EffectOverrides) -> SpeechResult<EmotionProfile> {
    let profile = base.with_overrides(overrides);
    if !overrides.is_empty() {
        profile.check_audio_parameters()?;
    }
    Ok(profile)
}
