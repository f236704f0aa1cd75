//! Scripted synthesis backends for integration tests.
//!
//! Wraps the deterministic tone backend and lets a test inject failures or
//! latency on chosen calls while counting every attempt.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use emotive_speech::core::emotion::EmotionRegistry;
use emotive_speech::core::pipeline::{PipelineConfig, PipelineService};
use emotive_speech::core::synthesis::languages::normalize_language;
use emotive_speech::core::synthesis::{SynthesisClient, ToneSynthesizer};
use emotive_speech::errors::{SpeechError, SpeechResult};

/// What a scripted call returns instead of tone audio.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Bytes that are not decodable audio
    Garbage,
    /// A typed backend error
    Error(SpeechError),
}

#[derive(Default)]
pub struct ScriptedSynthesizer {
    inner: ToneSynthesizer,
    calls: AtomicUsize,
    faults: Mutex<HashMap<usize, Fault>>,
    delay: Option<Duration>,
    texts: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    /// Makes the `call`-th attempt (zero-based) return `fault`.
    pub fn fail_call(self, call: usize, fault: Fault) -> Self {
        self.faults.lock().insert(call, fault);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order.
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    pub fn tone(&self) -> &ToneSynthesizer {
        &self.inner
    }
}

#[async_trait]
impl SynthesisClient for ScriptedSynthesizer {
    async fn synthesize(&self, text: &str, language: &str, slow: bool) -> SpeechResult<Bytes> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let fault = self.faults.lock().get(&call).cloned();
        match fault {
            Some(Fault::Garbage) => Ok(Bytes::from_static(b"definitely not audio")),
            Some(Fault::Error(e)) => Err(e),
            None => self.inner.synthesize(text, language, slow).await,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    /// Same language table as the Google backend.
    fn normalize_language(&self, code: &str) -> SpeechResult<String> {
        normalize_language(code)
            .map(str::to_string)
            .ok_or_else(|| SpeechError::UnsupportedLanguage(code.trim().to_string()))
    }
}

/// Pipeline over the built-in registry and `client`.
pub fn pipeline_with(
    config: PipelineConfig,
    client: Arc<ScriptedSynthesizer>,
) -> PipelineService {
    PipelineService::new(config, Arc::new(EmotionRegistry::builtin()), client)
        .expect("valid pipeline config")
}
