//! Content-addressed cache keys.

use std::fmt;

use xxhash_rust::xxh3::xxh3_128;

use crate::core::audio::OutputFormat;
use crate::core::emotion::{EmotionId, EmotionProfile};

/// Trims and collapses every internal whitespace run to a single space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic digest of everything that shapes a rendering.
///
/// Built from the normalized text, language, emotion, the effective audio
/// parameters (after per-request overrides) and the output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(u128);

impl CacheKey {
    /// Computes the key for one request.
    ///
    /// `profile` must be the effective profile, overrides already applied.
    pub fn compute(
        text: &str,
        language: &str,
        emotion: EmotionId,
        profile: &EmotionProfile,
        format: OutputFormat,
    ) -> Self {
        let mut s = String::with_capacity(text.len() + 96);
        s.push_str(&language.trim().to_lowercase());
        s.push('|');
        s.push_str(emotion.as_str());
        s.push('|');
        let (tempo, gain, sentence, clause, emphasis) = profile.effect_signature();
        s.push_str(&format!("{tempo:08x}|{gain:08x}|{sentence}|{clause}|{emphasis}|"));
        s.push_str(format.as_str());
        // Free text goes last so it cannot shift the other fields
        s.push('|');
        s.push_str(&normalize_text(text));
        Self(xxh3_128(s.as_bytes()))
    }

    #[inline]
    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
