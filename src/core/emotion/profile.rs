//! Emotion profiles: declarative text rules plus audio-effect parameters.
//!
//! Profiles are plain data. Text rules are a tagged list of transform kinds
//! rather than callbacks, so a profile can be loaded from YAML, compared,
//! and validated without running any code.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::types::EmotionId;
use crate::errors::{SpeechError, SpeechResult};

/// Accepted `tempo_multiplier` values.
pub const TEMPO_RANGE: RangeInclusive<f32> = 0.25..=4.0;

/// Largest accepted `gain_delta_db` magnitude.
pub const MAX_GAIN_DB: f32 = 40.0;

/// Longest accepted pause of any kind.
pub const MAX_PAUSE_MS: u32 = 10_000;

// =============================================================================
// Text Rules
// =============================================================================

/// One declarative text transform.
///
/// Every rule must be idempotent: applying it to its own output is a no-op.
/// The registry verifies this on a probe corpus at construction time.
///
/// # YAML
///
/// ```yaml
/// - kind: regex_replace
///   pattern: '\s*&\s*'
///   replacement: ' and '
/// - kind: collapse_repeats
///   mark: '!'
///   count: 1
/// - kind: terminal_punctuation
///   from: '.'
///   to: '...'
/// - kind: emphasis_wrap
///   min_run: 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextRule {
    /// Replace every match of `pattern` with `replacement` (regex syntax, `$1` captures).
    RegexReplace { pattern: String, replacement: String },

    /// Punctuation density: runs of two or more `mark` become exactly `count` marks.
    CollapseRepeats { mark: char, count: usize },

    /// Replace a sentence-final punctuation run equal to `from` with `to`.
    ///
    /// A run is terminal when it follows a non-punctuation character and is
    /// followed by whitespace or the end of the text, so `3.14` is untouched.
    TerminalPunctuation { from: String, to: String },

    /// Mark runs of at least `min_run` consecutive uppercase letters for emphasis.
    ///
    /// The text itself is not changed; the processor records the spans.
    EmphasisWrap { min_run: usize },
}

impl TextRule {
    /// Short name used in logs and validation errors.
    pub fn kind(&self) -> &'static str {
        match self {
            TextRule::RegexReplace { .. } => "regex_replace",
            TextRule::CollapseRepeats { .. } => "collapse_repeats",
            TextRule::TerminalPunctuation { .. } => "terminal_punctuation",
            TextRule::EmphasisWrap { .. } => "emphasis_wrap",
        }
    }
}

// =============================================================================
// Clause Splitting
// =============================================================================

/// When a sentence is split further on clause boundaries (`,` `;` `:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClauseSplit {
    /// Only sentences longer than the maximum segment length are split
    #[default]
    WhenOverLength,
    /// Every clause becomes its own segment, so clause pauses are audible
    Always,
}

// =============================================================================
// Emotion Profile
// =============================================================================

/// Text-processing rules and audio-effect parameters for one emotion.
///
/// Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    /// Identifier this profile is registered under
    pub id: EmotionId,

    /// Transforms applied to the raw text, in order
    #[serde(default)]
    pub text_rules: Vec<TextRule>,

    /// Duration scaling applied without changing pitch (> 0, 1.0 = unchanged)
    pub tempo_multiplier: f32,

    /// Gain added to every segment, in dB
    pub gain_delta_db: f32,

    /// Silence after a sentence-terminal segment
    pub sentence_pause_ms: u32,

    /// Silence after a clause segment
    pub clause_pause_ms: u32,

    /// Extra silence before a segment that carries emphasis
    #[serde(default)]
    pub emphasis_pause_ms: u32,

    /// Ask the backend for its slow speaking mode
    #[serde(default)]
    pub prefer_slow_synthesis: bool,

    /// Clause segmentation policy
    #[serde(default)]
    pub clause_split: ClauseSplit,
}

impl EmotionProfile {
    /// Creates a profile with no text rules.
    pub fn new(
        id: EmotionId,
        tempo_multiplier: f32,
        gain_delta_db: f32,
        sentence_pause_ms: u32,
        clause_pause_ms: u32,
    ) -> Self {
        Self {
            id,
            text_rules: Vec::new(),
            tempo_multiplier,
            gain_delta_db,
            sentence_pause_ms,
            clause_pause_ms,
            emphasis_pause_ms: 0,
            prefer_slow_synthesis: false,
            clause_split: ClauseSplit::WhenOverLength,
        }
    }

    /// Appends a text rule.
    #[inline]
    pub fn rule(mut self, rule: TextRule) -> Self {
        self.text_rules.push(rule);
        self
    }

    /// Enables capital-letter emphasis with the given extra pause.
    #[inline]
    pub fn emphasis(mut self, min_run: usize, pause_ms: u32) -> Self {
        self.text_rules.push(TextRule::EmphasisWrap { min_run });
        self.emphasis_pause_ms = pause_ms;
        self
    }

    /// Sets the slow-synthesis hint.
    #[inline]
    pub fn slow(mut self, slow: bool) -> Self {
        self.prefer_slow_synthesis = slow;
        self
    }

    /// Sets the clause segmentation policy.
    #[inline]
    pub fn clause_split(mut self, policy: ClauseSplit) -> Self {
        self.clause_split = policy;
        self
    }

    /// Minimum uppercase run length that triggers emphasis, if enabled.
    pub fn emphasis_min_run(&self) -> Option<usize> {
        self.text_rules.iter().find_map(|rule| match rule {
            TextRule::EmphasisWrap { min_run } => Some(*min_run),
            _ => None,
        })
    }

    /// Audio parameters as a comparable tuple (bit patterns for the floats).
    ///
    /// Two profiles with the same signature would render identically.
    pub fn effect_signature(&self) -> (u32, u32, u32, u32, u32) {
        (
            self.tempo_multiplier.to_bits(),
            self.gain_delta_db.to_bits(),
            self.sentence_pause_ms,
            self.clause_pause_ms,
            self.emphasis_pause_ms,
        )
    }

    /// Checks tempo, gain and pauses against their accepted ranges.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` naming the first parameter out of range.
    pub fn check_audio_parameters(&self) -> SpeechResult<()> {
        let id = self.id;
        if !TEMPO_RANGE.contains(&self.tempo_multiplier) {
            return Err(SpeechError::InvalidConfiguration(format!(
                "Emotion '{id}': tempo_multiplier must be within {}..={}, got {}",
                TEMPO_RANGE.start(),
                TEMPO_RANGE.end(),
                self.tempo_multiplier
            )));
        }
        if self.gain_delta_db.is_nan() || self.gain_delta_db.abs() > MAX_GAIN_DB {
            return Err(SpeechError::InvalidConfiguration(format!(
                "Emotion '{id}': gain_delta_db must be within ±{MAX_GAIN_DB} dB, got {}",
                self.gain_delta_db
            )));
        }
        for (name, value) in [
            ("sentence_pause_ms", self.sentence_pause_ms),
            ("clause_pause_ms", self.clause_pause_ms),
            ("emphasis_pause_ms", self.emphasis_pause_ms),
        ] {
            if value > MAX_PAUSE_MS {
                return Err(SpeechError::InvalidConfiguration(format!(
                    "Emotion '{id}': {name} must be at most {MAX_PAUSE_MS}, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Returns a copy with per-request overrides applied.
    pub fn with_overrides(&self, overrides: &EffectOverrides) -> Self {
        let mut profile = self.clone();
        if let Some(tempo) = overrides.tempo_multiplier {
            profile.tempo_multiplier = tempo;
        }
        if let Some(gain) = overrides.gain_delta_db {
            profile.gain_delta_db = gain;
        }
        if let Some(pause) = overrides.sentence_pause_ms {
            profile.sentence_pause_ms = pause;
        }
        if let Some(pause) = overrides.clause_pause_ms {
            profile.clause_pause_ms = pause;
        }
        profile
    }
}

/// Per-request adjustments to a profile's audio parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOverrides {
    pub tempo_multiplier: Option<f32>,
    pub gain_delta_db: Option<f32>,
    pub sentence_pause_ms: Option<u32>,
    pub clause_pause_ms: Option<u32>,
}

impl EffectOverrides {
    /// Returns whether no override is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tempo_multiplier.is_none()
            && self.gain_delta_db.is_none()
            && self.sentence_pause_ms.is_none()
            && self.clause_pause_ms.is_none()
    }
}
