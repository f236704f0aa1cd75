//! Emotion profiles and their registry.
//!
//! An emotion is a named bundle of textual cues and measurable signal
//! transforms layered on top of an ordinary synthesis call.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        EmotionRegistry                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   EmotionId ──lookup──▶ EmotionProfile                           │
//! │                           │                                      │
//! │            ┌──────────────┴──────────────┐                       │
//! │            ▼                             ▼                       │
//! │   text_rules (data)              audio parameters                │
//! │   - regex_replace                - tempo_multiplier              │
//! │   - collapse_repeats             - gain_delta_db                 │
//! │   - terminal_punctuation         - sentence / clause pauses      │
//! │   - emphasis_wrap                - emphasis pause                │
//! │            │                             │                       │
//! │            ▼                             ▼                       │
//! │   TextEmotionProcessor           AudioEffectsEngine              │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use emotive_speech::core::emotion::{EmotionId, EmotionRegistry};
//!
//! let registry = EmotionRegistry::builtin();
//! let sad = registry.lookup(EmotionId::Sad).unwrap();
//! assert!(sad.tempo_multiplier < 1.0);
//! assert!(sad.prefer_slow_synthesis);
//! ```
//!
//! # Custom Profiles
//!
//! Profiles are plain serde data and can be replaced from YAML:
//!
//! ```rust
//! use emotive_speech::core::emotion::{EmotionId, EmotionRegistry};
//!
//! let yaml = r#"
//! - id: news
//!   tempo_multiplier: 1.05
//!   gain_delta_db: 0.5
//!   sentence_pause_ms: 400
//!   clause_pause_ms: 150
//! "#;
//! let registry = EmotionRegistry::builtin().with_overrides_yaml(yaml).unwrap();
//! assert_eq!(registry.lookup(EmotionId::News).unwrap().sentence_pause_ms, 400);
//! ```

pub mod profile;
pub mod registry;
pub mod types;

// =============================================================================
// Public Re-exports
// =============================================================================

pub use profile::{
    ClauseSplit, EffectOverrides, EmotionProfile, MAX_GAIN_DB, MAX_PAUSE_MS, TEMPO_RANGE, TextRule,
};
pub use registry::{EmotionRegistry, builtin_profiles};
pub use types::EmotionId;
