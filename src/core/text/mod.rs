//! Emotion-driven text processing.
//!
//! [`TextEmotionProcessor::process`] runs in three steps:
//!
//! 1. Apply the profile's text rules in declared order.
//! 2. Record capital-letter emphasis spans (when the profile enables it).
//! 3. Segment on sentence boundaries, then on clause boundaries for long
//!    sentences (or always, per the profile), then on word boundaries for
//!    anything still over the maximum segment length.
//!
//! Segments tile the processed text: concatenating their `text` fields
//! reproduces it exactly.

mod rules;
mod segmenter;

use std::ops::Range;

use serde::Serialize;

pub use rules::{apply_rule, apply_rules, find_emphasis_spans};
pub(crate) use rules::compile as compile_pattern;

use crate::core::emotion::EmotionProfile;
use crate::errors::{SpeechError, SpeechResult};

/// Default maximum segment length in characters.
pub const DEFAULT_MAX_SEGMENT_CHARS: usize = 500;

/// A contiguous slice of processed text synthesized on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSegment {
    /// Position in reading order
    pub index: usize,
    /// Exact slice of the processed text, including trailing whitespace
    pub text: String,
    /// Whether a sentence pause (rather than a clause pause) follows
    pub sentence_terminal: bool,
    /// Emphasised byte ranges within `text`
    pub emphasis: Vec<Range<usize>>,
}

impl TextSegment {
    /// The text sent to the synthesis backend.
    #[inline]
    pub fn speech_text(&self) -> &str {
        self.text.trim()
    }

    /// Returns whether any part of this segment is emphasised.
    #[inline]
    pub fn has_emphasis(&self) -> bool {
        !self.emphasis.is_empty()
    }

    /// Length of the spoken content in characters.
    #[inline]
    pub fn char_len(&self) -> usize {
        self.speech_text().chars().count()
    }
}

/// Applies an [`EmotionProfile`]'s textual rules and segments the result.
#[derive(Debug, Clone)]
pub struct TextEmotionProcessor {
    max_segment_chars: usize,
}

impl Default for TextEmotionProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEGMENT_CHARS)
    }
}

impl TextEmotionProcessor {
    /// Creates a processor with the given maximum segment length (at least 1).
    pub fn new(max_segment_chars: usize) -> Self {
        Self {
            max_segment_chars: max_segment_chars.max(1),
        }
    }

    /// Maximum segment length in characters.
    #[inline]
    pub fn max_segment_chars(&self) -> usize {
        self.max_segment_chars
    }

    /// Applies the profile's rules and trims the result.
    pub fn apply_profile(&self, raw_text: &str, profile: &EmotionProfile) -> SpeechResult<String> {
        let processed = apply_rules(&profile.text_rules, raw_text)?;
        Ok(processed.trim().to_string())
    }

    /// Turns raw text into ordered, synthesis-ready segments.
    ///
    /// # Errors
    ///
    /// `EmptyInput` when nothing remains after rules and trimming.
    pub fn process(&self, raw_text: &str, profile: &EmotionProfile) -> SpeechResult<Vec<TextSegment>> {
        let text = self.apply_profile(raw_text, profile)?;
        if text.is_empty() {
            return Err(SpeechError::EmptyInput);
        }

        let spans = profile
            .emphasis_min_run()
            .map(|min_run| find_emphasis_spans(&text, min_run))
            .unwrap_or_default();

        let pieces = segmenter::split(&text, self.max_segment_chars, profile.clause_split);
        let segments: Vec<TextSegment> = pieces
            .into_iter()
            .enumerate()
            .map(|(index, piece)| {
                let range = piece.range;
                let emphasis = spans
                    .iter()
                    .filter(|span| span.start < range.end && span.end > range.start)
                    .map(|span| {
                        span.start.max(range.start) - range.start
                            ..span.end.min(range.end) - range.start
                    })
                    .collect();
                TextSegment {
                    index,
                    text: text[range].to_string(),
                    sentence_terminal: piece.sentence_terminal,
                    emphasis,
                }
            })
            .collect();

        if segments.is_empty() {
            return Err(SpeechError::EmptyInput);
        }

        tracing::debug!(
            emotion = %profile.id,
            segments = segments.len(),
            chars = text.chars().count(),
            "Processed text into segments"
        );

        Ok(segments)
    }
}
