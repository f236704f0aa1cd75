//! Emotion identifiers.
//!
//! Every identifier maps to exactly one [`EmotionProfile`](super::EmotionProfile)
//! in the registry. Identifiers are parsed case-insensitively and accept a few
//! common aliases so that callers can pass free-form names like `"joyful"`.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Emotion Identifier
// =============================================================================

/// Supported emotion identifiers.
///
/// # Example
///
/// ```rust
/// use emotive_speech::core::emotion::EmotionId;
///
/// let id = EmotionId::Dramatic;
/// assert_eq!(id.to_string(), "dramatic");
/// assert_eq!(EmotionId::from_str("NEWS"), Some(EmotionId::News));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmotionId {
    /// Plain reading, no shaping
    #[default]
    Neutral,
    /// Bright, slightly faster and louder
    Happy,
    /// Slow, quiet, long pauses
    Sad,
    /// Fast, loud, clipped pauses, capital emphasis
    Angry,
    /// Slightly slow and soft
    Calm,
    /// Fastest delivery, exclamations, capital emphasis
    Excited,
    /// Slow with trailing ellipses and clause pauses
    Thoughtful,
    /// Soft and unhurried
    Romantic,
    /// Even newsreader pacing
    News,
    /// Slow, loud, long theatrical pauses
    Dramatic,
    /// Flat punctuation and uniform pacing
    Robotic,
}

impl EmotionId {
    /// Returns all identifiers in declaration order.
    #[inline]
    pub const fn all() -> &'static [EmotionId] {
        &[
            EmotionId::Neutral,
            EmotionId::Happy,
            EmotionId::Sad,
            EmotionId::Angry,
            EmotionId::Calm,
            EmotionId::Excited,
            EmotionId::Thoughtful,
            EmotionId::Romantic,
            EmotionId::News,
            EmotionId::Dramatic,
            EmotionId::Robotic,
        ]
    }

    /// Returns the identifier as a lowercase string suitable for APIs.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EmotionId::Neutral => "neutral",
            EmotionId::Happy => "happy",
            EmotionId::Sad => "sad",
            EmotionId::Angry => "angry",
            EmotionId::Calm => "calm",
            EmotionId::Excited => "excited",
            EmotionId::Thoughtful => "thoughtful",
            EmotionId::Romantic => "romantic",
            EmotionId::News => "news",
            EmotionId::Dramatic => "dramatic",
            EmotionId::Robotic => "robotic",
        }
    }

    /// Parses an identifier from a string (case-insensitive, aliases accepted).
    ///
    /// Returns `None` if the string doesn't name a known emotion.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "neutral" | "default" | "plain" => Some(EmotionId::Neutral),
            "happy" | "joyful" | "cheerful" => Some(EmotionId::Happy),
            "sad" | "melancholic" | "sorrowful" => Some(EmotionId::Sad),
            "angry" | "frustrated" | "mad" => Some(EmotionId::Angry),
            "calm" | "peaceful" | "relaxed" | "serene" => Some(EmotionId::Calm),
            "excited" | "enthusiastic" | "energetic" => Some(EmotionId::Excited),
            "thoughtful" | "pensive" | "reflective" => Some(EmotionId::Thoughtful),
            "romantic" | "tender" | "loving" => Some(EmotionId::Romantic),
            "news" | "newsreader" | "broadcast" => Some(EmotionId::News),
            "dramatic" | "theatrical" => Some(EmotionId::Dramatic),
            "robotic" | "robot" | "monotone" => Some(EmotionId::Robotic),
            _ => None,
        }
    }
}

impl fmt::Display for EmotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_as_str() {
        assert_eq!(EmotionId::Neutral.as_str(), "neutral");
        assert_eq!(EmotionId::Happy.as_str(), "happy");
        assert_eq!(EmotionId::Thoughtful.as_str(), "thoughtful");
        assert_eq!(EmotionId::Robotic.as_str(), "robotic");
    }

    #[test]
    fn test_emotion_from_str() {
        assert_eq!(EmotionId::from_str("happy"), Some(EmotionId::Happy));
        assert_eq!(EmotionId::from_str("ANGRY"), Some(EmotionId::Angry));
        assert_eq!(EmotionId::from_str(" Cheerful "), Some(EmotionId::Happy));
        assert_eq!(EmotionId::from_str("broadcast"), Some(EmotionId::News));
        assert_eq!(EmotionId::from_str("grumpy"), None);
        assert_eq!(EmotionId::from_str(""), None);
    }

    #[test]
    fn test_as_str_round_trips_through_from_str() {
        for id in EmotionId::all() {
            assert_eq!(EmotionId::from_str(id.as_str()), Some(*id));
        }
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&EmotionId::Thoughtful).unwrap();
        assert_eq!(json, "\"thoughtful\"");
        let parsed: EmotionId = serde_json::from_str("\"dramatic\"").unwrap();
        assert_eq!(parsed, EmotionId::Dramatic);
    }

    #[test]
    fn test_all_contains_required_set() {
        let all = EmotionId::all();
        for required in [
            EmotionId::Happy,
            EmotionId::Sad,
            EmotionId::Angry,
            EmotionId::Calm,
            EmotionId::Excited,
            EmotionId::Thoughtful,
            EmotionId::Romantic,
            EmotionId::News,
            EmotionId::Dramatic,
            EmotionId::Robotic,
        ] {
            assert!(all.contains(&required));
        }
    }
}
