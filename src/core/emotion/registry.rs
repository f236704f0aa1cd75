//! Emotion profile registry.
//!
//! The registry maps every [`EmotionId`] to exactly one immutable
//! [`EmotionProfile`]. Construction validates the whole table; a registry
//! that exists is a registry that passed validation.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use super::profile::{ClauseSplit, EmotionProfile, TextRule};
use super::types::EmotionId;
use crate::core::text::apply_rules;
use crate::errors::{SpeechError, SpeechResult};

/// Inputs every profile's rules must leave unchanged on a second pass.
const IDEMPOTENCE_PROBES: &[&str] = &[
    "Hello world.",
    "Wait... what?! No!!",
    "Salt & pepper, please; thanks: bye.",
    "I said STOP. NOW!",
    "Pi is 3.14 and e is 2.71.",
    "She said \"no.\" Then left!",
    "A dash \u{2014} and an en dash \u{2013} here.",
    "Really???",
];

fn terminal(from: &str, to: &str) -> TextRule {
    TextRule::TerminalPunctuation {
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn collapse(mark: char, count: usize) -> TextRule {
    TextRule::CollapseRepeats { mark, count }
}

fn regex(pattern: &str, replacement: &str) -> TextRule {
    TextRule::RegexReplace {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
    }
}

/// The built-in profile table.
pub fn builtin_profiles() -> Vec<EmotionProfile> {
    use EmotionId::*;

    vec![
        EmotionProfile::new(Neutral, 1.0, 0.0, 500, 250),
        EmotionProfile::new(Happy, 1.08, 2.0, 350, 180)
            .rule(collapse('!', 1))
            .rule(terminal(".", "!")),
        EmotionProfile::new(Sad, 0.85, -3.0, 900, 450)
            .rule(collapse('!', 1))
            .rule(terminal("!", "."))
            .slow(true),
        EmotionProfile::new(Angry, 1.12, 4.0, 250, 120)
            .rule(terminal(".", "!"))
            .rule(collapse('!', 1))
            .emphasis(2, 120),
        EmotionProfile::new(Calm, 0.92, -2.0, 750, 350).rule(terminal("!", ".")),
        EmotionProfile::new(Excited, 1.18, 3.0, 220, 100)
            .rule(terminal(".", "!"))
            .rule(collapse('!', 2))
            .emphasis(2, 80),
        EmotionProfile::new(Thoughtful, 0.88, -1.0, 1000, 500)
            .rule(terminal(".", "..."))
            .slow(true)
            .clause_split(ClauseSplit::Always),
        EmotionProfile::new(Romantic, 0.9, -1.5, 800, 400)
            .rule(collapse('!', 1))
            .rule(terminal("!", "."))
            .slow(true),
        EmotionProfile::new(News, 1.0, 1.0, 450, 200)
            .rule(collapse('!', 1))
            .rule(collapse('?', 1))
            .rule(terminal("!", "."))
            .rule(regex(r"\s*&\s*", " and ")),
        EmotionProfile::new(Dramatic, 0.82, 3.5, 1200, 600)
            .rule(terminal("!", "!!"))
            .slow(true)
            .clause_split(ClauseSplit::Always)
            .emphasis(2, 200),
        EmotionProfile::new(Robotic, 0.95, 0.0, 600, 300)
            .rule(collapse('!', 1))
            .rule(collapse('?', 1))
            .rule(terminal("!", "."))
            .rule(regex(r"\s*[\u{2014}\u{2013}]\s*", ", ")),
    ]
}

/// Read-only lookup table from [`EmotionId`] to [`EmotionProfile`].
#[derive(Debug, Clone)]
pub struct EmotionRegistry {
    profiles: HashMap<EmotionId, Arc<EmotionProfile>>,
}

impl Default for EmotionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EmotionRegistry {
    /// Registry holding the built-in profiles.
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles()
                .into_iter()
                .map(|p| (p.id, Arc::new(p)))
                .collect(),
        }
    }

    /// Builds and validates a registry from an explicit profile list.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when an identifier is missing or duplicated,
    /// a parameter is out of range, a rule pattern does not compile, a rule
    /// is not idempotent, or two profiles share identical audio parameters.
    pub fn new(profiles: Vec<EmotionProfile>) -> SpeechResult<Self> {
        let mut map = HashMap::with_capacity(profiles.len());
        for profile in profiles {
            validate_profile(&profile)?;
            let id = profile.id;
            if map.insert(id, Arc::new(profile)).is_some() {
                return Err(SpeechError::InvalidConfiguration(format!(
                    "Duplicate profile for emotion '{id}'"
                )));
            }
        }

        for id in EmotionId::all() {
            if !map.contains_key(id) {
                return Err(SpeechError::InvalidConfiguration(format!(
                    "Missing profile for emotion '{id}'"
                )));
            }
        }

        let mut signatures = HashMap::with_capacity(map.len());
        let mut ids: Vec<&EmotionId> = map.keys().collect();
        ids.sort();
        for id in ids {
            let signature = map[id].effect_signature();
            if let Some(other) = signatures.insert(signature, *id) {
                return Err(SpeechError::InvalidConfiguration(format!(
                    "Profiles '{other}' and '{id}' have identical audio parameters"
                )));
            }
        }

        Ok(Self { profiles: map })
    }

    /// Loads profiles from YAML and lays them over this registry.
    ///
    /// The YAML document is a list of profiles; each replaces the profile
    /// with the same `id`. The merged table is re-validated.
    pub fn with_overrides_yaml(&self, yaml: &str) -> SpeechResult<Self> {
        let overrides: Vec<EmotionProfile> = serde_yaml::from_str(yaml).map_err(|e| {
            SpeechError::InvalidConfiguration(format!("Failed to parse emotion profiles: {e}"))
        })?;

        let mut seen = HashSet::new();
        let mut merged: HashMap<EmotionId, EmotionProfile> = self
            .profiles
            .iter()
            .map(|(id, p)| (*id, p.as_ref().clone()))
            .collect();
        for profile in overrides {
            if !seen.insert(profile.id) {
                return Err(SpeechError::InvalidConfiguration(format!(
                    "Emotion '{}' is defined twice in overrides",
                    profile.id
                )));
            }
            merged.insert(profile.id, profile);
        }

        let registry = Self::new(merged.into_values().collect())?;
        tracing::info!(overrides = seen.len(), "Loaded custom emotion profiles");
        Ok(registry)
    }

    /// Built-in registry with overrides read from a YAML file.
    pub fn from_yaml_file(path: &Path) -> SpeechResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SpeechError::InvalidConfiguration(format!(
                "Failed to read emotion profiles {}: {e}",
                path.display()
            ))
        })?;
        Self::builtin().with_overrides_yaml(&contents)
    }

    /// Returns the profile registered for `id`.
    pub fn lookup(&self, id: EmotionId) -> SpeechResult<Arc<EmotionProfile>> {
        self.profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| SpeechError::UnknownEmotion(id.to_string()))
    }

    /// Parses `name` and returns its profile.
    pub fn lookup_str(&self, name: &str) -> SpeechResult<Arc<EmotionProfile>> {
        let id = EmotionId::from_str(name)
            .ok_or_else(|| SpeechError::UnknownEmotion(name.to_string()))?;
        self.lookup(id)
    }

    /// All profiles, ordered by identifier.
    pub fn profiles(&self) -> Vec<Arc<EmotionProfile>> {
        EmotionId::all()
            .iter()
            .filter_map(|id| self.profiles.get(id).cloned())
            .collect()
    }

    /// Number of registered profiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn validate_profile(profile: &EmotionProfile) -> SpeechResult<()> {
    let id = profile.id;
    profile.check_audio_parameters()?;

    for rule in &profile.text_rules {
        match rule {
            TextRule::RegexReplace { pattern, .. } => {
                crate::core::text::compile_pattern(pattern)?;
            }
            TextRule::EmphasisWrap { min_run } if *min_run == 0 => {
                return Err(SpeechError::InvalidConfiguration(format!(
                    "Emotion '{id}': emphasis_wrap min_run must be at least 1"
                )));
            }
            TextRule::TerminalPunctuation { from, .. } if from.is_empty() => {
                return Err(SpeechError::InvalidConfiguration(format!(
                    "Emotion '{id}': terminal_punctuation needs a non-empty 'from'"
                )));
            }
            _ => {}
        }
    }

    for probe in IDEMPOTENCE_PROBES {
        let once = apply_rules(&profile.text_rules, probe)?;
        let twice = apply_rules(&profile.text_rules, &once)?;
        if once != twice {
            return Err(SpeechError::InvalidConfiguration(format!(
                "Emotion '{id}': text rules are not idempotent on {probe:?}"
            )));
        }
    }

    Ok(())
}
