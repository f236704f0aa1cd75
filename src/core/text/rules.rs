//! Application of declarative [`TextRule`]s.

use std::collections::HashMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::core::emotion::TextRule;
use crate::errors::{SpeechError, SpeechResult};

/// Characters that end a sentence.
pub(crate) const SENTENCE_MARKS: [char; 3] = ['.', '!', '?'];

/// Characters that end a clause.
pub(crate) const CLAUSE_MARKS: [char; 3] = [',', ';', ':'];

/// Characters allowed to trail a sentence-final run (closing quotes and brackets).
const TRAILING_CLOSERS: [char; 5] = ['"', '\'', ')', ']', '\u{201D}'];

#[inline]
pub(crate) fn is_sentence_mark(c: char) -> bool {
    SENTENCE_MARKS.contains(&c)
}

#[inline]
pub(crate) fn is_clause_mark(c: char) -> bool {
    CLAUSE_MARKS.contains(&c)
}

/// Applies one rule to `text`.
pub fn apply_rule(rule: &TextRule, text: &str) -> SpeechResult<String> {
    match rule {
        TextRule::RegexReplace {
            pattern,
            replacement,
        } => {
            let re = compile(pattern)?;
            Ok(re.replace_all(text, replacement.as_str()).into_owned())
        }
        TextRule::CollapseRepeats { mark, count } => Ok(collapse_repeats(text, *mark, *count)),
        TextRule::TerminalPunctuation { from, to } => Ok(replace_terminal(text, from, to)),
        // Emphasis is recorded as spans, the text is left as is
        TextRule::EmphasisWrap { .. } => Ok(text.to_string()),
    }
}

/// Applies rules in declared order.
pub fn apply_rules(rules: &[TextRule], text: &str) -> SpeechResult<String> {
    let mut out = text.to_string();
    for rule in rules {
        out = apply_rule(rule, &out)?;
    }
    Ok(out)
}

/// Compiled patterns, shared by every profile.
static PATTERN_CACHE: Lazy<RwLock<HashMap<String, Regex>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Compiles a rule pattern, mapping failures to a configuration error.
pub(crate) fn compile(pattern: &str) -> SpeechResult<Regex> {
    if let Some(re) = PATTERN_CACHE.read().get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern).map_err(|e| {
        SpeechError::InvalidConfiguration(format!("Invalid regex pattern '{pattern}': {e}"))
    })?;
    PATTERN_CACHE
        .write()
        .insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Runs of two or more `mark` become exactly `count` marks.
fn collapse_repeats(text: &str, mark: char, count: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;

    let flush = |out: &mut String, run: usize| {
        let n = if run >= 2 { count } else { run };
        out.extend(std::iter::repeat_n(mark, n));
    };

    for c in text.chars() {
        if c == mark {
            run += 1;
            continue;
        }
        flush(&mut out, run);
        run = 0;
        out.push(c);
    }
    flush(&mut out, run);
    out
}

/// Replaces sentence-final punctuation runs equal to `from` with `to`.
fn replace_terminal(text: &str, from: &str, to: &str) -> String {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = String::with_capacity(text.len() + to.len());
    let mut copied = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        if !is_sentence_mark(chars[i].1) {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && is_sentence_mark(chars[i].1) {
            i += 1;
        }

        let preceded = start > 0 && !chars[start - 1].1.is_whitespace();
        let mut after = i;
        while after < chars.len() && TRAILING_CLOSERS.contains(&chars[after].1) {
            after += 1;
        }
        let followed = after == chars.len() || chars[after].1.is_whitespace();

        let run_start = chars[start].0;
        let run_end = chars.get(i).map_or(text.len(), |(idx, _)| *idx);

        if preceded && followed && &text[run_start..run_end] == from {
            out.push_str(&text[copied..run_start]);
            out.push_str(to);
            copied = run_end;
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Byte ranges of uppercase runs at least `min_run` letters long.
pub fn find_emphasis_spans(text: &str, min_run: usize) -> Vec<Range<usize>> {
    let min_run = min_run.max(1);
    let mut spans = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut run_len = 0usize;

    for (idx, c) in text.char_indices() {
        if c.is_uppercase() {
            if run_start.is_none() {
                run_start = Some(idx);
            }
            run_len += 1;
            continue;
        }
        if let Some(start) = run_start.take() {
            if run_len >= min_run {
                spans.push(start..idx);
            }
        }
        run_len = 0;
    }
    if let Some(start) = run_start {
        if run_len >= min_run {
            spans.push(start..text.len());
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(from: &str, to: &str) -> TextRule {
        TextRule::TerminalPunctuation {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn test_collapse_repeats() {
        let rule = TextRule::CollapseRepeats { mark: '!', count: 1 };
        assert_eq!(apply_rule(&rule, "Wow!!! Really!").unwrap(), "Wow! Really!");

        let rule = TextRule::CollapseRepeats { mark: '!', count: 2 };
        assert_eq!(apply_rule(&rule, "Go!!!! Now!").unwrap(), "Go!! Now!");
    }

    #[test]
    fn test_terminal_punctuation_only_touches_sentence_ends() {
        let rule = terminal(".", "!");
        assert_eq!(
            apply_rule(&rule, "Pi is 3.14. Nice.").unwrap(),
            "Pi is 3.14! Nice!"
        );
        assert_eq!(apply_rule(&rule, "Wait...").unwrap(), "Wait...");
    }

    #[test]
    fn test_terminal_punctuation_before_closing_quote() {
        let rule = terminal(".", "...");
        assert_eq!(
            apply_rule(&rule, "She said \"no.\" Then left.").unwrap(),
            "She said \"no...\" Then left..."
        );
    }

    #[test]
    fn test_rules_are_idempotent() {
        let rules = vec![
            terminal(".", "..."),
            TextRule::CollapseRepeats { mark: '!', count: 1 },
            TextRule::RegexReplace {
                pattern: r"\s*&\s*".to_string(),
                replacement: " and ".to_string(),
            },
        ];
        let once = apply_rules(&rules, "Salt & pepper. Yes!!").unwrap();
        let twice = apply_rules(&rules, &once).unwrap();
        assert_eq!(once, "Salt and pepper... Yes!");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let rule = TextRule::RegexReplace {
            pattern: "(unclosed".to_string(),
            replacement: String::new(),
        };
        assert!(matches!(
            apply_rule(&rule, "text"),
            Err(SpeechError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_emphasis_wrap_leaves_text_unchanged() {
        let rule = TextRule::EmphasisWrap { min_run: 2 };
        assert_eq!(apply_rule(&rule, "STOP now").unwrap(), "STOP now");
    }

    #[test]
    fn test_find_emphasis_spans() {
        let text = "I said STOP, NOW. Ok";
        let spans = find_emphasis_spans(text, 2);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].clone()], "STOP");
        assert_eq!(&text[spans[1].clone()], "NOW");

        assert!(find_emphasis_spans("A. B, C.", 2).is_empty());
        assert_eq!(find_emphasis_spans("end CAPS", 2), vec![4..8]);
    }
}
