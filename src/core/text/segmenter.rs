//! Sentence- and clause-aware segmentation.
//!
//! Pieces are byte ranges over the processed text. Each piece owns the
//! whitespace that follows it, so the pieces tile the text exactly. Length
//! limits are measured in characters on the piece's content (trailing
//! whitespace excluded).

use std::ops::Range;

use super::rules::{is_clause_mark, is_sentence_mark};
use crate::core::emotion::ClauseSplit;

const TRAILING_CLOSERS: [char; 5] = ['"', '\'', ')', ']', '\u{201D}'];

/// A contiguous range of the processed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Piece {
    pub range: Range<usize>,
    pub sentence_terminal: bool,
}

/// Splits `text` into pieces no longer than `max_chars` characters of content.
pub(crate) fn split(text: &str, max_chars: usize, policy: ClauseSplit) -> Vec<Piece> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();

    for sentence in split_on(text, 0..text.len(), is_sentence_mark) {
        let needs_clauses =
            policy == ClauseSplit::Always || content_chars(text, &sentence) > max_chars;
        let clauses = if needs_clauses {
            split_on(text, sentence.clone(), is_clause_mark)
        } else {
            vec![sentence.clone()]
        };

        let last_clause = clauses.len().saturating_sub(1);
        for (ci, clause) in clauses.into_iter().enumerate() {
            let chunks = hard_split(text, clause, max_chars);
            let last_chunk = chunks.len().saturating_sub(1);
            for (hi, chunk) in chunks.into_iter().enumerate() {
                pieces.push(Piece {
                    range: chunk,
                    sentence_terminal: ci == last_clause && hi == last_chunk,
                });
            }
        }
    }

    merge_unspeakable(text, pieces, max_chars)
}

/// Splits `range` after each run of boundary marks that is followed by
/// whitespace (or closers then whitespace) or the end of the range.
fn split_on(text: &str, range: Range<usize>, is_mark: fn(char) -> bool) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let chars: Vec<(usize, char)> = slice.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        if !is_mark(chars[i].1) {
            i += 1;
            continue;
        }
        while i < chars.len() && is_mark(chars[i].1) {
            i += 1;
        }
        while i < chars.len() && TRAILING_CLOSERS.contains(&chars[i].1) {
            i += 1;
        }
        if i < chars.len() && !chars[i].1.is_whitespace() {
            continue;
        }
        while i < chars.len() && chars[i].1.is_whitespace() {
            i += 1;
        }
        let end = chars.get(i).map_or(slice.len(), |(idx, _)| *idx);
        out.push(range.start + start..range.start + end);
        start = end;
    }

    if start < slice.len() {
        out.push(range.start + start..range.end);
    }
    out
}

/// Breaks a range whose content exceeds `max_chars` at the last word
/// boundary inside each window, or mid-word when a window has no whitespace.
fn hard_split(text: &str, range: Range<usize>, max_chars: usize) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = range.start;

    while content_chars(text, &(start..range.end)) > max_chars {
        let rest = &text[start..range.end];
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(idx, _)| idx);
        let window = &rest[..window_end];

        let cut = match window
            .char_indices()
            .filter(|(idx, c)| c.is_whitespace() && *idx > 0)
            .last()
        {
            Some((ws_idx, _)) => {
                // Take the whole whitespace run so the next chunk starts on a word
                let after_ws = rest[ws_idx..]
                    .char_indices()
                    .find(|(_, c)| !c.is_whitespace())
                    .map_or(rest.len(), |(idx, _)| ws_idx + idx);
                after_ws
            }
            None => window_end,
        };

        out.push(start..start + cut);
        start += cut;
    }

    if start < range.end {
        out.push(start..range.end);
    }
    out
}

/// Folds pieces with nothing to pronounce into a neighbour when it fits.
fn merge_unspeakable(text: &str, pieces: Vec<Piece>, max_chars: usize) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::with_capacity(pieces.len());
    let mut carry: Option<Range<usize>> = None;

    for mut piece in pieces {
        if let Some(pending) = carry.take() {
            let merged = pending.start..piece.range.end;
            if content_chars(text, &merged) <= max_chars {
                piece.range = merged;
            } else {
                out.push(Piece {
                    range: pending,
                    sentence_terminal: false,
                });
            }
        }

        if is_speakable(&text[piece.range.clone()]) {
            out.push(piece);
            continue;
        }

        match out.last_mut() {
            Some(prev) if content_chars(text, &(prev.range.start..piece.range.end)) <= max_chars => {
                prev.range.end = piece.range.end;
                prev.sentence_terminal |= piece.sentence_terminal;
            }
            _ => carry = Some(piece.range),
        }
    }

    if let Some(pending) = carry {
        out.push(Piece {
            range: pending,
            sentence_terminal: true,
        });
    }
    out
}

/// Character count of the range with trailing whitespace excluded.
pub(crate) fn content_chars(text: &str, range: &Range<usize>) -> usize {
    text[range.clone()].trim_end().chars().count()
}

#[inline]
fn is_speakable(s: &str) -> bool {
    s.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(text: &'a str, pieces: &[Piece]) -> Vec<&'a str> {
        pieces.iter().map(|p| &text[p.range.clone()]).collect()
    }

    #[test]
    fn test_sentence_split_keeps_trailing_whitespace() {
        let text = "Hello there. How are you? Fine!";
        let pieces = split(text, 500, ClauseSplit::WhenOverLength);
        assert_eq!(
            texts(text, &pieces),
            vec!["Hello there. ", "How are you? ", "Fine!"]
        );
        assert!(pieces.iter().all(|p| p.sentence_terminal));
    }

    #[test]
    fn test_decimal_point_is_not_a_boundary() {
        let text = "It costs 3.50 today. Cheap.";
        let pieces = split(text, 500, ClauseSplit::WhenOverLength);
        assert_eq!(texts(text, &pieces), vec!["It costs 3.50 today. ", "Cheap."]);
    }

    #[test]
    fn test_clause_split_always() {
        let text = "A. B, C.";
        let pieces = split(text, 500, ClauseSplit::Always);
        assert_eq!(texts(text, &pieces), vec!["A. ", "B, ", "C."]);
        assert!(pieces[0].sentence_terminal);
        assert!(!pieces[1].sentence_terminal);
        assert!(pieces[2].sentence_terminal);
    }

    #[test]
    fn test_clause_split_only_when_over_length() {
        let text = "First part, second part; third part.";
        let pieces = split(text, 500, ClauseSplit::WhenOverLength);
        assert_eq!(pieces.len(), 1);

        let pieces = split(text, 20, ClauseSplit::WhenOverLength);
        assert_eq!(
            texts(text, &pieces),
            vec!["First part, ", "second part; ", "third part."]
        );
    }

    #[test]
    fn test_hard_split_on_word_boundaries() {
        let text = "alpha beta gamma delta epsilon";
        let pieces = split(text, 12, ClauseSplit::WhenOverLength);
        let parts = texts(text, &pieces);
        assert_eq!(parts.concat(), text);
        for part in &parts {
            assert!(part.trim_end().chars().count() <= 12, "{part:?} too long");
        }
        assert_eq!(parts[0], "alpha beta ");
    }

    #[test]
    fn test_hard_split_without_whitespace() {
        let text = "a".repeat(25);
        let pieces = split(&text, 10, ClauseSplit::WhenOverLength);
        let lens: Vec<usize> = pieces.iter().map(|p| p.range.len()).collect();
        assert_eq!(lens, vec![10, 10, 5]);
    }

    #[test]
    fn test_punctuation_only_piece_merges_into_previous() {
        let text = "Really? !!! Yes.";
        let pieces = split(text, 500, ClauseSplit::WhenOverLength);
        assert_eq!(texts(text, &pieces), vec!["Really? !!! ", "Yes."]);
    }

    #[test]
    fn test_multibyte_characters() {
        let text = "Ça va? Très bien. Ünïcödé wörds här";
        let pieces = split(text, 8, ClauseSplit::WhenOverLength);
        let parts = texts(text, &pieces);
        assert_eq!(parts.concat(), text);
        for part in parts {
            assert!(part.trim_end().chars().count() <= 8);
        }
    }
}
