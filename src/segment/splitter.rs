//! Heuristic sentence splitter — the fallback when alignment is unavailable.
//!
//! Splits a transcript into sentence-like units on terminal punctuation
//! (`. ! ?` and the full-width `。 ！ ？`) followed by whitespace or end
//! of input, then merges units too short to stand alone into their
//! neighbors so interjections like "Right." or "Okay." never become
//! their own segment.
//!
//! Guarantee: joining the returned units with single spaces reproduces
//! the whitespace-normalized input exactly.

use super::normalize_whitespace;

/// Units below this many characters are merged into a neighbor.
pub const MIN_UNIT_CHARS: usize = 18;

/// Whether `c` ends a sentence.
fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

/// Split `text` into sentence-like units, merging short ones.
///
/// Returns an empty vector only when `text` is empty after whitespace
/// normalization — callers must treat that as "no segments" and abort.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    // Raw pass: break after terminal punctuation + space (the space is
    // consumed; rejoining with " " restores it).
    let mut raw: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if is_terminal(c) && matches!(chars.peek(), None | Some(' ')) {
            chars.next_if_eq(&' ');
            raw.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        raw.push(current);
    }

    // Merge pass: short units are buffered and prepended to the next
    // unit; a leftover buffer is appended to the last emitted unit.
    let mut units: Vec<String> = Vec::new();
    let mut buffer = String::new();
    for unit in raw {
        let combined = if buffer.is_empty() {
            unit
        } else {
            format!("{buffer} {unit}")
        };
        if combined.chars().count() < MIN_UNIT_CHARS {
            buffer = combined;
        } else {
            units.push(combined);
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        match units.last_mut() {
            Some(last) => {
                last.push(' ');
                last.push_str(&buffer);
            }
            None => units.push(buffer),
        }
    }

    units
}
