//! The waiting-text feeder: a queue of pasted lyric lines consumed one unit
//! at a time, tracked by a single flat character cursor.
//!
//! Lengths and offsets are counted in `char`s; line breaks are not counted.
//! A unit never crosses a line break, so each pasted line closes a sentence.

pub mod romaji;

use crate::document::Document;

/// How the next insertion unit is extracted from the waiting text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertionMode {
    /// One character at a time, as typed.
    #[default]
    Normal,
    /// One character at a time, uppercased.
    Upper,
    /// One character at a time, lowercased.
    Lower,
    /// Kana-sized romaji tokens from the splitting capability.
    Romaji,
}

/// Punctuation absorbed into the preceding unit in the literal modes.
const ABSORBED: [char; 5] = [' ', ',', '!', '.', '?'];

/// One unit of the current waiting line, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingUnit {
    pub content: String,
    /// Whether this unit's flat offset lies before the cursor.
    pub used: bool,
}

/// The next unit to feed into the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUnit {
    /// Text to append to the target cells. Carries a trailing terminator when
    /// the unit consumes the rest of its line.
    pub insert: String,
    /// Characters the cursor advances by (the untransformed unit length).
    pub advance: usize,
}

/// Total characters across all waiting lines.
pub fn total_len(document: &Document) -> usize {
    document
        .waiting_lyrics
        .iter()
        .map(|line| line.chars().count())
        .sum()
}

/// Remainder of the line containing the cursor, from the cursor to the line
/// end. `None` once the whole queue is consumed.
pub fn remaining_in_line(document: &Document) -> Option<&str> {
    let position = document.waiting_lyrics_position;
    if position >= total_len(document) {
        return None;
    }
    let mut consumed = 0;
    for line in &document.waiting_lyrics {
        let line_len = line.chars().count();
        if consumed + line_len > position {
            let offset = position - consumed;
            let byte = line
                .char_indices()
                .nth(offset)
                .map(|(byte, _)| byte)
                .unwrap_or(line.len());
            return Some(&line[byte..]);
        }
        consumed += line_len;
    }
    None
}

/// Units of the line containing the cursor, flagged with whether each has
/// already been consumed. Empty once the queue is exhausted.
pub fn waiting_view<F>(document: &Document, mode: InsertionMode, splitter: F) -> Vec<WaitingUnit>
where
    F: Fn(&str) -> Vec<String>,
{
    let position = document.waiting_lyrics_position;
    if position >= total_len(document) {
        return Vec::new();
    }
    let mut consumed = 0;
    for line in &document.waiting_lyrics {
        let line_len = line.chars().count();
        if consumed + line_len > position {
            let mut units = Vec::new();
            if mode == InsertionMode::Romaji {
                let mut offset = 0;
                for token in splitter(line) {
                    let token_len = token.chars().count();
                    units.push(WaitingUnit {
                        content: token,
                        used: consumed + offset < position,
                    });
                    offset += token_len;
                }
            } else {
                for (offset, ch) in line.chars().enumerate() {
                    units.push(WaitingUnit {
                        content: ch.to_string(),
                        used: consumed + offset < position,
                    });
                }
            }
            return units;
        }
        consumed += line_len;
    }
    Vec::new()
}

/// Extracts the next unit without consuming it. In the literal modes the unit
/// is the first remaining character plus any directly following run of
/// absorbable punctuation; in romaji mode it is the first splitter token.
pub fn next_unit<F>(document: &Document, mode: InsertionMode, splitter: F) -> Option<NextUnit>
where
    F: Fn(&str) -> Vec<String>,
{
    let remaining = remaining_in_line(document)?;
    let remaining_len = remaining.chars().count();

    if mode == InsertionMode::Romaji {
        let token = splitter(remaining).into_iter().next()?;
        let advance = token.chars().count();
        let mut insert = token;
        if advance == remaining_len {
            insert.push(crate::sentence::TERMINATOR);
        }
        return Some(NextUnit { insert, advance });
    }

    let mut chars = remaining.chars();
    let mut unit = String::from(chars.next()?);
    for ch in chars {
        if ABSORBED.contains(&ch) {
            unit.push(ch);
        } else {
            break;
        }
    }
    let advance = unit.chars().count();

    let mut insert = match mode {
        InsertionMode::Upper => unit.to_uppercase(),
        InsertionMode::Lower => unit.to_lowercase(),
        _ => unit,
    };
    if advance == remaining_len {
        insert.push(crate::sentence::TERMINATOR);
    }
    Some(NextUnit { insert, advance })
}

/// Moves the cursor forward, clamped to the queue length.
pub fn advance_cursor(document: &mut Document, by: usize) {
    let total = total_len(document);
    document.waiting_lyrics_position = (document.waiting_lyrics_position + by).min(total);
}
