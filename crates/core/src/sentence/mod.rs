//! Sentence segmentation over the lyric grid.
//!
//! Everything in this module is a pure query of `(document, query time)`.
//! Nothing is cached: coloration and fade alphas depend on the playback
//! cursor, and caching them is how a timeline display goes stale.

use crate::document::Document;

/// Sentence terminator marker inside cell content.
pub const TERMINATOR: char = '.';

/// Fade-in window before a sentence's first slot, in seconds.
pub const SENTENCE_LEAD_IN: f64 = 1.0;
/// Fade-out window after a sentence's last held slot, in seconds.
pub const SENTENCE_TAIL: f64 = 0.5;

/// One syllable of a sentence: a terminator-free slice of cell content.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceLyric {
    pub content: String,
    /// Slot the syllable starts in.
    pub slot: usize,
    /// How much of the syllable has been sung at the query time: 0 before the
    /// slot starts, 1 once it has fully passed, a fraction while a held
    /// syllable is being swept.
    pub coloration: f64,
    /// One past the last slot the syllable's hold chain covers.
    pub end: usize,
}

/// A terminator-delimited run of filled cells for one voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub voice: usize,
    pub lyrics: Vec<SentenceLyric>,
    pub start_time: f64,
    pub end_time: f64,
    /// Display row; unique among sentences whose spans overlap.
    pub position: usize,
    /// Fade factor in `[0, 1]` at the query time.
    pub alpha: f64,
}

/// First slot index at or after `slot` whose cell is not held, plus one.
/// Clamped at the grid end so a trailing hold chain cannot run off the grid.
pub fn hold_end(document: &Document, slot: usize, voice: usize) -> usize {
    let mut slot = slot;
    while slot + 1 < document.lyrics.len() && document.lyrics[slot][voice].hold {
        slot += 1;
    }
    slot + 1
}

/// All sentences in the document, in document order, with coloration, fade
/// alpha, and display positions computed for the query time `at`.
pub fn sentences(document: &Document, at: f64) -> Vec<Sentence> {
    let lyric_duration = document.timing().lyric_duration();
    let mut sentences: Vec<Sentence> = Vec::new();

    for voice in 0..document.voices.len() {
        let mut pending: Vec<SentenceLyric> = Vec::new();

        for slot in 0..document.lyrics.len() {
            let cell = &document.lyrics[slot][voice];
            if cell.content.is_empty() {
                continue;
            }

            let upcoming = lyric_duration * slot as f64 >= at;
            let end = hold_end(document, slot, voice);
            let coloration = if upcoming {
                0.0
            } else if cell.hold && end as f64 * lyric_duration >= at {
                (at - slot as f64 * lyric_duration) / ((end - slot) as f64 * lyric_duration)
            } else {
                1.0
            };

            let chars: Vec<char> = cell.content.chars().collect();
            let mut slice = String::new();
            for (k, &ch) in chars.iter().enumerate() {
                let terminator = ch == TERMINATOR;
                if !terminator {
                    slice.push(ch);
                }
                if terminator || k == chars.len() - 1 {
                    if !slice.is_empty() {
                        pending.push(SentenceLyric {
                            content: std::mem::take(&mut slice),
                            slot,
                            coloration,
                            end,
                        });
                    }
                }
                if terminator && !pending.is_empty() {
                    close_sentence(&mut sentences, &mut pending, voice, lyric_duration, at);
                }
            }
        }

        if !pending.is_empty() {
            close_sentence(&mut sentences, &mut pending, voice, lyric_duration, at);
        }
    }

    sentences
}

/// Sentences whose span covers `at`.
pub fn sentences_at(document: &Document, at: f64) -> Vec<Sentence> {
    sentences(document, at)
        .into_iter()
        .filter(|s| s.start_time <= at && s.end_time >= at)
        .collect()
}

/// The active sentences arranged by display position, with `None` filling
/// unoccupied rows up to the highest occupied one.
pub fn rows_at(document: &Document, at: f64) -> Vec<Option<Sentence>> {
    let active = sentences_at(document, at);
    let Some(max) = active.iter().map(|s| s.position).max() else {
        return Vec::new();
    };
    (0..=max)
        .map(|row| active.iter().find(|s| s.position == row).cloned())
        .collect()
}

fn close_sentence(
    sentences: &mut Vec<Sentence>,
    pending: &mut Vec<SentenceLyric>,
    voice: usize,
    lyric_duration: f64,
    at: f64,
) {
    let (Some(first), Some(last)) = (pending.first(), pending.last()) else {
        return;
    };
    let start_time = first.slot as f64 * lyric_duration - SENTENCE_LEAD_IN;
    let end_time = last.end as f64 * lyric_duration + SENTENCE_TAIL;

    let mut alpha = 1.0;
    if at > start_time && at < start_time + SENTENCE_LEAD_IN {
        alpha = (at - start_time) / SENTENCE_LEAD_IN;
    }
    if at > end_time - SENTENCE_TAIL && at < end_time {
        alpha = (end_time - at) / SENTENCE_TAIL;
    }

    // Lowest display row unused by any sentence whose span overlaps this one.
    let mut position = 0;
    while sentences
        .iter()
        .any(|s| s.end_time >= start_time && s.start_time <= end_time && s.position == position)
    {
        position += 1;
    }

    sentences.push(Sentence {
        voice,
        lyrics: std::mem::take(pending),
        start_time,
        end_time,
        position,
        alpha,
    });
}
