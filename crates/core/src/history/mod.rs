use crate::document::{Document, LyricCell, OutlineCell};

/// Maximum number of snapshots retained. Beyond this the entry at index 1 is
/// dropped so index 0 survives as the baseline anchor.
const HISTORY_LIMIT: usize = 100;

/// Deep copy of the mutable portions of a document.
#[derive(Debug, Clone)]
struct Snapshot {
    lyrics: Vec<Vec<LyricCell>>,
    outline: Vec<OutlineCell>,
    waiting_lyrics: Vec<String>,
    waiting_lyrics_position: usize,
}

impl Snapshot {
    fn capture(document: &Document) -> Self {
        Self {
            lyrics: document.lyrics.clone(),
            outline: document.outline.clone(),
            waiting_lyrics: document.waiting_lyrics.clone(),
            waiting_lyrics_position: document.waiting_lyrics_position,
        }
    }

    /// Writes the snapshot back onto the live document, touching only cells
    /// whose value actually differs so unchanged cells keep their identity
    /// for downstream consumers.
    fn apply(&self, document: &mut Document) {
        let rows = document.lyrics.len().min(self.lyrics.len());
        for slot in 0..rows {
            let columns = document.lyrics[slot].len().min(self.lyrics[slot].len());
            for voice in 0..columns {
                let live = &mut document.lyrics[slot][voice];
                let saved = &self.lyrics[slot][voice];
                if live.content != saved.content || live.hold != saved.hold {
                    live.content = saved.content.clone();
                    live.hold = saved.hold;
                }
            }
        }

        let slots = document.outline.len().min(self.outline.len());
        for slot in 0..slots {
            if document.outline[slot] != self.outline[slot] {
                document.outline[slot] = self.outline[slot];
            }
        }

        document.waiting_lyrics = self.waiting_lyrics.clone();
        document.waiting_lyrics_position = self.waiting_lyrics_position;
    }
}

/// Snapshot-based undo stack. Callers push before every logical edit; popping
/// restores the state captured before that edit.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn push(&mut self, document: &Document) {
        self.snapshots.push(Snapshot::capture(document));
        if self.snapshots.len() > HISTORY_LIMIT {
            self.snapshots.remove(1);
        }
    }

    /// Discards the top snapshot and applies the one below it. A single
    /// remaining snapshot is the baseline and cannot be undone past; that
    /// case is a deliberate no-op returning `false`.
    pub fn pop(&mut self, document: &mut Document) -> bool {
        if self.snapshots.len() <= 1 {
            return false;
        }
        self.snapshots.pop();
        let Some(top) = self.snapshots.last() else {
            return false;
        };
        top.apply(document);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn document_with_grid(slots: usize) -> Document {
        let mut document = Document::new(Vec::new());
        let duration = slots as f64 * document.timing().lyric_duration();
        document.grow_grid(duration);
        document
    }

    #[test]
    fn pop_restores_the_pre_mutation_state() {
        let mut document = document_with_grid(4);
        document.set_waiting_lyrics("abc");
        let mut history = History::new();
        history.push(&document);

        history.push(&document);
        document.lyrics[1][0].content = "la".to_string();
        document.lyrics[1][0].hold = true;
        document.outline[2].selected = true;
        document.waiting_lyrics_position = 2;

        assert!(history.pop(&mut document));
        assert_eq!(document.lyrics[1][0].content, "");
        assert!(!document.lyrics[1][0].hold);
        assert!(!document.outline[2].selected);
        assert_eq!(document.waiting_lyrics_position, 0);
    }

    #[test]
    fn pop_on_baseline_is_a_no_op() {
        let mut document = document_with_grid(4);
        let mut history = History::new();
        history.push(&document);

        document.lyrics[0][0].content = "kept".to_string();
        assert!(!history.pop(&mut document));
        assert_eq!(document.lyrics[0][0].content, "kept");
    }

    #[test]
    fn history_is_bounded_and_keeps_the_baseline() {
        let mut document = document_with_grid(4);
        let mut history = History::new();
        document.lyrics[0][0].content = "baseline".to_string();
        history.push(&document);

        for i in 0..150 {
            document.lyrics[0][0].content = format!("edit {i}");
            history.push(&document);
        }
        assert_eq!(history.len(), 100);

        while history.pop(&mut document) {}
        assert_eq!(document.lyrics[0][0].content, "baseline");
    }

    #[test]
    fn pop_survives_a_grid_grown_after_the_snapshot() {
        let mut document = document_with_grid(4);
        let mut history = History::new();
        history.push(&document);
        history.push(&document);

        document.grow_grid(4.0);
        document.lyrics[10][0].content = "late".to_string();
        assert!(history.pop(&mut document));
        // Rows beyond the snapshot are left as they are.
        assert_eq!(document.lyrics[10][0].content, "late");
        assert_eq!(document.lyrics.len(), 16);
    }
}
