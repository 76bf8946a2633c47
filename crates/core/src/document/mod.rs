use serde::{Deserialize, Serialize};

use crate::grid::Timing;
use crate::{KaraError, Result};

pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_BEATS_PER_LINE: u32 = 8;
pub const DEFAULT_LYRICS_PER_BEAT: u32 = 2;

/// Colors handed out to voices in creation order; cycles past the end.
const VOICE_COLORS: &[&str] = &["#ff5733", "#009FFF", "#C622FF", "#2ECC71", "#F1C40F"];

/// The audio track the lyric grid is aligned to. The raw encoded bytes stay
/// embedded in the document so a project file is self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    /// Shift of the lyric-grid origin relative to the audio, in seconds.
    pub start: f64,
    pub offset: f64,
    pub bpm: f64,
    /// Playback gain, 0 to 100.
    pub volume: f64,
}

impl AudioTrack {
    pub fn gain(&self) -> f32 {
        (self.volume / 100.0) as f32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// Hex color, `#rrggbb`.
    pub color: String,
    /// Whether keystroke-driven insertion writes into this voice.
    pub insert_into: bool,
}

/// One cell of the lyric grid. `voice` is the index of the owning voice and
/// always equals the cell's column; cells never hold voice references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricCell {
    pub voice: usize,
    pub content: String,
    /// Extends this cell's fill into following slots until a non-held cell.
    pub hold: bool,
}

impl LyricCell {
    fn empty(voice: usize) -> Self {
        Self {
            voice,
            content: String::new(),
            hold: false,
        }
    }
}

/// One slot of the voice-independent highlight outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineCell {
    pub selected: bool,
    pub hold: bool,
}

/// The full editable project state.
///
/// Invariants: `lyrics.len() == outline.len()`, every lyric row has exactly
/// `voices.len()` cells, and grid lengths only ever grow. Violations indicate
/// a broken mutation path and are treated as programmer errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub track: AudioTrack,
    pub voices: Vec<Voice>,
    pub beats_per_line: u32,
    pub lyrics_per_beat: u32,
    /// Outer index: time slot. Inner index: voice.
    pub lyrics: Vec<Vec<LyricCell>>,
    pub outline: Vec<OutlineCell>,
    pub metronome_volume: f64,
    /// Pasted lyric lines awaiting assignment into the grid.
    pub waiting_lyrics: Vec<String>,
    /// Characters already consumed across all waiting lines.
    pub waiting_lyrics_position: usize,
}

impl Document {
    /// Builds a fresh document around raw audio bytes with default tempo and
    /// a single insertion-target voice.
    pub fn new(audio: Vec<u8>) -> Self {
        Self {
            version: crate::project::PROJECT_VERSION,
            track: AudioTrack {
                data: audio,
                start: 0.0,
                offset: 0.0,
                bpm: DEFAULT_BPM,
                volume: 100.0,
            },
            voices: vec![Voice {
                name: "Default".to_string(),
                color: VOICE_COLORS[0].to_string(),
                insert_into: true,
            }],
            beats_per_line: DEFAULT_BEATS_PER_LINE,
            lyrics_per_beat: DEFAULT_LYRICS_PER_BEAT,
            lyrics: Vec::new(),
            outline: Vec::new(),
            metronome_volume: 100.0,
            waiting_lyrics: Vec::new(),
            waiting_lyrics_position: 0,
        }
    }

    pub fn timing(&self) -> Timing {
        Timing::new(self.track.bpm, self.beats_per_line, self.lyrics_per_beat)
    }

    /// Grows the lyric and outline grids to cover `track_duration`. Existing
    /// rows are never truncated, so slot indices stay stable for the whole
    /// life of the document.
    pub fn grow_grid(&mut self, track_duration: f64) {
        let size = self.timing().grid_size(track_duration);
        for _ in self.lyrics.len()..size {
            let row = (0..self.voices.len()).map(LyricCell::empty).collect();
            self.lyrics.push(row);
            self.outline.push(OutlineCell::default());
        }
        self.assert_consistent();
    }

    /// Appends a voice and a matching column in every grid row. Returns the
    /// new voice index.
    pub fn add_voice(&mut self) -> usize {
        let index = self.voices.len();
        let color = VOICE_COLORS[index % VOICE_COLORS.len()];
        self.voices.push(Voice {
            name: format!("Voice {}", index + 1),
            color: color.to_string(),
            insert_into: false,
        });
        for row in &mut self.lyrics {
            row.push(LyricCell::empty(index));
        }
        self.assert_consistent();
        index
    }

    /// Removes a voice and its column from every grid row, re-pointing the
    /// remaining cells at their new column indices.
    pub fn remove_voice(&mut self, index: usize) -> Result<()> {
        if index >= self.voices.len() {
            return Err(KaraError::InvalidInput("voice index out of range"));
        }
        self.voices.remove(index);
        for row in &mut self.lyrics {
            row.remove(index);
            for (column, cell) in row.iter_mut().enumerate() {
                cell.voice = column;
            }
        }
        self.assert_consistent();
        Ok(())
    }

    /// Applies new tempo parameters after validating them. The caller is
    /// responsible for regrowing the grid, since the track duration is not
    /// known here.
    pub fn set_timing(
        &mut self,
        bpm: f64,
        start: f64,
        beats_per_line: u32,
        lyrics_per_beat: u32,
    ) -> Result<()> {
        Timing::new(bpm, beats_per_line, lyrics_per_beat).validate()?;
        self.track.bpm = bpm;
        self.track.start = start;
        self.beats_per_line = beats_per_line;
        self.lyrics_per_beat = lyrics_per_beat;
        Ok(())
    }

    /// Replaces the waiting-lyrics queue with the lines of `text` and resets
    /// the cursor. Carriage returns and tabs are dropped.
    pub fn set_waiting_lyrics(&mut self, text: &str) {
        let cleaned = text.replace(['\r', '\t'], "");
        self.waiting_lyrics = cleaned.split('\n').map(str::to_string).collect();
        self.waiting_lyrics_position = 0;
    }

    pub fn clear_waiting_lyrics(&mut self) {
        self.waiting_lyrics.clear();
        self.waiting_lyrics_position = 0;
    }

    fn assert_consistent(&self) {
        debug_assert_eq!(self.lyrics.len(), self.outline.len());
        debug_assert!(self
            .lyrics
            .iter()
            .all(|row| row.len() == self.voices.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_with_grid(slots: usize) -> Document {
        let mut document = Document::new(Vec::new());
        let duration = slots as f64 * document.timing().lyric_duration();
        document.grow_grid(duration);
        document
    }

    #[test]
    fn new_document_uses_defaults() {
        let document = Document::new(vec![1, 2, 3]);
        assert_eq!(document.track.bpm, DEFAULT_BPM);
        assert_eq!(document.voices.len(), 1);
        assert!(document.voices[0].insert_into);
        assert!(document.lyrics.is_empty());
        assert!(document.outline.is_empty());
    }

    #[test]
    fn grid_grows_and_never_shrinks() {
        let mut document = Document::new(Vec::new());
        document.grow_grid(10.1);
        assert_eq!(document.lyrics.len(), 41);
        assert_eq!(document.outline.len(), 41);

        document.grow_grid(5.0);
        assert_eq!(document.lyrics.len(), 41);

        document.grow_grid(10.6);
        assert_eq!(document.lyrics.len(), 43);
    }

    #[test]
    fn voices_add_and_remove_columns() {
        let mut document = document_with_grid(4);
        let second = document.add_voice();
        assert_eq!(second, 1);
        assert_eq!(document.voices[1].name, "Voice 2");
        assert!(document.lyrics.iter().all(|row| row.len() == 2));

        document.lyrics[2][1].content = "la".to_string();
        document.remove_voice(0).unwrap();
        assert_eq!(document.voices.len(), 1);
        assert!(document.lyrics.iter().all(|row| row.len() == 1));
        assert_eq!(document.lyrics[2][0].content, "la");
        assert_eq!(document.lyrics[2][0].voice, 0);
    }

    #[test]
    fn remove_voice_rejects_bad_index() {
        let mut document = document_with_grid(2);
        assert!(document.remove_voice(3).is_err());
    }

    #[test]
    fn set_timing_validates_at_the_boundary() {
        let mut document = document_with_grid(2);
        assert!(document.set_timing(0.0, 0.0, 8, 2).is_err());
        assert_eq!(document.track.bpm, DEFAULT_BPM);
        assert!(document.set_timing(90.0, 1.5, 4, 4).is_ok());
        assert_eq!(document.track.bpm, 90.0);
        assert_eq!(document.track.start, 1.5);
    }

    #[test]
    fn waiting_lyrics_split_on_newlines() {
        let mut document = Document::new(Vec::new());
        document.set_waiting_lyrics("first line\r\nsecond\tline");
        assert_eq!(document.waiting_lyrics, vec!["first line", "secondline"]);
        assert_eq!(document.waiting_lyrics_position, 0);

        document.waiting_lyrics_position = 3;
        document.clear_waiting_lyrics();
        assert!(document.waiting_lyrics.is_empty());
        assert_eq!(document.waiting_lyrics_position, 0);
    }
}
