//! The editing session: owns the document, the undo history, the playback
//! clock, and the selecting-mode state machine, and exposes the command
//! surface an input layer dispatches into.

pub mod color;

use std::time::Instant;

use crate::audio::{AudioDecoder, DecodedAudio, PlaybackClock};
use crate::document::Document;
use crate::feeder::{self, romaji, InsertionMode, WaitingUnit};
use crate::grid::Timing;
use crate::history::History;
use crate::sentence::{self, Sentence};
use crate::Result;

/// Fraction of a lyric duration added to the time cursor while marking slots
/// during playback. Compensates for perceived input lag; tunable via
/// [`Editor::set_playback_lookahead`].
pub const PLAYBACK_LOOKAHEAD: f64 = 0.4;

/// When the metronome tick should sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetronomeMode {
    #[default]
    Off,
    /// On every slot boundary.
    EveryLyric,
    /// On entering a selected slot that is not a hold continuation.
    SelectionStart,
    /// On entering a slot where any voice has lyric content.
    FilledLyric,
}

/// The keyboard command surface, dispatched by an external input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePlayback,
    Undo,
    EnterSelecting,
    ExitSelecting,
    PreviousLine,
    NextLine,
    PreviousLyric,
    NextLyric,
    PreviousRegion,
    NextRegion,
    InsertUnit,
    SkipUnit,
}

/// Selecting-mode state. `deselecting` fixes the pending operation for the
/// life of this instance; `started` drives the scrub debounce.
#[derive(Debug, Clone, Copy)]
struct Selecting {
    started: Instant,
    deselecting: bool,
}

pub struct Editor {
    document: Document,
    audio: DecodedAudio,
    history: History,
    current_time: f64,
    selecting: Option<Selecting>,
    clock: Option<PlaybackClock>,
    insertion_mode: InsertionMode,
    metronome_mode: MetronomeMode,
    playback_lookahead: f64,
    saved: bool,
}

impl Editor {
    /// Starts a fresh session around raw audio bytes.
    pub fn from_audio(audio: Vec<u8>, decoder: &dyn AudioDecoder) -> Result<Self> {
        Self::build(Document::new(audio), decoder, false)
    }

    /// Opens an existing document. Decode failure propagates before anything
    /// is constructed, so a previously open session stays untouched.
    pub fn open(document: Document, decoder: &dyn AudioDecoder) -> Result<Self> {
        Self::build(document, decoder, true)
    }

    fn build(mut document: Document, decoder: &dyn AudioDecoder, saved: bool) -> Result<Self> {
        document.timing().validate()?;
        let audio = decoder.decode(&document.track.data)?;
        let duration = audio.duration_seconds() - document.track.start;
        document.grow_grid(duration);

        let mut history = History::new();
        history.push(&document);

        Ok(Self {
            document,
            audio,
            history,
            current_time: 0.0,
            selecting: None,
            clock: None,
            insertion_mode: InsertionMode::default(),
            metronome_mode: MetronomeMode::default(),
            playback_lookahead: PLAYBACK_LOOKAHEAD,
            saved,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn audio(&self) -> &DecodedAudio {
        &self.audio
    }

    pub fn timing(&self) -> Timing {
        self.document.timing()
    }

    /// Track duration as seen by the lyric grid.
    pub fn duration(&self) -> f64 {
        self.audio.duration_seconds() - self.document.track.start
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    pub fn insertion_mode(&self) -> InsertionMode {
        self.insertion_mode
    }

    pub fn set_insertion_mode(&mut self, mode: InsertionMode) {
        self.insertion_mode = mode;
    }

    pub fn set_metronome_mode(&mut self, mode: MetronomeMode) {
        self.metronome_mode = mode;
    }

    pub fn set_playback_lookahead(&mut self, fraction: f64) {
        self.playback_lookahead = fraction;
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.document.track.volume = volume.clamp(0.0, 100.0);
    }

    // ---- playback -------------------------------------------------------

    pub fn playing(&self) -> bool {
        self.clock.is_some()
    }

    /// Starts playback from the current time. A no-op while already playing.
    pub fn start(&mut self) {
        if self.clock.is_none() {
            self.clock = Some(PlaybackClock::start_at(self.current_time));
        }
    }

    /// Stops playback. A no-op while stopped.
    pub fn stop(&mut self) {
        self.clock = None;
    }

    /// Periodic update driven by the host's timer. Returns whether a
    /// metronome tick should sound for this step.
    pub fn tick(&mut self) -> bool {
        let Some(clock) = self.clock else {
            return false;
        };
        let previous = self.current_time;
        self.set_time(clock.position(), false);
        if self.current_time >= self.duration() {
            self.stop();
        }
        self.metronome_due(previous, self.current_time)
    }

    /// Moves the time cursor, restarting the playback clock when playing.
    pub fn seek(&mut self, time: f64) {
        self.set_time(time, true);
    }

    fn set_time(&mut self, set_time: f64, restart_clock: bool) {
        let duration = self.duration();
        let mut time = set_time;
        if time < -self.document.track.start {
            time = -self.document.track.start;
        }
        if time > duration {
            time = duration;
        }
        if self.current_time < 0.0 {
            time = 0.0;
        }

        if let Some(selecting) = self.selecting {
            self.mark_range(selecting, self.current_time, time);
        }

        self.current_time = time;
        if restart_clock && self.playing() {
            self.clock = Some(PlaybackClock::start_at(self.current_time));
        }
    }

    // ---- selecting mode -------------------------------------------------

    pub fn selecting(&self) -> bool {
        self.selecting.is_some()
    }

    /// Enters selecting mode at the current slot. If that slot is already
    /// selected and playback is stopped, the new instance deselects instead,
    /// clearing the slot and the previous slot's hold immediately.
    pub fn enter_selecting_mode(&mut self) {
        let timing = self.timing();
        let mut time = self.current_time;
        if self.playing() {
            time += timing.lyric_duration() * self.playback_lookahead;
        }
        let Some(index) = self.outline_index(timing.slot_at_biased(time)) else {
            return;
        };

        self.push_history();
        let deselecting = self.document.outline[index].selected && !self.playing();
        self.selecting = Some(Selecting {
            started: Instant::now(),
            deselecting,
        });
        if deselecting {
            self.document.outline[index].selected = false;
            self.document.outline[index].hold = false;
            if index > 0 {
                self.document.outline[index - 1].hold = false;
            }
        } else {
            self.document.outline[index].selected = true;
        }
    }

    pub fn exit_selecting_mode(&mut self) {
        self.selecting = None;
    }

    /// Applies the pending selecting operation over every slot between the
    /// old and new cursor times.
    fn mark_range(&mut self, selecting: Selecting, from_time: f64, to_time: f64) {
        let timing = self.timing();
        let lyric_duration = timing.lyric_duration();
        let mut from = from_time;
        let mut to = to_time;
        if self.playing() {
            from += lyric_duration * self.playback_lookahead;
            to += lyric_duration * self.playback_lookahead;
        }
        let from_slot = timing.slot_at_biased(from);
        let to_slot = timing.slot_at_biased(to);
        let min = from_slot.min(to_slot);
        let max = from_slot.max(to_slot);

        // While the audio is running, wait out one lyric duration before
        // flooding the outline, so a brief scrub does not repaint the grid.
        let apply =
            !self.playing() || selecting.started.elapsed().as_secs_f64() > lyric_duration;
        let mut updated = false;
        if apply {
            for slot in min..=max {
                let Some(index) = self.outline_index(slot) else {
                    continue;
                };
                let cell = &mut self.document.outline[index];
                if selecting.deselecting {
                    if cell.selected {
                        updated = true;
                    }
                    cell.selected = false;
                    cell.hold = false;
                } else {
                    if !cell.selected {
                        updated = true;
                    }
                    cell.selected = true;
                    if slot != max {
                        cell.hold = true;
                    }
                }
            }
            // A deselected range must not be held into from the outside.
            if selecting.deselecting && min > 0 {
                if let Some(index) = self.outline_index(min - 1) {
                    self.document.outline[index].hold = false;
                }
            }
        }
        if updated && !self.playing() {
            self.push_history();
        }
    }

    fn outline_index(&self, slot: i64) -> Option<usize> {
        let index = usize::try_from(slot).ok()?;
        (index < self.document.outline.len()).then_some(index)
    }

    // ---- editing --------------------------------------------------------

    pub fn undo(&mut self) {
        self.history.pop(&mut self.document);
    }

    fn push_history(&mut self) {
        self.saved = false;
        self.history.push(&self.document);
    }

    /// Consumes the next waiting unit. With `insert` the unit's text lands in
    /// the current slot of every insertion-target voice; without, only the
    /// cursor advances.
    pub fn advance_waiting(&mut self, insert: bool) {
        if self.current_time < 0.0 {
            return;
        }
        if self.document.waiting_lyrics_position >= feeder::total_len(&self.document) {
            return;
        }
        let timing = self.timing();
        let slot = timing.slot_at_biased(self.current_time);
        let Ok(index) = usize::try_from(slot) else {
            return;
        };
        if index >= self.document.lyrics.len() {
            return;
        }
        let Some(unit) = feeder::next_unit(&self.document, self.insertion_mode, romaji::split)
        else {
            return;
        };

        self.push_history();
        if insert {
            for voice in 0..self.document.voices.len() {
                if self.document.voices[voice].insert_into {
                    self.document.lyrics[index][voice].content.push_str(&unit.insert);
                }
            }
        }
        feeder::advance_cursor(&mut self.document, unit.advance);
    }

    /// Replaces a cell's content. Content in a cell breaks any hold chain
    /// arriving from the previous slot.
    pub fn set_cell_content(&mut self, slot: usize, voice: usize, content: impl Into<String>) {
        if slot >= self.document.lyrics.len() || voice >= self.document.voices.len() {
            return;
        }
        self.push_history();
        if slot != 0 {
            self.document.lyrics[slot - 1][voice].hold = false;
        }
        self.document.lyrics[slot][voice].content = content.into();
    }

    /// Marks a cell as held. Only allowed while the next cell of the same
    /// voice is still empty, since a hold may not run into content.
    pub fn hold_cell(&mut self, slot: usize, voice: usize) {
        if voice >= self.document.voices.len() || slot + 1 >= self.document.lyrics.len() {
            return;
        }
        if !self.document.lyrics[slot + 1][voice].content.is_empty() {
            return;
        }
        self.push_history();
        self.document.lyrics[slot][voice].hold = true;
    }

    /// Validates and applies new tempo parameters, then regrows the grid for
    /// the new slot duration.
    pub fn apply_timing(
        &mut self,
        bpm: f64,
        start: f64,
        beats_per_line: u32,
        lyrics_per_beat: u32,
    ) -> Result<()> {
        Timing::new(bpm, beats_per_line, lyrics_per_beat).validate()?;
        self.push_history();
        self.document
            .set_timing(bpm, start, beats_per_line, lyrics_per_beat)?;
        let duration = self.duration();
        self.document.grow_grid(duration);
        Ok(())
    }

    pub fn add_voice(&mut self) -> usize {
        self.push_history();
        self.document.add_voice()
    }

    pub fn remove_voice(&mut self, index: usize) -> Result<()> {
        if index >= self.document.voices.len() {
            return Err(crate::KaraError::InvalidInput("voice index out of range"));
        }
        self.push_history();
        self.document.remove_voice(index)
    }

    pub fn set_voice_insert(&mut self, index: usize, insert_into: bool) {
        if let Some(voice) = self.document.voices.get_mut(index) {
            voice.insert_into = insert_into;
        }
    }

    pub fn set_waiting_lyrics(&mut self, text: &str) {
        self.push_history();
        self.document.set_waiting_lyrics(text);
    }

    pub fn clear_waiting_lyrics(&mut self) {
        self.push_history();
        self.document.clear_waiting_lyrics();
    }

    // ---- derived views --------------------------------------------------

    pub fn current_sentences(&self) -> Vec<Sentence> {
        sentence::sentences_at(&self.document, self.current_time)
    }

    pub fn current_rows(&self) -> Vec<Option<Sentence>> {
        sentence::rows_at(&self.document, self.current_time)
    }

    pub fn waiting_view(&self) -> Vec<WaitingUnit> {
        feeder::waiting_view(&self.document, self.insertion_mode, romaji::split)
    }

    /// Display color for a syllable: white swept toward the voice color by
    /// its coloration, faded by the sentence alpha.
    pub fn voice_color(&self, voice: usize, alpha: f64, coloration: f64) -> String {
        let target = self
            .document
            .voices
            .get(voice)
            .and_then(|v| color::parse_hex(&v.color))
            .unwrap_or(color::WHITE);
        color::css_rgba(color::mix(color::WHITE, target, coloration), alpha)
    }

    pub fn black_alpha(&self, alpha: f64) -> String {
        color::css_rgba(color::BLACK, alpha)
    }

    // ---- commands -------------------------------------------------------

    pub fn apply(&mut self, command: Command) {
        let timing = self.timing();
        match command {
            Command::TogglePlayback => {
                if self.playing() {
                    self.stop();
                } else {
                    self.start();
                }
            }
            Command::Undo => self.undo(),
            Command::EnterSelecting => self.enter_selecting_mode(),
            Command::ExitSelecting => self.exit_selecting_mode(),
            Command::PreviousLine => self.seek(self.current_time - timing.line_duration()),
            Command::NextLine => self.seek(self.current_time + timing.line_duration()),
            Command::PreviousLyric => self.seek(self.current_time - timing.lyric_duration()),
            Command::NextLyric => self.seek(self.current_time + timing.lyric_duration()),
            Command::PreviousRegion => self.jump_previous_region(),
            Command::NextRegion => self.jump_next_region(),
            Command::InsertUnit => self.advance_waiting(true),
            Command::SkipUnit => self.advance_waiting(false),
        }
    }

    /// Jumps to the start of the nearest selected region before the cursor.
    /// A region starts at a selected slot not held into from its predecessor.
    fn jump_previous_region(&mut self) {
        let timing = self.timing();
        let current = timing.slot_at_biased(self.current_time).max(0) as usize;
        let limit = current.min(self.document.outline.len());
        for slot in (0..limit).rev() {
            let cell = self.document.outline[slot];
            if cell.selected && (slot == 0 || !self.document.outline[slot - 1].hold) {
                self.seek(slot as f64 * timing.lyric_duration());
                return;
            }
        }
    }

    fn jump_next_region(&mut self) {
        let timing = self.timing();
        let current = timing.slot_at(self.current_time).max(0) as usize;
        for slot in current + 1..self.document.outline.len() {
            if self.document.outline[slot].selected && !self.document.outline[slot - 1].hold {
                self.seek(slot as f64 * timing.lyric_duration());
                return;
            }
        }
    }

    fn metronome_due(&self, old_time: f64, new_time: f64) -> bool {
        if self.metronome_mode == MetronomeMode::Off {
            return false;
        }
        let timing = self.timing();
        let old_slot = timing.slot_at(old_time);
        let new_slot = timing.slot_at(new_time);
        if old_slot == new_slot || old_slot < 0 || new_slot < 0 {
            return false;
        }
        let (old_index, new_index) = (old_slot as usize, new_slot as usize);
        if old_index >= self.document.outline.len() || new_index >= self.document.outline.len() {
            return false;
        }
        match self.metronome_mode {
            MetronomeMode::Off => false,
            MetronomeMode::EveryLyric => true,
            MetronomeMode::SelectionStart => {
                self.document.outline[new_index].selected && !self.document.outline[old_index].hold
            }
            MetronomeMode::FilledLyric => self.document.lyrics[new_index]
                .iter()
                .any(|cell| !cell.content.is_empty()),
        }
    }
}
