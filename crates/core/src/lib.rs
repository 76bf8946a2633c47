//! Core engine for the Karabeat karaoke subtitle authoring tool.
//!
//! The crate owns everything below the UI: the tempo-derived lyric grid, the
//! editable document and its undo history, the sentence segmentation that
//! drives the karaoke display, the waiting-text feeder, the selecting-mode
//! state machine, and the project and markup codecs. Audio decoding stays
//! behind a small capability trait so the engine never links a codec.

pub mod audio;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod feeder;
pub mod grid;
pub mod history;
pub mod project;
pub mod sentence;

pub use audio::{AudioDecoder, DecodedAudio, PlaybackClock};
pub use document::{AudioTrack, Document, LyricCell, OutlineCell, Voice};
pub use editor::{Command, Editor, MetronomeMode};
pub use error::{KaraError, Result};
pub use feeder::{InsertionMode, WaitingUnit};
pub use grid::Timing;
pub use history::History;
pub use sentence::{Sentence, SentenceLyric};
