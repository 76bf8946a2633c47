//! The `.kmp` project container: a self-describing keyed binary encoding of
//! the full document, audio payload included.

use crate::document::Document;
use crate::{KaraError, Result};

pub const KMP_EXTENSION: &str = "kmp";
pub const PROJECT_VERSION: u32 = 1;

pub fn encode(document: &Document) -> Result<Vec<u8>> {
    Ok(bson::to_vec(document)?)
}

/// Decodes a project file into a fresh document. Failure never touches any
/// live document; callers swap the result in only on success.
pub fn decode(bytes: &[u8]) -> Result<Document> {
    let document: Document = bson::from_slice(bytes)?;
    if document.version != PROJECT_VERSION {
        return Err(KaraError::msg(format!(
            "unsupported project version {}",
            document.version
        )));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn sample_document() -> Document {
        let mut document = Document::new(vec![0x52, 0x49, 0x46, 0x46, 0x00, 0xff]);
        document.grow_grid(2.0);
        document.add_voice();
        document.lyrics[1][0].content = "so.".to_string();
        document.lyrics[1][0].hold = true;
        document.outline[2].selected = true;
        document.set_waiting_lyrics("line one\nline two");
        document.waiting_lyrics_position = 4;
        document.track.start = 0.5;
        document.metronome_volume = 60.0;
        document
    }

    #[test]
    fn round_trips_the_full_document() {
        let original = sample_document();
        let bytes = encode(&original).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded.track.data, original.track.data);
        assert_eq!(decoded.track.start, original.track.start);
        assert_eq!(decoded.track.bpm, original.track.bpm);
        assert_eq!(decoded.voices.len(), original.voices.len());
        assert_eq!(decoded.lyrics, original.lyrics);
        assert_eq!(decoded.outline, original.outline);
        assert_eq!(decoded.waiting_lyrics, original.waiting_lyrics);
        assert_eq!(
            decoded.waiting_lyrics_position,
            original.waiting_lyrics_position
        );
        assert_eq!(decoded.metronome_volume, original.metronome_volume);
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(decode(&[0x01, 0x02, 0x03]).is_err());
    }

    #[test]
    fn rejects_unknown_versions() {
        let mut document = sample_document();
        document.version = 9;
        let bytes = encode(&document).unwrap();
        assert!(matches!(decode(&bytes), Err(KaraError::Message(_))));
    }
}
