//! Serializes the document's sentence segmentation into ASS karaoke markup
//! with per-syllable fill timing codes.

use crate::document::{Document, Voice};
use crate::editor::color;
use crate::sentence;

/// Lead applied to the karaoke comment line's start, in seconds.
const COMMENT_LEAD: f64 = 0.9;
/// Trim applied to the karaoke comment line's end, in seconds.
const COMMENT_TRIM: f64 = 0.2;
/// Fixed fade-in directive prefixed to every dialogue line.
const DIALOGUE_PREFIX: &str = "{\\k90\\fad(300,200)}";

const SCRIPT_TEMPLATE: &str = "\
[Script Info]
Title: Karabeat export
ScriptType: v4.00+
WrapStyle: 0
ScaledBorderAndShadow: yes
PlayResX: 1920
PlayResY: 1080

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
{voices}

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
{comments}{dialogs}";

/// Renders the whole document as an ASS script.
pub fn export(document: &Document) -> String {
    let lyric_duration = document.timing().lyric_duration();
    let track_start = document.track.start;

    let voices = document
        .voices
        .iter()
        .map(style_line)
        .collect::<Vec<_>>()
        .join("\n");

    let mut comments = String::new();
    let mut dialogs = String::new();
    for sentence in sentence::sentences(document, 0.0) {
        let text = syllable_codes(&sentence.lyrics, lyric_duration);
        let style = document
            .voices
            .get(sentence.voice)
            .map(|voice| voice.name.as_str())
            .unwrap_or("Default");

        comments.push_str(&format!(
            "Comment: 0,{},{},{},,0,0,0,karaoke,{}\n",
            timestamp(sentence.start_time + COMMENT_LEAD + track_start),
            timestamp(sentence.end_time - COMMENT_TRIM + track_start),
            style,
            text,
        ));
        dialogs.push_str(&format!(
            "Dialogue: 0,{},{},{},,0,0,0,fx,{}{}\n",
            timestamp(sentence.start_time + track_start),
            timestamp(sentence.end_time + track_start),
            style,
            DIALOGUE_PREFIX,
            text,
        ));
    }

    SCRIPT_TEMPLATE
        .replace("{voices}", &voices)
        .replace("{comments}", &comments)
        .replace("{dialogs}", &dialogs)
}

/// Karaoke timing codes for one sentence. A syllable spanning a hold gets a
/// two-part code: the fill sweep over the held span, then the remaining gap
/// to the next syllable; a plain syllable gets a single code covering the
/// whole gap. All values are floored centiseconds.
fn syllable_codes(lyrics: &[sentence::SentenceLyric], lyric_duration: f64) -> String {
    let mut text = String::new();
    for (index, lyric) in lyrics.iter().enumerate() {
        let diff = match lyrics.get(index + 1) {
            Some(next) => (next.slot as i64 - lyric.end as i64 + 1) as f64 * lyric_duration,
            None => lyric_duration,
        };

        if lyric.end != lyric.slot + 1 {
            let fill = ((lyric.end - lyric.slot) as f64 * lyric_duration * 100.0).floor() as i64;
            let rest = ((diff - lyric_duration) * 100.0).floor() as i64;
            text.push_str(&format!("{{\\kf{}}}{}{{\\k{}}}", fill, lyric.content, rest));
        } else {
            let gap = (diff * 100.0).floor() as i64;
            text.push_str(&format!("{{\\k{}}}{}", gap, lyric.content));
        }
    }
    text
}

/// One style entry per voice. The voice color lands in the secondary slot,
/// the one karaoke sweeps from, encoded in the markup's reversed channel
/// order with a leading zero alpha.
fn style_line(voice: &Voice) -> String {
    format!(
        "Style: {},Arial,48,&H00FFFFFF,{},&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,3,1,2,30,30,60,1",
        voice.name,
        ass_color(&voice.color),
    )
}

fn ass_color(hex: &str) -> String {
    let [r, g, b] = color::parse_hex(hex).unwrap_or(color::WHITE);
    format!("&H00{:02X}{:02X}{:02X}", b, g, r)
}

/// `H:MM:SS.cc`, clamped at zero since sentence lead-ins can reach before the
/// track origin.
fn timestamp(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).floor() as u64;
    let cs = total_cs % 100;
    let s = (total_cs / 100) % 60;
    let m = (total_cs / 6000) % 60;
    let h = total_cs / 360000;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
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

    fn karaoke_codes(line: &str) -> Vec<i64> {
        let mut codes = Vec::new();
        let mut rest = line;
        while let Some(start) = rest.find("{\\k") {
            let tail = &rest[start + 3..];
            let tail = tail.strip_prefix('f').unwrap_or(tail);
            let Some(end) = tail.find('}') else { break };
            codes.push(tail[..end].parse().unwrap());
            rest = &tail[end..];
        }
        codes
    }

    #[test]
    fn exports_one_comment_and_dialogue_line_per_sentence() {
        let mut document = document_with_grid(16);
        document.add_voice();
        for slot in 0..3 {
            document.lyrics[slot][0].content = format!("a{slot}");
            document.lyrics[slot][1].content = format!("b{slot}");
        }
        document.lyrics[2][0].content.push('.');
        document.lyrics[2][1].content.push('.');

        let script = export(&document);
        assert_eq!(script.matches("Comment: 0,").count(), 2);
        assert_eq!(script.matches("Dialogue: 0,").count(), 2);
        assert_eq!(script.matches("Style: ").count(), 2);
    }

    #[test]
    fn syllable_codes_sum_to_the_sentence_span() {
        let mut document = document_with_grid(16);
        for slot in 0..3 {
            document.lyrics[slot][0].content = format!("s{slot}");
        }
        document.lyrics[2][0].content.push('.');

        let script = export(&document);
        let comment = script
            .lines()
            .find(|line| line.starts_with("Comment:"))
            .unwrap();
        let codes = karaoke_codes(comment);
        // Three syllables, one lyric duration (25 cs) each.
        assert_eq!(codes, vec![25, 25, 25]);
    }

    #[test]
    fn held_syllables_emit_fill_and_gap_codes() {
        let mut document = document_with_grid(16);
        document.lyrics[0][0].content = "haa".to_string();
        document.lyrics[0][0].hold = true;
        document.lyrics[1][0].hold = true;
        document.lyrics[4][0].content = "to.".to_string();

        let script = export(&document);
        let comment = script
            .lines()
            .find(|line| line.starts_with("Comment:"))
            .unwrap();
        // Hold spans slots 0..3 (75 cs); the gap from the hold end to the
        // next syllable at slot 4 is 25 cs; the final syllable closes with
        // one lyric duration.
        assert!(comment.contains("{\\kf75}haa{\\k25}"));
        assert!(comment.contains("{\\k25}to"));
    }

    #[test]
    fn timestamps_are_clamped_and_offset_by_the_track_start() {
        let mut document = document_with_grid(16);
        document.lyrics[0][0].content = "a.".to_string();
        // start_time = -1.0; the dialogue start clamps to zero.
        let script = export(&document);
        assert!(script.contains("Dialogue: 0,0:00:00.00,"));

        document.track.start = 2.0;
        let script = export(&document);
        // -1.0 + 2.0 = 1.0 second.
        assert!(script.contains("Dialogue: 0,0:00:01.00,"));
    }

    #[test]
    fn voice_colors_are_channel_reversed() {
        let mut document = document_with_grid(4);
        document.voices[0].color = "#ff5733".to_string();
        let script = export(&document);
        assert!(script.contains("&H003357FF"));
    }

    #[test]
    fn timestamp_formats_centiseconds() {
        assert_eq!(timestamp(0.0), "0:00:00.00");
        assert_eq!(timestamp(-3.0), "0:00:00.00");
        assert_eq!(timestamp(61.239), "0:01:01.23");
        assert_eq!(timestamp(3600.0), "1:00:00.00");
    }
}
