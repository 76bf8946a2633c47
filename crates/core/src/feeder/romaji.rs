//! Romanized-Japanese helpers for the feeder's transliteration mode.

/// Splits romanized Japanese text into kana-sized units.
///
/// A unit is a consonant cluster plus its vowel (`shi`, `kyo`, `tsu`), a bare
/// vowel, or a syllabic `n`. Doubled consonants fold into the following unit
/// (`katta` → `ka`, `tta`). Non-letter characters attach to the unit before
/// them so punctuation and spacing travel with the syllable they follow.
pub fn split(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if !c.is_alphabetic() {
            match tokens.last_mut() {
                Some(last) => last.push(c),
                None => tokens.push(c.to_string()),
            }
            i += 1;
            continue;
        }

        if is_vowel(c) {
            tokens.push(c.to_string());
            i += 1;
            continue;
        }

        if c.eq_ignore_ascii_case(&'n') && !starts_syllable(chars.get(i + 1)) {
            tokens.push(c.to_string());
            i += 1;
            continue;
        }

        let mut token = String::new();
        while i < chars.len() && chars[i].is_alphabetic() && !is_vowel(chars[i]) {
            token.push(chars[i]);
            i += 1;
        }
        if i < chars.len() && is_vowel(chars[i]) {
            token.push(chars[i]);
            i += 1;
        }
        tokens.push(token);
    }

    tokens
}

/// Normalizes Hepburn-style text into the spelling the splitter expects:
/// lowercases everything except all-caps foreign words, rewrites particle
/// spellings, and expands macron vowels.
pub fn normalize(text: &str) -> String {
    let mut out = String::new();
    let mut word = String::new();
    for ch in text.chars() {
        if ch.is_alphabetic() {
            word.push(ch);
        } else {
            flush_word(&mut out, &mut word);
            out.push(ch);
        }
    }
    flush_word(&mut out, &mut word);
    out
}

fn flush_word(out: &mut String, word: &mut String) {
    if word.is_empty() {
        return;
    }
    let foreign = word.chars().all(char::is_uppercase);
    let mut w = std::mem::take(word);
    if !foreign {
        w = w.to_lowercase();
        match w.chars().count() {
            1 => {
                w = match w.as_str() {
                    "e" => "he".to_string(),
                    "o" => "wo".to_string(),
                    "a" => "wa".to_string(),
                    _ => w,
                };
            }
            2 => {
                if w == "ha" {
                    w = "wa".to_string();
                }
            }
            _ => {}
        }
        w = w
            .replace('ī', "ii")
            .replace('ū', "uu")
            .replace('ō', "ou")
            .replace('ā', "aa")
            .replace('ē', "ei");
    }
    out.push_str(&w);
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Whether the character after an `n` makes it the onset of a syllable
/// rather than a syllabic `n`.
fn starts_syllable(next: Option<&char>) -> bool {
    match next {
        Some(&c) => is_vowel(c) || c.eq_ignore_ascii_case(&'y'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_vec(text: &str) -> Vec<String> {
        split(text)
    }

    #[test]
    fn splits_plain_syllables() {
        assert_eq!(split_vec("sakura"), vec!["sa", "ku", "ra"]);
        assert_eq!(split_vec("arigatou"), vec!["a", "ri", "ga", "to", "u"]);
    }

    #[test]
    fn splits_digraphs() {
        assert_eq!(split_vec("shinjitsu"), vec!["shi", "n", "ji", "tsu"]);
        assert_eq!(split_vec("kyou"), vec!["kyo", "u"]);
        assert_eq!(split_vec("chikara"), vec!["chi", "ka", "ra"]);
    }

    #[test]
    fn syllabic_n_stands_alone() {
        assert_eq!(split_vec("konnichiwa"), vec!["ko", "n", "ni", "chi", "wa"]);
        assert_eq!(split_vec("hon"), vec!["ho", "n"]);
        assert_eq!(split_vec("nya"), vec!["nya"]);
    }

    #[test]
    fn doubled_consonants_fold_forward() {
        assert_eq!(split_vec("katta"), vec!["ka", "tta"]);
        assert_eq!(split_vec("zutto"), vec!["zu", "tto"]);
    }

    #[test]
    fn punctuation_attaches_to_the_previous_unit() {
        assert_eq!(split_vec("sora wo"), vec!["so", "ra ", "wo"]);
        assert_eq!(split_vec("ne,"), vec!["ne,"]);
        assert_eq!(split_vec("!?"), vec!["!?"]);
    }

    #[test]
    fn normalize_rewrites_particles_and_macrons() {
        assert_eq!(normalize("Tōkyō e"), "toukyou he");
        assert_eq!(normalize("kimi ha"), "kimi wa");
        assert_eq!(normalize("sora o"), "sora wo");
    }

    #[test]
    fn normalize_keeps_acronyms() {
        assert_eq!(normalize("OK desu"), "OK desu");
    }
}
