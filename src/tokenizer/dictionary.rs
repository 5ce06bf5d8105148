//! Dictionary-driven Hangul tokenizer.
//!
//! Multi-pass segmentation:
//! 1. NFC-normalize and split into runs (Hangul, Latin, digits, punctuation)
//! 2. Segment each Hangul run by greedy longest match against the
//!    vocabulary; unmatched stretches become single noun morphemes
//! 3. Strip a particle or verbal ending from an unmatched trailing stretch

use std::collections::HashSet;

use async_trait::async_trait;
use unicode_normalization::UnicodeNormalization;

use super::{Morpheme, PosTag, Tokenizer};
use crate::error::CollaboratorResult;
use crate::lexicon::Lexicon;

/// Longest first, so "에서" wins over "에".
const PARTICLES: &[&str] = &[
    "으로부터", "에서부터", "에게서", "으로서", "으로써", "이라는", "까지", "부터", "에서", "에게",
    "한테", "으로", "로서", "로써", "보다", "처럼", "이나", "이며", "이다", "과", "와", "은",
    "는", "이", "가", "을", "를", "의", "에", "로", "도", "만",
];

const VERBAL_ENDINGS: &[&str] = &[
    "했습니다", "습니다", "입니다", "합니다", "니다", "어요", "아요", "에요", "예요", "었다",
    "았다", "였다", "는다",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Hangul,
    Latin,
    Digit,
    Space,
    Punct,
    Other,
}

fn classify(c: char) -> CharClass {
    match c {
        '\u{AC00}'..='\u{D7A3}' | '\u{3131}'..='\u{318E}' => CharClass::Hangul,
        c if c.is_ascii_alphabetic() => CharClass::Latin,
        c if c.is_ascii_digit() => CharClass::Digit,
        c if c.is_whitespace() => CharClass::Space,
        c if c.is_alphanumeric() => CharClass::Other,
        _ => CharClass::Punct,
    }
}

#[derive(Debug)]
enum Segment {
    Known(String),
    Unknown(String),
}

#[derive(Debug, Clone, Default)]
pub struct DictionaryTokenizer {
    vocabulary: HashSet<String>,
    max_word_chars: usize,
}

impl DictionaryTokenizer {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocabulary: HashSet<String> = vocabulary
            .into_iter()
            .map(|s| s.into().nfc().collect::<String>())
            .filter(|s| !s.is_empty())
            .collect();
        let max_word_chars = vocabulary
            .iter()
            .map(|w| w.chars().count())
            .max()
            .unwrap_or(1);
        Self {
            vocabulary,
            max_word_chars,
        }
    }

    /// Use the lexicon's term texts as vocabulary.
    pub fn from_lexicon(lexicon: &Lexicon) -> Self {
        Self::new(lexicon.terms())
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Synchronous segmentation; the `Tokenizer` impl delegates here.
    pub fn segment(&self, text: &str) -> Vec<Morpheme> {
        let text: String = text.nfc().collect();
        let mut morphemes = Vec::new();

        let mut run = String::new();
        let mut run_class = CharClass::Space;
        for c in text.chars() {
            let class = classify(c);
            if class != run_class || class == CharClass::Punct {
                self.flush_run(&run, run_class, &mut morphemes);
                run.clear();
                run_class = class;
            }
            run.push(c);
        }
        self.flush_run(&run, run_class, &mut morphemes);

        morphemes
    }

    fn flush_run(&self, run: &str, class: CharClass, out: &mut Vec<Morpheme>) {
        if run.is_empty() {
            return;
        }
        match class {
            CharClass::Space => {}
            CharClass::Hangul => self.segment_hangul(run, out),
            CharClass::Latin => out.push(Morpheme::new(run, PosTag::Foreign)),
            CharClass::Digit => out.push(Morpheme::new(run, PosTag::Number)),
            CharClass::Punct => out.push(Morpheme::new(run, PosTag::Punctuation)),
            CharClass::Other => out.push(Morpheme::new(run, PosTag::Other)),
        }
    }

    fn segment_hangul(&self, word: &str, out: &mut Vec<Morpheme>) {
        let mut segments = self.longest_match(word);

        // Only an unmatched tail may carry a particle or ending; a tail that
        // is itself a vocabulary word ("한도", "결과") stays whole.
        let mut suffix = None;
        let tail = match segments.last() {
            Some(Segment::Unknown(_)) => segments.pop(),
            _ => None,
        };
        if let Some(Segment::Unknown(tail)) = tail {
            let after_word = !segments.is_empty();
            let (stem, morpheme) = self.split_suffix(&tail, after_word);
            if !stem.is_empty() {
                segments.push(Segment::Unknown(stem.to_string()));
            }
            suffix = morpheme;
        }

        out.extend(segments.into_iter().map(|segment| match segment {
            Segment::Known(text) | Segment::Unknown(text) => Morpheme::new(text, PosTag::Noun),
        }));
        out.extend(suffix);
    }

    /// Split a trailing ending or particle off an unmatched stretch.
    ///
    /// The whole stretch counts as a suffix only when it directly follows a
    /// vocabulary word ("계좌" + "를"). A one-syllable suffix is only split
    /// when the stem has at least two syllables or is itself a known word,
    /// so "평가" stays whole.
    fn split_suffix<'a>(&self, tail: &'a str, after_word: bool) -> (&'a str, Option<Morpheme>) {
        let candidates = VERBAL_ENDINGS
            .iter()
            .map(|s| (*s, PosTag::VerbalEnding))
            .chain(PARTICLES.iter().map(|s| (*s, PosTag::Particle)));

        for (suffix, tag) in candidates {
            let Some(stem) = tail.strip_suffix(suffix) else {
                continue;
            };
            if stem.is_empty() {
                if after_word {
                    return (stem, Some(Morpheme::new(suffix, tag)));
                }
                continue;
            }
            let short_suffix = suffix.chars().count() == 1;
            if short_suffix && stem.chars().count() < 2 && !self.vocabulary.contains(stem) {
                continue;
            }
            return (stem, Some(Morpheme::new(suffix, tag)));
        }
        (tail, None)
    }

    /// Greedy longest match over the vocabulary. Adjacent unmatched syllables
    /// are grouped into one unknown segment.
    fn longest_match(&self, word: &str) -> Vec<Segment> {
        let chars: Vec<char> = word.chars().collect();
        let mut segments = Vec::new();
        let mut unknown = String::new();
        let mut i = 0;

        while i < chars.len() {
            let longest = (i + 1..=chars.len().min(i + self.max_word_chars))
                .rev()
                .find(|&j| {
                    let candidate: String = chars[i..j].iter().collect();
                    self.vocabulary.contains(&candidate)
                });

            match longest {
                Some(j) => {
                    if !unknown.is_empty() {
                        segments.push(Segment::Unknown(std::mem::take(&mut unknown)));
                    }
                    segments.push(Segment::Known(chars[i..j].iter().collect()));
                    i = j;
                }
                None => {
                    unknown.push(chars[i]);
                    i += 1;
                }
            }
        }
        if !unknown.is_empty() {
            segments.push(Segment::Unknown(unknown));
        }
        segments
    }
}

#[async_trait]
impl Tokenizer for DictionaryTokenizer {
    async fn tokenize(&self, text: &str) -> CollaboratorResult<Vec<Morpheme>> {
        Ok(self.segment(text))
    }
}
