//! Splitting a core into sentence or paragraph segments.
//!
//! Boundaries are searched in the plain-text projection of the core, where
//! placeholders are invisible, and then mapped back to cut points in the token
//! list. A cut that falls at the end of a text token is placed directly after that
//! token, so codes opening the next sentence travel with it.

use unic_langid::LanguageIdentifier;

use crate::{
    config::SegmentationMode,
    placeholder::{Token, has_visible_text, plain_text, render},
};

const TERMINATORS: &[char] = &['.', '!', '?', '…', '。', '！', '？'];
const FULL_WIDTH_TERMINATORS: &[char] = &['。', '！', '？'];
const CLOSERS: &[char] = &[
    '"', '\'', ')', ']', '}', '»', '”', '’', '」', '』', '）', '】',
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub tokens: Vec<Token>,
    /// Holds at least one non-whitespace text character.
    pub translatable: bool,
    /// Some later segment of the same core is translatable.
    pub has_translatable_successor: bool,
}

impl Segment {
    pub fn new(tokens: Vec<Token>) -> Self {
        let translatable = has_visible_text(&tokens);
        Self {
            tokens,
            translatable,
            has_translatable_successor: false,
        }
    }

    /// Inline XLIFF markup of the segment.
    pub fn source(&self) -> String {
        render(&self.tokens)
    }
}

/// Sets `has_translatable_successor` on every segment.
pub fn link_successors(segments: &mut [Segment]) {
    let mut seen_translatable = false;
    for segment in segments.iter_mut().rev() {
        segment.has_translatable_successor = seen_translatable;
        seen_translatable |= segment.translatable;
    }
}

/// Language-dependent sentence boundary rules.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BoundaryRules {
    abbreviations: &'static [&'static str],
    /// Script without spaces between sentences.
    spaceless: bool,
}

impl BoundaryRules {
    fn for_locale(locale: &LanguageIdentifier) -> Self {
        let language = locale.language.as_str();
        let abbreviations: &'static [&'static str] = match language {
            "de" => &[
                "z.b", "bzw", "usw", "nr", "dr", "ca", "vgl", "u.a", "d.h", "prof", "str", "evtl",
            ],
            "fr" => &["m", "mme", "mlle", "dr", "etc", "p.ex", "cf", "av", "bd", "env"],
            "es" => &["sr", "sra", "srta", "dr", "dra", "etc", "p.ej", "ud", "uds", "pág"],
            "it" => &["sig", "sig.ra", "dott", "ecc", "p.es", "pag", "avv"],
            "nl" => &["dhr", "mevr", "bijv", "o.a", "enz", "d.w.z", "nr"],
            "pt" => &["sr", "sra", "dr", "dra", "etc", "p.ex", "pág", "av"],
            _ => &[
                "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e",
                "no", "fig", "inc", "ltd", "co", "approx", "dept", "est",
            ],
        };
        Self {
            abbreviations,
            spaceless: matches!(language, "zh" | "ja"),
        }
    }

    fn is_abbreviation(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        let mut letters = word.chars().filter(|c| c.is_alphabetic());
        let single_letter = letters.next().is_some() && letters.next().is_none() && !word.contains('.');
        single_letter || self.abbreviations.contains(&word.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Walking the core; `next_cut` indexes the next unused cut point.
    Scanning { next_cut: usize },
    Done,
}

#[derive(Debug, Clone)]
pub struct Segmenter {
    mode: SegmentationMode,
    rules: BoundaryRules,
}

impl Segmenter {
    pub fn new(mode: SegmentationMode, locale: &LanguageIdentifier) -> Self {
        Self {
            mode,
            rules: BoundaryRules::for_locale(locale),
        }
    }

    /// Splits a marker-free core into segments. Concatenating the segments'
    /// tokens gives back `core`.
    pub fn segment(&self, core: &[Token]) -> Vec<Segment> {
        let plain = plain_text(core);
        let boundaries = self.boundaries(&plain);
        let cuts = cut_points(core, &boundaries);

        let mut segments = Vec::with_capacity(cuts.len() + 1);
        let mut current: Vec<Token> = Vec::new();
        let mut tokens = core.iter().enumerate();
        let mut state = State::Scanning { next_cut: 0 };

        while let State::Scanning { mut next_cut } = state {
            let Some((index, token)) = tokens.next() else {
                if !current.is_empty() || segments.is_empty() {
                    segments.push(Segment::new(std::mem::take(&mut current)));
                }
                state = State::Done;
                continue;
            };
            match token {
                Token::Text(text) => {
                    let mut from = 0;
                    while let Some(&(_, offset)) = cuts
                        .get(next_cut)
                        .filter(|(cut_token, _)| *cut_token == index)
                    {
                        current.push(Token::Text(text[from..offset].to_string()));
                        segments.push(Segment::new(std::mem::take(&mut current)));
                        from = offset;
                        next_cut += 1;
                    }
                    if from < text.len() {
                        current.push(Token::Text(text[from..].to_string()));
                    }
                }
                other => current.push(other.clone()),
            }
            state = State::Scanning { next_cut };
        }

        link_successors(&mut segments);
        segments
    }

    /// Byte offsets into `plain` where a new segment starts.
    fn boundaries(&self, plain: &str) -> Vec<usize> {
        let mut boundaries = paragraph_boundaries(plain);
        if self.mode == SegmentationMode::Sentence {
            boundaries.extend(self.sentence_boundaries(plain));
        }
        boundaries.retain(|&b| b > 0 && b < plain.len());
        boundaries.sort_unstable();
        boundaries.dedup();
        boundaries
    }

    fn sentence_boundaries(&self, plain: &str) -> Vec<usize> {
        let chars: Vec<(usize, char)> = plain.char_indices().collect();
        let mut boundaries = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let (position, c) = chars[i];
            if !TERMINATORS.contains(&c) {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < chars.len() && TERMINATORS.contains(&chars[j].1) {
                j += 1;
            }
            while j < chars.len() && CLOSERS.contains(&chars[j].1) {
                j += 1;
            }
            let mut k = j;
            while k < chars.len() && chars[k].1.is_whitespace() {
                k += 1;
            }

            let full_width = FULL_WIDTH_TERMINATORS.contains(&chars[j - 1].1)
                || FULL_WIDTH_TERMINATORS.contains(&c);
            let boundary = if full_width && self.rules.spaceless {
                true
            } else if k == j {
                false
            } else if c == '.' && j == i + 1 && self.rules.is_abbreviation(word_before(plain, position)) {
                false
            } else {
                !chars.get(k).is_some_and(|(_, next)| next.is_lowercase())
            };

            if boundary {
                boundaries.push(chars.get(k).map_or(plain.len(), |(offset, _)| *offset));
            }
            i = k.max(i + 1);
        }
        boundaries
    }
}

/// Ends of whitespace runs holding at least two line breaks.
fn paragraph_boundaries(plain: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut run_breaks = 0;
    let mut in_run = false;
    for (offset, c) in plain.char_indices() {
        if c.is_whitespace() {
            in_run = true;
            if c == '\n' {
                run_breaks += 1;
            }
        } else {
            if in_run && run_breaks >= 2 {
                boundaries.push(offset);
            }
            in_run = false;
            run_breaks = 0;
        }
    }
    boundaries
}

/// The run of letters and dots directly before byte `end`.
fn word_before(plain: &str, end: usize) -> &str {
    let head = &plain[..end];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic() || *c == '.')
        .last()
        .map_or(end, |(offset, _)| offset);
    &head[start..]
}

/// Maps plain-text boundaries to `(text token index, byte offset in its text)`.
///
/// A boundary belongs to the text token it ends or falls inside of, never to the
/// start of the following one.
fn cut_points(core: &[Token], boundaries: &[usize]) -> Vec<(usize, usize)> {
    let mut cuts = Vec::with_capacity(boundaries.len());
    let mut boundaries = boundaries.iter().peekable();
    let mut plain_start = 0;

    for (index, token) in core.iter().enumerate() {
        let Token::Text(text) = token else {
            continue;
        };
        let plain_end = plain_start + text.len();
        while let Some(&&boundary) = boundaries.peek() {
            if boundary > plain_end {
                break;
            }
            if boundary > plain_start {
                cuts.push((index, boundary - plain_start));
            }
            boundaries.next();
        }
        plain_start = plain_end;
    }
    cuts
}
