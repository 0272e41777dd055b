//! Tokenization and n-gram normalization of extracted text
//!
//! Text is split on Unicode word boundaries, every word is stripped of
//! leading/trailing punctuation and lowercased, and the surviving words (or
//! their characters) are expanded into contiguous n-grams. Single-character
//! words are kept and no stemming is applied.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::ValidationError;

/// Smallest accepted n-gram length
pub const MIN_NGRAM: usize = 1;
/// Largest accepted n-gram length
pub const MAX_NGRAM: usize = 20;

/// Unit the n-grams are built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// n consecutive words joined by a single space
    #[default]
    Word,
    /// n consecutive characters of the concatenated word stream
    Character,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Word => "word",
            Unit::Character => "character",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word" => Ok(Unit::Word),
            "character" => Ok(Unit::Character),
            _ => Err(ValidationError::UnknownUnit),
        }
    }
}

/// Tokenizer settings for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub unit: Unit,

    #[serde(default = "default_ngram")]
    pub min_ngram: usize,

    #[serde(default = "default_ngram")]
    pub max_ngram: usize,
}

fn default_ngram() -> usize {
    1
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            unit: Unit::Word,
            min_ngram: default_ngram(),
            max_ngram: default_ngram(),
        }
    }
}

impl TokenizerConfig {
    pub fn new(unit: Unit, min_ngram: usize, max_ngram: usize) -> Self {
        Self {
            unit,
            min_ngram,
            max_ngram,
        }
    }

    /// Returns the effective `(min, max)` bounds.
    ///
    /// `max` is forced into `[1, 20]`, then `min` into `[1, max]`, so an
    /// inverted range collapses onto `max`.
    pub fn bounds(&self) -> (usize, usize) {
        clamp_bounds(self.min_ngram, self.max_ngram)
    }

    /// Tokenizes `content` with these settings
    pub fn normalize(&self, content: &str) -> Vec<String> {
        normalize(content, self.unit, self.min_ngram, self.max_ngram)
    }
}

/// Clamps raw n-gram bounds into the accepted range
pub fn clamp_bounds(min_ngram: usize, max_ngram: usize) -> (usize, usize) {
    let max_ngram = max_ngram.clamp(MIN_NGRAM, MAX_NGRAM);
    let min_ngram = min_ngram.clamp(MIN_NGRAM, max_ngram);
    (min_ngram, max_ngram)
}

/// Splits `content` into normalized n-gram tokens.
///
/// All n-grams for `n = min..=max` are appended to one flat sequence in
/// increasing-`n`, left-to-right order. The output is a pure function of the
/// input.
pub fn normalize(content: &str, unit: Unit, min_ngram: usize, max_ngram: usize) -> Vec<String> {
    let (min_ngram, max_ngram) = clamp_bounds(min_ngram, max_ngram);
    let words = split_words(content);
    if words.is_empty() {
        return Vec::new();
    }

    match unit {
        Unit::Word => word_ngrams(&words, min_ngram, max_ngram),
        Unit::Character => {
            let chars: Vec<char> = words.iter().flat_map(|w| w.chars()).collect();
            char_ngrams(&chars, min_ngram, max_ngram)
        }
    }
}

/// Same as [`normalize`], decoding raw bytes first.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn normalize_bytes(content: &[u8], unit: Unit, min_ngram: usize, max_ngram: usize) -> Vec<String> {
    normalize(&String::from_utf8_lossy(content), unit, min_ngram, max_ngram)
}

/// Splits text into lowercase words with surrounding punctuation removed
pub fn split_words(content: &str) -> Vec<String> {
    content
        .split_word_bounds()
        .filter_map(|segment| {
            let stripped = segment.trim_matches(|c: char| !c.is_alphanumeric());
            if stripped.is_empty() {
                None
            } else {
                Some(stripped.to_lowercase())
            }
        })
        .collect()
}

fn word_ngrams(words: &[String], min_ngram: usize, max_ngram: usize) -> Vec<String> {
    let mut tokens = Vec::new();
    for n in min_ngram..=max_ngram {
        if n > words.len() {
            break;
        }
        tokens.extend(words.windows(n).map(|window| window.join(" ")));
    }
    tokens
}

fn char_ngrams(chars: &[char], min_ngram: usize, max_ngram: usize) -> Vec<String> {
    let mut tokens = Vec::new();
    for n in min_ngram..=max_ngram {
        if n > chars.len() {
            break;
        }
        tokens.extend(chars.windows(n).map(|window| window.iter().collect::<String>()));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(normalize("", Unit::Word, 1, 1).is_empty());
        assert!(normalize("  ,.; !! ", Unit::Character, 1, 3).is_empty());
    }

    #[test]
    fn test_word_unigrams() {
        let tokens = normalize("Hello, World! Hello again.", Unit::Word, 1, 1);
        assert_eq!(tokens, vec!["hello", "world", "hello", "again"]);
    }

    #[test]
    fn test_single_characters_are_kept() {
        let tokens = normalize("I have a cat", Unit::Word, 1, 1);
        assert_eq!(tokens, vec!["i", "have", "a", "cat"]);
    }

    #[test]
    fn test_word_ngrams_in_n_order() {
        let tokens = normalize("one two three", Unit::Word, 1, 2);
        assert_eq!(
            tokens,
            vec!["one", "two", "three", "one two", "two three"]
        );
    }

    #[test]
    fn test_character_ngrams() {
        let tokens = normalize("what are you doing", Unit::Character, 1, 3);
        let stream: Vec<char> = "whatareyoudoing".chars().collect();
        let mut expected = Vec::new();
        for n in 1..=3 {
            for window in stream.windows(n) {
                expected.push(window.iter().collect::<String>());
            }
        }
        assert_eq!(tokens, expected);
        assert_eq!(tokens[0], "w");
        assert_eq!(tokens[15], "wh");
        assert_eq!(tokens[29], "wha");
    }

    #[test]
    fn test_inverted_bounds_collapse_to_max() {
        let text = "alpha beta gamma";
        assert_eq!(clamp_bounds(3, 1), (1, 1));
        assert_eq!(
            normalize(text, Unit::Word, 3, 1),
            normalize(text, Unit::Word, 1, 1)
        );
    }

    #[test]
    fn test_bounds_are_clamped() {
        assert_eq!(clamp_bounds(0, 0), (1, 1));
        assert_eq!(clamp_bounds(5, 100), (5, 20));
        assert_eq!(clamp_bounds(25, 30), (20, 20));
    }

    #[test]
    fn test_ngram_longer_than_input() {
        let tokens = normalize("short text", Unit::Word, 3, 4);
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_punctuation_is_stripped() {
        let tokens = normalize("\"Quoted\" (text) -- e-mail's", Unit::Word, 1, 1);
        assert!(tokens.contains(&"quoted".to_string()));
        assert!(tokens.contains(&"text".to_string()));
        assert!(tokens.iter().all(|t| !t.is_empty()));
        assert!(!tokens.iter().any(|t| t.contains('"') || t.contains('(')));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let bytes = b"caf\xff latte";
        let tokens = normalize_bytes(bytes, Unit::Word, 1, 1);
        assert_eq!(tokens.last().map(String::as_str), Some("latte"));
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!("word".parse::<Unit>(), Ok(Unit::Word));
        assert_eq!("Character".parse::<Unit>(), Ok(Unit::Character));
        assert!("sentence".parse::<Unit>().is_err());
    }
}
