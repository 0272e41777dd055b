//! Similarity metrics over token sequences
//!
//! Every metric returns a score in `[0, 100]`. Jaccard and cosine look at the
//! set of distinct tokens; fuzzy and simhash use the full sequence.

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hasher;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::results::{MetricDistance, Score};
use crate::utils::round2;

/// Width of the simhash fingerprint in bits
pub const SIMHASH_BITS: u32 = 64;

/// Distance metric used to score two token sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Jaccard,
    #[default]
    Cosine,
    Fuzzy,
    Simhash,
}

impl Metric {
    /// All metrics, in the order they are reported
    pub const ALL: [Metric; 4] = [Metric::Jaccard, Metric::Cosine, Metric::Fuzzy, Metric::Simhash];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Jaccard => "jaccard",
            Metric::Cosine => "cosine",
            Metric::Fuzzy => "fuzzy",
            Metric::Simhash => "simhash",
        }
    }

    /// Comma-separated list of supported metric names
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(Metric::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Scores two token sequences with this metric
    pub fn score<S: AsRef<str>>(&self, a: &[S], b: &[S]) -> f64 {
        match self {
            Metric::Jaccard => jaccard_similarity(a, b),
            Metric::Cosine => cosine_similarity(a, b),
            Metric::Fuzzy => fuzzy_similarity(a, b),
            Metric::Simhash => simhash_similarity(a, b),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jaccard" => Ok(Metric::Jaccard),
            "cosine" => Ok(Metric::Cosine),
            "fuzzy" => Ok(Metric::Fuzzy),
            "simhash" => Ok(Metric::Simhash),
            _ => Err(ValidationError::UnknownMetric(Metric::supported())),
        }
    }
}

fn distinct<S: AsRef<str>>(tokens: &[S]) -> HashSet<&str> {
    tokens.iter().map(AsRef::as_ref).collect()
}

/// `|A ∩ B| / |A ∪ B| * 100` over distinct tokens, rounded to 2 decimals
pub fn jaccard_similarity<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a = distinct(a);
    let b = distinct(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    round2(intersection as f64 / union as f64 * 100.0)
}

/// Cosine of the 0/1 presence vectors, rounded to 2 decimals
pub fn cosine_similarity<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a = distinct(a);
    let b = distinct(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count() as f64;
    let norm = (a.len() as f64).sqrt() * (b.len() as f64).sqrt();
    round2(intersection / norm * 100.0)
}

/// Token-sort ratio of the space-joined sequences, as an integer percentage
pub fn fuzzy_similarity<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let a = sorted_tokens(&join(a));
    let b = sorted_tokens(&join(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    (ratio(&a, &b) * 100.0).round()
}

/// `100 - hamming(simhash(A), simhash(B))`, clamped to `[0, 100]`
pub fn simhash_similarity<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let distance = hamming_distance(simhash(a), simhash(b));
    100u32.saturating_sub(distance).min(100) as f64
}

fn join<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercases, replaces non-alphanumerics with spaces, sorts the words and
/// joins them back with single spaces
fn sorted_tokens(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

/// Normalized indel similarity `(|a| + |b| - distance) / (|a| + |b|)`,
/// where substitutions cost two edits
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let lcs = longest_common_subsequence(&a, &b);
    (2 * lcs) as f64 / total as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut previous = vec![0usize; short.len() + 1];
    let mut current = vec![0usize; short.len() + 1];
    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            current[j + 1] = if lc == sc {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[short.len()]
}

/// 64-bit simhash fingerprint of a token sequence.
///
/// Each distinct token contributes its FNV-1a hash weighted by the number of
/// times it occurs.
pub fn simhash<S: AsRef<str>>(tokens: &[S]) -> u64 {
    let mut weights: HashMap<&str, i64> = HashMap::new();
    for token in tokens {
        *weights.entry(token.as_ref()).or_insert(0) += 1;
    }

    let mut vector = [0i64; SIMHASH_BITS as usize];
    for (token, weight) in weights {
        let hash = feature_hash(token);
        for (bit, slot) in vector.iter_mut().enumerate() {
            if hash >> bit & 1 == 1 {
                *slot += weight;
            } else {
                *slot -= weight;
            }
        }
    }

    vector
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0)
        .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit))
}

fn feature_hash(token: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(token.as_bytes());
    hasher.finish()
}

/// Number of differing bits between two fingerprints
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Scores two token lists under each named metric.
///
/// Names are trimmed and lowercased; an empty selection means every metric.
/// Unknown names produce a message in place of the score instead of failing
/// the whole comparison.
pub fn distances<S: AsRef<str>>(a: &[S], b: &[S], selected: &[String]) -> Vec<MetricDistance> {
    let mut names: Vec<String> = selected
        .iter()
        .map(|name| {
            name.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
                .to_lowercase()
        })
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        names = Metric::ALL.iter().map(|m| m.as_str().to_string()).collect();
    }

    names
        .into_iter()
        .map(|name| {
            let score = match name.parse::<Metric>() {
                Ok(metric) => Score::Value(metric.score(a, b)),
                Err(_) => Score::Missing(format!(
                    "Distance metric {} do not existed, we support only {}",
                    name,
                    Metric::supported()
                )),
            };
            MetricDistance::new(name, score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_jaccard_example() {
        let a = toks("a b c");
        let b = toks("b c d");
        assert_eq!(jaccard_similarity(&a, &b), 50.0);
    }

    #[test]
    fn test_jaccard_properties() {
        let a = toks("the cat sat on the mat");
        let b = toks("the dog sat on a log");
        assert_eq!(jaccard_similarity(&a, &b), jaccard_similarity(&b, &a));
        assert_eq!(jaccard_similarity(&a, &a), 100.0);
        let empty: Vec<String> = Vec::new();
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
        let score = jaccard_similarity(&a, &b);
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_jaccard_ignores_multiplicity() {
        let a = toks("x x x y");
        let b = toks("x y");
        assert_eq!(jaccard_similarity(&a, &b), 100.0);
    }

    #[test]
    fn test_cosine_properties() {
        let a = toks("a b c");
        let b = toks("b c d e");
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        assert_eq!(cosine_similarity(&a, &a), 100.0);
        // 2 / (sqrt(3) * sqrt(4)) = 0.57735
        assert_eq!(cosine_similarity(&a, &b), 57.74);
        let empty: Vec<String> = Vec::new();
        assert_eq!(cosine_similarity(&a, &empty), 0.0);
    }

    #[test]
    fn test_fuzzy_is_order_insensitive() {
        let a = toks("new york mets");
        let b = toks("mets new york");
        assert_eq!(fuzzy_similarity(&a, &b), 100.0);
    }

    #[test]
    fn test_fuzzy_partial_match() {
        let a = toks("kitten");
        let b = toks("sitting");
        // lcs("kitten", "sitting") = 4 -> 8 / 13
        assert_eq!(fuzzy_similarity(&a, &b), 62.0);
        let empty: Vec<String> = Vec::new();
        assert_eq!(fuzzy_similarity(&a, &empty), 0.0);
    }

    #[test]
    fn test_simhash_identical() {
        let a = toks("the quick brown fox jumps over the lazy dog");
        assert_eq!(simhash(&a), simhash(&a));
        assert_eq!(simhash_similarity(&a, &a), 100.0);
    }

    #[test]
    fn test_simhash_symmetric_and_bounded() {
        let a = toks("the quick brown fox jumps over the lazy dog");
        let b = toks("lorem ipsum dolor sit amet consectetur adipiscing elit");
        let ab = simhash_similarity(&a, &b);
        assert_eq!(ab, simhash_similarity(&b, &a));
        assert!((0.0..=100.0).contains(&ab));
        assert!(ab >= (100 - SIMHASH_BITS) as f64);
    }

    #[test]
    fn test_simhash_empty() {
        let a = toks("some words");
        let empty: Vec<String> = Vec::new();
        assert_eq!(simhash_similarity(&a, &empty), 0.0);
        assert_eq!(simhash_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance(0, 0), 0);
        assert_eq!(hamming_distance(0, u64::MAX), 64);
        assert_eq!(hamming_distance(0b1010, 0b0110), 2);
    }

    #[test]
    fn test_distances_with_unknown_metric() {
        let a = toks("a b");
        let b = toks("a c");
        let result = distances(&a, &b, &["jaccard".to_string(), "euclid".to_string()]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], MetricDistance::new("jaccard", Score::Value(33.33)));
        match &result[1].score {
            Score::Missing(msg) => assert!(msg.starts_with("Distance metric euclid do not existed")),
            other => panic!("unexpected score {:?}", other),
        }
    }

    #[test]
    fn test_distances_default_to_all() {
        let a = toks("a b");
        let result = distances(&a, &a, &[]);
        let names: Vec<&str> = result.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["jaccard", "cosine", "fuzzy", "simhash"]);

        let blank = distances(&a, &a, &[" ".to_string()]);
        assert_eq!(blank.len(), 4);
    }

    #[test]
    fn test_distances_normalize_names() {
        let a = toks("a b");
        let b = toks("a c");
        let result = distances(&a, &b, &[" Jaccard ".to_string(), "'COSINE'".to_string()]);
        assert_eq!(result[0], MetricDistance::new("jaccard", Score::Value(33.33)));
        assert_eq!(result[1].name, "cosine");
        assert!(result[1].score.value().is_some());
    }

    #[test]
    fn test_distances_serialize_as_single_key_maps() {
        let a = toks("a b");
        let b = toks("a c");
        let result = distances(&a, &b, &["jaccard".to_string(), "Euclid".to_string()]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"jaccard": 33.33},
                {"euclid": "Distance metric euclid do not existed, we support only jaccard, cosine, fuzzy, simhash"}
            ])
        );
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("Jaccard".parse::<Metric>(), Ok(Metric::Jaccard));
        assert_eq!(
            "bogus".parse::<Metric>(),
            Err(ValidationError::UnknownMetric(
                "jaccard, cosine, fuzzy, simhash".to_string()
            ))
        );
    }
}
