use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Literal placed instead of a score when a sub page could not be compared
pub const PAGE_NOT_FOUND: &str = "Page not found";

/// Synthetic status code recorded for timeouts and transport failures
pub const SYNTHETIC_STATUS: u16 = 408;

/// State of one URL across crawl, extraction and tokenization.
///
/// `content` first holds the decoded response body and is overwritten in
/// place with the extracted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Raw body after the crawl, extracted text after extraction
    #[serde(default)]
    pub content: String,

    /// Human-readable failure reason
    #[serde(default)]
    pub error: Option<String>,

    /// HTTP status, or the synthetic 408 for transport failures.
    /// Absent when the URL was never dispatched.
    #[serde(default)]
    pub code: Option<u16>,

    /// True only when the fetch succeeded with a success status
    #[serde(default)]
    pub ok: bool,

    /// When the page was fetched; only set for cached pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawled_date: Option<String>,

    /// Normalized tokens of the extracted text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
}

impl Page {
    /// A successfully fetched page
    pub fn fetched(content: String, code: u16) -> Self {
        Self {
            content,
            code: Some(code),
            ok: true,
            ..Self::default()
        }
    }

    /// A page whose fetch failed
    pub fn failed(error: impl Into<String>, code: Option<u16>) -> Self {
        Self {
            error: Some(error.into()),
            code,
            ..Self::default()
        }
    }

    /// True if the page has an error or no text to compare
    pub fn is_missing(&self) -> bool {
        self.error.is_some() || self.content.trim().is_empty()
    }
}

/// A similarity score, or the reason there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Value(f64),
    Missing(String),
}

impl Score {
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Value(v) => Some(*v),
            Score::Missing(_) => None,
        }
    }

    /// Total order used for ranking: numeric scores descending, then
    /// missing entries, which compare equal among themselves
    pub fn rank_cmp(&self, other: &Score) -> Ordering {
        match (self, other) {
            (Score::Value(a), Score::Value(b)) => b.total_cmp(a),
            (Score::Value(_), Score::Missing(_)) => Ordering::Less,
            (Score::Missing(_), Score::Value(_)) => Ordering::Greater,
            (Score::Missing(_), Score::Missing(_)) => Ordering::Equal,
        }
    }
}

/// `(url, score)` pair, serialized as a two-element array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEntry(pub String, pub Score);

impl SimilarityEntry {
    pub fn url(&self) -> &str {
        &self.0
    }

    pub fn score(&self) -> &Score {
        &self.1
    }
}

/// Sorts entries numeric-first, descending.
///
/// The sort is stable, so missing entries keep the order in which their URLs
/// were supplied.
pub fn rank(entries: &mut [SimilarityEntry]) {
    entries.sort_by(|a, b| a.1.rank_cmp(&b.1));
}

/// Outcome of comparing one main page against its sub pages
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Main page produced no text, so nothing was compared
    MainPageEmpty,
    /// Ranked sub page scores
    Ranked(Vec<SimilarityEntry>),
}

impl CheckOutcome {
    pub fn entries(&self) -> &[SimilarityEntry] {
        match self {
            CheckOutcome::MainPageEmpty => &[],
            CheckOutcome::Ranked(entries) => entries,
        }
    }
}

/// Pairwise scores between three pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSimilarity {
    pub sim12: Score,
    pub sim23: Score,
    pub sim13: Score,
}

/// Score under one named metric, serialized as `{"<name>": <score>}`
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDistance {
    pub name: String,
    pub score: Score,
}

impl MetricDistance {
    pub fn new(name: impl Into<String>, score: Score) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

impl Serialize for MetricDistance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.score)?;
        map.end()
    }
}

/// Per-metric scores between two raw contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSimilarity {
    pub tokens_1: Vec<String>,
    pub tokens_2: Vec<String>,
    pub distances: Vec<MetricDistance>,
}

/// Per-metric scores between three raw contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentCrossSimilarity {
    pub tokens_1: Vec<String>,
    pub tokens_2: Vec<String>,
    pub tokens_3: Vec<String>,
    pub distances12: Vec<MetricDistance>,
    pub distances23: Vec<MetricDistance>,
    pub distances13: Vec<MetricDistance>,
}
