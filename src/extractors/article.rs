//! Article extraction by stopword scoring
//!
//! Every paragraph-like node with enough stopwords and little link text
//! votes for its parent (full score) and grandparent (half score). The
//! highest scoring node is taken as the article body and its paragraphs
//! become the cleaned text.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

use super::metadata;
use crate::utils::collapse_whitespace;

static CANDIDATES: LazyLock<Selector> = LazyLock::new(|| selector("p, pre, td"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[property="og:title"]"#));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Minimum stopwords for a node to take part in scoring
const MIN_STOPWORDS: usize = 3;
/// Maximum share of link words in a scoring node
const MAX_LINK_DENSITY: f64 = 0.5;

const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " » ", " : ", " — "];

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "against", "all", "also", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "between", "both", "but", "by", "can",
    "could", "did", "do", "does", "during", "each", "for", "from", "had", "has", "have", "he",
    "her", "here", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "more",
    "most", "my", "no", "not", "now", "of", "on", "once", "only", "or", "other", "our", "out",
    "over", "said", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "why", "will", "with", "would", "you", "your",
];

/// Result of an article extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub meta_description: String,
    pub meta_keywords: String,
    /// Paragraphs of the article body separated by blank lines
    pub cleaned_text: String,
}

/// Extracts the article of an HTML page
pub fn extract(raw_html: &str) -> Article {
    Article::from_document(&Html::parse_document(raw_html))
}

impl Article {
    pub fn from_document(document: &Html) -> Self {
        Self {
            title: article_title(document),
            meta_description: metadata::meta_content(document, "description"),
            meta_keywords: metadata::meta_content(document, "keywords"),
            cleaned_text: cleaned_text(document),
        }
    }
}

/// `og:title` or `<title>`, reduced to its longest separator-delimited part
pub fn article_title(document: &Html) -> String {
    let raw = document
        .select(&OG_TITLE)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| metadata::title(document));

    let mut parts = vec![raw.as_str()];
    for separator in TITLE_SEPARATORS {
        parts = parts
            .into_iter()
            .flat_map(|part| part.split(separator))
            .collect();
    }
    parts
        .into_iter()
        .map(str::trim)
        .max_by_key(|part| part.chars().count())
        .unwrap_or_default()
        .to_string()
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn stopword_count(text: &str) -> usize {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| STOPWORDS.contains(&word.as_str()))
        .count()
}

fn link_density(element: ElementRef<'_>, words: usize) -> f64 {
    if words == 0 {
        return 0.0;
    }
    let link_words: usize = element
        .select(&LINKS)
        .map(|link| element_text(link).split_whitespace().count())
        .sum();
    link_words as f64 / words as f64
}

fn is_content_node(element: ElementRef<'_>) -> Option<usize> {
    let text = element_text(element);
    let words = text.split_whitespace().count();
    let stopwords = stopword_count(&text);
    (stopwords >= MIN_STOPWORDS && link_density(element, words) < MAX_LINK_DENSITY)
        .then_some(stopwords)
}

/// Paragraph text of the best scoring node, or empty if nothing scores
pub fn cleaned_text(document: &Html) -> String {
    let mut scores = HashMap::new();
    for node in document.select(&CANDIDATES) {
        let Some(score) = is_content_node(node) else {
            continue;
        };
        let score = score as f64;
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        *scores.entry(parent.id()).or_insert(0.0) += score;
        if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
            *scores.entry(grandparent.id()).or_insert(0.0) += score / 2.0;
        }
    }

    let Some(top) = scores
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .and_then(|(id, _)| document.tree.get(id))
        .and_then(ElementRef::wrap)
    else {
        return String::new();
    };

    top.select(&CANDIDATES)
        .filter(|node| {
            let text = element_text(*node);
            !text.is_empty() && link_density(*node, text.split_whitespace().count()) < MAX_LINK_DENSITY
        })
        .map(element_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
