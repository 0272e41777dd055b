//! Main-content extraction from raw HTML
//!
//! Every strategy turns a page into a single text. The heuristic ones
//! prepend the page metadata (title, description, keywords and the words
//! of the URL) so that near-empty pages still carry something comparable.

pub mod article;
pub mod density;
pub mod metadata;
pub mod readable;
pub mod selective;
pub mod visible;
pub mod xpath;

#[cfg(test)]
mod tests;

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::ExtractConfig;
use crate::error::ValidationError;
use crate::pool::WorkerPool;
use crate::results::Page;
use crate::utils::{available_parallelism, join_fragments};

/// Query language of a selective extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    #[default]
    Css,
    Xpath,
}

impl SelectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorType::Css => "css",
            SelectorType::Xpath => "xpath",
        }
    }
}

impl FromStr for SelectorType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "css" => Ok(SelectorType::Css),
            "xpath" => Ok(SelectorType::Xpath),
            _ => Err(ValidationError::UnknownSelectorType),
        }
    }
}

/// Selector of a selective extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    #[serde(default)]
    pub selector: String,

    #[serde(default)]
    pub selector_type: SelectorType,
}

/// Extraction strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Text-density blocks
    #[default]
    Dragnet,
    /// Readability article summary
    Readability,
    /// Stopword-scored article body
    Goose,
    /// Text-density blocks, falling back to the article body
    GooseDragnet,
    /// Text of the elements matched by a CSS or XPath selector
    Selective(SelectorSpec),
    /// Every visible text node
    AllText,
}

impl ExtractorKind {
    pub const NAMES: [&'static str; 6] = [
        "dragnet",
        "readability",
        "goose",
        "goose_dragnet",
        "selective",
        "all_text",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExtractorKind::Dragnet => "dragnet",
            ExtractorKind::Readability => "readability",
            ExtractorKind::Goose => "goose",
            ExtractorKind::GooseDragnet => "goose_dragnet",
            ExtractorKind::Selective(_) => "selective",
            ExtractorKind::AllText => "all_text",
        }
    }

    pub fn is_selective(&self) -> bool {
        matches!(self, ExtractorKind::Selective(_))
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtractorKind {
    type Err = ValidationError;

    /// Parses an extractor name. `selective` comes back with an empty
    /// selector, to be filled in by the caller.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dragnet" => Ok(ExtractorKind::Dragnet),
            "readability" => Ok(ExtractorKind::Readability),
            "goose" => Ok(ExtractorKind::Goose),
            "goose_dragnet" => Ok(ExtractorKind::GooseDragnet),
            "selective" => Ok(ExtractorKind::Selective(SelectorSpec::default())),
            "all_text" => Ok(ExtractorKind::AllText),
            _ => Err(ValidationError::UnknownExtractor(s.to_string())),
        }
    }
}

/// Applies one extraction strategy to pages
#[derive(Debug, Clone, PartialEq)]
pub struct Extractor {
    kind: ExtractorKind,
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(kind: ExtractorKind, config: ExtractConfig) -> Self {
        Self { kind, config }
    }

    pub fn kind(&self) -> &ExtractorKind {
        &self.kind
    }

    /// Extracted text of one page. Never fails: a page with nothing to
    /// extract gives an empty string or its metadata only.
    pub fn extract(&self, url: &str, raw_html: &str) -> String {
        match &self.kind {
            ExtractorKind::Dragnet => dragnet(url, raw_html),
            ExtractorKind::Readability => readability(url, raw_html),
            ExtractorKind::Goose => goose(url, raw_html),
            ExtractorKind::GooseDragnet => goose_dragnet(url, raw_html),
            ExtractorKind::Selective(spec) => selective::extract(url, raw_html, spec),
            ExtractorKind::AllText => all_text(url, raw_html),
        }
    }

    /// Replaces the content of every page with its extracted text.
    ///
    /// A page without content gets its URL as content instead. Large
    /// batches are spread over a worker pool, small ones run in turn.
    pub async fn process_all(&self, pages: &mut HashMap<String, Page>) {
        let extractor = self.clone();
        let extract: ExtractFn = Arc::new(move |url: &str, raw_html: &str| extractor.extract(url, raw_html));
        self.process_with(pages, extract).await;
    }

    pub(crate) async fn process_with(&self, pages: &mut HashMap<String, Page>, extract: ExtractFn) {
        let total = pages.len();
        let mut jobs = Vec::with_capacity(total);
        for (url, page) in pages.iter_mut() {
            if page.content.is_empty() {
                page.content = url.clone();
            } else {
                jobs.push((url.clone(), std::mem::take(&mut page.content)));
            }
        }
        ::log::debug!(
            "Extracting {} of {} pages with {}",
            jobs.len(),
            total,
            self.kind
        );

        let limit = self.config.timeout();
        if total > self.config.parallel_threshold {
            let mut pool = WorkerPool::new(available_parallelism());
            for (url, raw_html) in jobs {
                let extract = Arc::clone(&extract);
                let label = url.clone();
                pool.submit(label, async move {
                    run_with_timeout(extract, limit, &url, raw_html).await
                });
            }
            for (url, text) in pool.join().await {
                if let Some(page) = pages.get_mut(&url) {
                    page.content = text.unwrap_or_default();
                }
            }
        } else {
            for (url, raw_html) in jobs {
                let text = run_with_timeout(Arc::clone(&extract), limit, &url, raw_html).await;
                if let Some(page) = pages.get_mut(&url) {
                    page.content = text;
                }
            }
        }
    }
}

/// Extraction routine of one page, given its URL and raw HTML
pub(crate) type ExtractFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Runs `extract` on the blocking pool under `limit`. A timed out or failed
/// extraction gives an empty string; the blocking thread itself is left to
/// finish on its own.
async fn run_with_timeout(extract: ExtractFn, limit: Duration, url: &str, raw_html: String) -> String {
    let task_url = url.to_string();
    let task = tokio::task::spawn_blocking(move || extract(&task_url, &raw_html));

    match timeout(limit, task).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            ::log::error!("Extraction of {} failed: {}", url, e);
            String::new()
        }
        Err(_) => {
            ::log::warn!("Extraction of {} timed out after {:?}", url, limit);
            String::new()
        }
    }
}

fn dragnet(url: &str, raw_html: &str) -> String {
    let document = Html::parse_document(raw_html);
    let mut fragments = metadata::common_info(url, &document);
    fragments.push(density::document_content(&document));
    join_fragments(fragments)
}

fn readability(url: &str, raw_html: &str) -> String {
    let document = Html::parse_document(raw_html);
    let mut fragments = metadata::common_info(url, &document);
    fragments.push(readable::summary(url, raw_html));
    join_fragments(fragments)
}

fn goose(url: &str, raw_html: &str) -> String {
    let document = Html::parse_document(raw_html);
    let mut fragments = metadata::common_info(url, &document);
    if !raw_html.trim().is_empty() {
        fragments.push(article::cleaned_text(&document));
    }
    join_fragments(fragments)
}

fn goose_dragnet(url: &str, raw_html: &str) -> String {
    let document = Html::parse_document(raw_html);
    let article = article::Article::from_document(&document);

    let mut content = density::document_content(&document);
    if content.trim().is_empty() {
        content = article.cleaned_text;
    }
    let meta_text = join_fragments([
        article.title,
        article.meta_description,
        article.meta_keywords,
        metadata::text_from_url(url),
    ]);
    join_fragments([content, meta_text])
}

fn all_text(url: &str, raw_html: &str) -> String {
    let document = Html::parse_document(raw_html);
    let mut fragments = metadata::common_info(url, &document);
    fragments.extend(visible::visible_texts(&document));
    join_fragments(fragments)
}
