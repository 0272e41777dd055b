use std::collections::HashMap;

use crate::crawlers::Crawler;
use crate::extractors::Extractor;
use crate::results::Page;

/// Fetches pages and replaces their bodies with extracted text
#[derive(Clone)]
pub struct ContentGetter {
    crawler: Crawler,
    extractor: Extractor,
}

impl ContentGetter {
    pub fn new(crawler: Crawler, extractor: Extractor) -> Self {
        Self { crawler, extractor }
    }

    /// Crawls every URL, then extracts every page.
    ///
    /// Each page keeps its crawl status; `content` holds the extracted
    /// text, or the URL itself when the crawl produced no body.
    pub async fn process<S: AsRef<str>>(&self, urls: &[S]) -> HashMap<String, Page> {
        let mut pages = self.crawler.fetch_all(urls).await;
        ::log::debug!("Crawled {} pages, extracting", pages.len());
        self.extractor.process_all(&mut pages).await;
        pages
    }
}
