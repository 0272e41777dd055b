//! Similarity requests over fetched pages
//!
//! Each call takes its own [`CheckConfig`]; the checker holds nothing but
//! the optional cache store, so one instance can serve concurrent requests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::CheckConfig;
use crate::content::ContentGetter;
use crate::crawlers::{Crawler, PageCache};
use crate::error::{CheckError, ValidationError};
use crate::extractors::Extractor;
use crate::metrics::{self, Metric};
use crate::results::{
    CheckOutcome, ContentCrossSimilarity, ContentSimilarity, CrossSimilarity, PAGE_NOT_FOUND, Page,
    Score, SimilarityEntry, rank,
};
use crate::tokenizer::TokenizerConfig;
use crate::urls;

#[derive(Clone, Default)]
pub struct SimilarityChecker {
    cache: Option<Arc<dyn PageCache>>,
}

impl SimilarityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `cache` for requests whose configuration enables caching
    pub fn with_cache(mut self, cache: Arc<dyn PageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn content_getter(
        &self,
        config: &CheckConfig,
        selector: Option<&str>,
    ) -> Result<ContentGetter, CheckError> {
        let mut crawler = Crawler::new(config.crawl.clone())?;
        if let Some(cache) = &self.cache {
            crawler = crawler.with_cache(Arc::clone(cache));
        }
        let extractor = Extractor::new(config.extractor_for(selector), config.extract);
        Ok(ContentGetter::new(crawler, extractor))
    }

    /// Scores the main page against every sub page.
    ///
    /// Sub pages that failed or produced no text are reported as
    /// `Page not found` and ranked after every numeric score.
    pub async fn process<S: AsRef<str>>(
        &self,
        config: &CheckConfig,
        main_url: &str,
        sub_urls: &[S],
    ) -> Result<CheckOutcome, CheckError> {
        let main_url = main_url.trim().to_string();
        let sub_urls = urls::dedupe(&urls::pre_process_urls(sub_urls));

        let (main_page, sub_pages) = if config.has_page_selectors() {
            let main_getter = self.content_getter(config, config.selectors.main_page.as_deref())?;
            let sub_getter = self.content_getter(config, config.selectors.sub_page.as_deref())?;
            let main_urls = [main_url.as_str()];
            let (mut main_pages, sub_pages) =
                tokio::join!(main_getter.process(&main_urls), sub_getter.process(&sub_urls));
            (main_pages.remove(&main_url), sub_pages)
        } else {
            let getter = self.content_getter(config, None)?;
            let mut all_urls = Vec::with_capacity(sub_urls.len() + 1);
            all_urls.push(main_url.clone());
            all_urls.extend(sub_urls.iter().cloned());
            let pages = getter.process(&all_urls).await;
            (pages.get(&main_url).cloned(), pages)
        };

        let main_page = main_page.unwrap_or_default();
        if main_page.content.trim().is_empty() {
            ::log::info!("Main page {} is empty", main_url);
            return Ok(CheckOutcome::MainPageEmpty);
        }

        let main_tokens = config.tokenizer.normalize(&main_page.content);
        let mut entries = score_sub_pages(config, &main_tokens, &sub_urls, &sub_pages);
        rank(&mut entries);
        ::log::info!(
            "Compared {} with {} sub pages using {}",
            main_url,
            entries.len(),
            config.metric
        );
        Ok(CheckOutcome::Ranked(entries))
    }

    /// Pairwise scores between three pages.
    ///
    /// A pair with a missing side gets `Page not found: <url>`, naming the
    /// first missing URL of the pair.
    pub async fn cross_process(
        &self,
        config: &CheckConfig,
        url_1: &str,
        url_2: &str,
        url_3: &str,
    ) -> Result<CrossSimilarity, CheckError> {
        let urls = [url_1, url_2, url_3].map(|url| url.trim().to_string());

        let pages: [Page; 3] = if config.has_url_selectors() {
            let selectors = &config.selectors;
            let getters = [
                self.content_getter(config, selectors.url_1.as_deref())?,
                self.content_getter(config, selectors.url_2.as_deref())?,
                self.content_getter(config, selectors.url_3.as_deref())?,
            ];
            let (mut pages_1, mut pages_2, mut pages_3) = tokio::join!(
                getters[0].process(&urls[0..1]),
                getters[1].process(&urls[1..2]),
                getters[2].process(&urls[2..3]),
            );
            [
                pages_1.remove(&urls[0]).unwrap_or_default(),
                pages_2.remove(&urls[1]).unwrap_or_default(),
                pages_3.remove(&urls[2]).unwrap_or_default(),
            ]
        } else {
            let pages = self.content_getter(config, None)?.process(&urls).await;
            urls.clone()
                .map(|url| pages.get(&url).cloned().unwrap_or_default())
        };

        let tokens = pages.clone().map(|page| config.tokenizer.normalize(&page.content));
        let pair = |i: usize, j: usize| {
            pair_score(
                config.metric,
                (urls[i].as_str(), &pages[i], tokens[i].as_slice()),
                (urls[j].as_str(), &pages[j], tokens[j].as_slice()),
            )
        };

        Ok(CrossSimilarity {
            sim12: pair(0, 1),
            sim23: pair(1, 2),
            sim13: pair(0, 2),
        })
    }

    /// Fetches, extracts and tokenizes every URL, in the order given
    pub async fn extract_pages<S: AsRef<str>>(
        &self,
        config: &CheckConfig,
        urls: &[S],
    ) -> Result<Vec<(String, Page)>, CheckError> {
        let urls: Vec<String> = urls::dedupe(&urls::pre_process_urls(urls))
            .into_iter()
            .filter(|url| !url.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(ValidationError::NoUrls.into());
        }

        let mut pages = self.content_getter(config, None)?.process(&urls).await;
        Ok(urls
            .into_iter()
            .filter_map(|url| {
                let mut page = pages.remove(&url)?;
                page.tokens = config.tokenizer.normalize(&page.content);
                Some((url, page))
            })
            .collect())
    }
}

fn score_sub_pages(
    config: &CheckConfig,
    main_tokens: &[String],
    sub_urls: &[String],
    pages: &HashMap<String, Page>,
) -> Vec<SimilarityEntry> {
    sub_urls
        .iter()
        .map(|url| {
            let score = match pages.get(url) {
                Some(page) if !page.is_missing() => {
                    let tokens = config.tokenizer.normalize(&page.content);
                    Score::Value(config.metric.score(main_tokens, &tokens))
                }
                _ => Score::Missing(PAGE_NOT_FOUND.to_string()),
            };
            SimilarityEntry(url.clone(), score)
        })
        .collect()
}

fn pair_score(
    metric: Metric,
    (url_a, page_a, tokens_a): (&str, &Page, &[String]),
    (url_b, page_b, tokens_b): (&str, &Page, &[String]),
) -> Score {
    for (url, page) in [(url_a, page_a), (url_b, page_b)] {
        if page.is_missing() {
            return Score::Missing(format!("{}: {}", PAGE_NOT_FOUND, url));
        }
    }
    Score::Value(metric.score(tokens_a, tokens_b))
}

/// Scores two raw texts under each named metric (all of them when `metrics`
/// is empty)
pub fn compare_contents(
    tokenizer: &TokenizerConfig,
    content_1: &str,
    content_2: &str,
    metrics: &[String],
) -> ContentSimilarity {
    let tokens_1 = tokenizer.normalize(content_1);
    let tokens_2 = tokenizer.normalize(content_2);
    let distances = metrics::distances(&tokens_1, &tokens_2, metrics);
    ContentSimilarity {
        tokens_1,
        tokens_2,
        distances,
    }
}

/// Pairwise [`compare_contents`] over three raw texts
pub fn cross_compare_contents(
    tokenizer: &TokenizerConfig,
    content_1: &str,
    content_2: &str,
    content_3: &str,
    metrics: &[String],
) -> ContentCrossSimilarity {
    let tokens_1 = tokenizer.normalize(content_1);
    let tokens_2 = tokenizer.normalize(content_2);
    let tokens_3 = tokenizer.normalize(content_3);
    ContentCrossSimilarity {
        distances12: metrics::distances(&tokens_1, &tokens_2, metrics),
        distances23: metrics::distances(&tokens_2, &tokens_3, metrics),
        distances13: metrics::distances(&tokens_1, &tokens_3, metrics),
        tokens_1,
        tokens_2,
        tokens_3,
    }
}
