use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::CrawlConfig;
use crate::crawlers::cache::{self, PageCache};
use crate::pool::WorkerPool;
use crate::results::{Page, SYNTHETIC_STATUS};
use crate::urls;
use crate::utils::available_parallelism;

/// Error recorded when a fetch exceeds its timeout
pub const READ_TIMEOUT: &str = "Web page read timeout";

/// Error recorded for an empty URL, which is never dispatched
pub const EMPTY_URL: &str = "url is empty";

/// Error recorded when a fetch worker dies before producing a page
pub const WORKER_FAILED: &str = "Crawling error: worker failed";

/// Concurrent, timeout-bounded HTTP fetcher
#[derive(Clone)]
pub struct Crawler {
    client: reqwest::Client,
    config: CrawlConfig,
    cache: Option<Arc<dyn PageCache>>,
}

impl Crawler {
    /// Creates a crawler without a cache store
    pub fn new(config: CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.fetch_timeout())
            .danger_accept_invalid_certs(true)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            config,
            cache: None,
        })
    }

    /// Attaches a cache store. It is only consulted when the configuration
    /// enables caching.
    pub fn with_cache(mut self, cache: Arc<dyn PageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn active_cache(&self) -> Option<(&dyn PageCache, Duration)> {
        match (&self.cache, &self.config.cache) {
            (Some(store), Some(settings)) => Some((store.as_ref(), settings.ttl())),
            _ => None,
        }
    }

    /// Fetches every distinct URL once and returns the pages keyed by URL.
    ///
    /// Cached pages are returned without a request. Failures never abort
    /// sibling fetches; they are recorded on the page instead.
    pub async fn fetch_all<S: AsRef<str>>(&self, urls: &[S]) -> HashMap<String, Page> {
        let mut pages = HashMap::new();
        let mut pending = urls::dedupe(urls);

        if let Some((store, _)) = self.active_cache() {
            pending.retain(|url| match cache::load_page(store, url) {
                Ok(Some(page)) => {
                    ::log::debug!("Url was crawled: {}", url);
                    pages.insert(url.clone(), page);
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    ::log::warn!("Cache lookup failed for {}: {}", url, e);
                    true
                }
            });
            ::log::info!("Num of cached urls: {}", pages.len());
            ::log::info!("Remaining urls to crawl: {}", pending.len());

            if pending.is_empty() {
                ::log::info!("All urls have been crawled");
                return pages;
            }
        }

        let mut fetched = if pending.len() > self.config.sequential_limit {
            self.fetch_parallel(&pending).await
        } else {
            let mut fetched = HashMap::with_capacity(pending.len());
            for url in &pending {
                fetched.insert(url.clone(), self.fetch_page(url).await);
            }
            fetched
        };

        if let Some((store, ttl)) = self.active_cache() {
            for (url, page) in fetched.iter_mut() {
                page.crawled_date = Some(cache::crawled_date_now());
                if let Err(e) = cache::store_page(store, url, page, ttl) {
                    ::log::warn!("Failed to cache {}: {}", url, e);
                }
            }
        }

        pages.extend(fetched);
        pages
    }

    /// Fans the URLs out across a pool of twice the CPU count
    async fn fetch_parallel(&self, pending: &[String]) -> HashMap<String, Page> {
        let mut pool = WorkerPool::new(available_parallelism() * 2);
        for url in pending {
            let crawler = self.clone();
            let task_url = url.clone();
            pool.submit(url.clone(), async move { crawler.fetch_page(&task_url).await });
        }

        pool.join()
            .await
            .into_iter()
            .map(|(url, page)| {
                let page = page.unwrap_or_else(|| Page::failed(WORKER_FAILED, Some(SYNTHETIC_STATUS)));
                (url, page)
            })
            .collect()
    }

    /// Fetches one URL with a single GET, bounded by the fetch timeout
    pub async fn fetch_page(&self, url: &str) -> Page {
        if url.is_empty() {
            return Page::failed(EMPTY_URL, None);
        }

        ::log::debug!("Start crawl {}...", url);
        let page = match timeout(self.config.fetch_timeout(), self.get(url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                ::log::error!("crawl_page error for {}: {}", url, e);
                let message = if e.is_timeout() {
                    READ_TIMEOUT.to_string()
                } else {
                    e.to_string()
                };
                Page::failed(message, Some(SYNTHETIC_STATUS))
            }
            Err(_) => {
                ::log::error!("crawl_page timed out for {}", url);
                Page::failed(READ_TIMEOUT, Some(SYNTHETIC_STATUS))
            }
        };
        ::log::debug!("End crawl {}...", url);
        page
    }

    async fn get(&self, url: &str) -> Result<Page, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            ::log::warn!("Crawling error for {}: {}", url, status);
            return Ok(Page::failed(
                format!("Crawling error: {}", reason),
                Some(status.as_u16()),
            ));
        }

        // Decoded with the charset of `Content-Type`, UTF-8 when absent
        let body = response.text().await?;
        Ok(Page::fetched(body, status.as_u16()))
    }
}
