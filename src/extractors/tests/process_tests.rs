use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExtractConfig;
use crate::extractors::{ExtractFn, Extractor, ExtractorKind};
use crate::results::Page;

#[cfg(test)]
mod tests {
    use super::*;

    fn page_html(word: &str) -> String {
        format!("<html><body><p>{}</p></body></html>", word)
    }

    #[tokio::test]
    async fn test_empty_pages_fall_back_to_url() {
        let extractor = Extractor::new(ExtractorKind::AllText, ExtractConfig::default());
        let mut pages = HashMap::new();
        pages.insert(
            "http://example.com/missing".to_string(),
            Page::failed("Crawling error: Not Found", Some(404)),
        );
        pages.insert(
            "http://example.com/found".to_string(),
            Page::fetched(page_html("present"), 200),
        );

        extractor.process_all(&mut pages).await;

        let missing = &pages["http://example.com/missing"];
        assert_eq!(missing.content, "http://example.com/missing");
        assert_eq!(missing.code, Some(404));
        assert_eq!(pages["http://example.com/found"].content, "example found, present");
    }

    #[tokio::test]
    async fn test_large_batch_runs_on_pool() {
        let config = ExtractConfig {
            parallel_threshold: 3,
            ..ExtractConfig::default()
        };
        let extractor = Extractor::new(ExtractorKind::AllText, config);
        let mut pages: HashMap<String, Page> = (0..8)
            .map(|i| {
                (
                    format!("http://example.com/p{}", i),
                    Page::fetched(page_html(&format!("word{}", i)), 200),
                )
            })
            .collect();

        extractor.process_all(&mut pages).await;

        assert_eq!(pages.len(), 8);
        for i in 0..8 {
            let page = &pages[&format!("http://example.com/p{}", i)];
            assert_eq!(page.content, format!("example p{}, word{}", i, i));
        }
    }

    /// Extracts with `all_text`, stalling on URLs that contain "stall"
    fn stalling_extract() -> ExtractFn {
        let extractor = Extractor::new(ExtractorKind::AllText, ExtractConfig::default());
        Arc::new(move |url: &str, raw_html: &str| {
            if url.contains("stall") {
                std::thread::sleep(Duration::from_millis(600));
            }
            extractor.extract(url, raw_html)
        })
    }

    fn short_timeout(parallel_threshold: usize) -> Extractor {
        let config = ExtractConfig {
            timeout_ms: 150,
            parallel_threshold,
        };
        Extractor::new(ExtractorKind::AllText, config)
    }

    #[tokio::test]
    async fn test_timed_out_page_is_empty_in_turn() {
        let mut pages = HashMap::new();
        pages.insert(
            "http://example.com/stall".to_string(),
            Page::fetched(page_html("late"), 200),
        );
        pages.insert(
            "http://example.com/quick".to_string(),
            Page::fetched(page_html("fast"), 200),
        );

        short_timeout(10)
            .process_with(&mut pages, stalling_extract())
            .await;

        let stalled = &pages["http://example.com/stall"];
        assert_eq!(stalled.content, "");
        assert!(stalled.ok);
        assert_eq!(pages["http://example.com/quick"].content, "example quick, fast");
    }

    #[tokio::test]
    async fn test_timed_out_page_is_empty_on_pool() {
        let mut pages: HashMap<String, Page> = (0..4)
            .map(|i| {
                (
                    format!("http://example.com/q{}", i),
                    Page::fetched(page_html(&format!("word{}", i)), 200),
                )
            })
            .collect();
        pages.insert(
            "http://example.com/stall".to_string(),
            Page::fetched(page_html("late"), 200),
        );

        short_timeout(2)
            .process_with(&mut pages, stalling_extract())
            .await;

        assert_eq!(pages["http://example.com/stall"].content, "");
        for i in 0..4 {
            let page = &pages[&format!("http://example.com/q{}", i)];
            assert_eq!(page.content, format!("example q{}, word{}", i, i));
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let extractor = Extractor::new(ExtractorKind::Dragnet, ExtractConfig::default());
        let mut pages = HashMap::new();
        extractor.process_all(&mut pages).await;
        assert!(pages.is_empty());
    }
}
