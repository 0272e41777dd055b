use std::sync::Arc;
use std::time::Duration;

use page_similarity::config::{CacheConfig, CheckConfig, CrawlConfig, Selectors};
use page_similarity::crawlers::web::READ_TIMEOUT;
use page_similarity::extractors::{ExtractorKind, SelectorSpec};
use page_similarity::results::PAGE_NOT_FOUND;
use page_similarity::{
    CheckOutcome, Crawler, MemoryCache, Metric, PageCache, Score, SimilarityChecker,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STORY: &str = r#"<html><head><title>Warplane down</title></head><body>
    <p>Turkish fighter jets shot down a Russian warplane near the Syrian border.</p>
    <p>Officials in Moscow reacted with anger.</p></body></html>"#;

const SIMILAR: &str = r#"<html><head><title>Warplane down</title></head><body>
    <p>Turkish fighter jets shot down a Russian warplane near the border.</p></body></html>"#;

const UNRELATED: &str = r#"<html><head><title>Recipes</title></head><body>
    <p>Whisk the eggs with sugar until pale and fluffy.</p></body></html>"#;

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn all_text_config(metric: Metric) -> CheckConfig {
    CheckConfig {
        metric,
        extractor: ExtractorKind::AllText,
        ..CheckConfig::default()
    }
}

#[tokio::test]
async fn test_process_ranks_numeric_scores_first() {
    let server = MockServer::start().await;
    serve(&server, "/main", 200, STORY).await;
    serve(&server, "/similar", 200, SIMILAR).await;
    serve(&server, "/unrelated", 200, UNRELATED).await;
    serve(&server, "/missing", 404, "gone").await;

    let base = server.uri();
    let sub_urls = vec![
        format!("{}/missing", base),
        format!("{}/unrelated", base),
        format!(" {}/similar ", base),
    ];

    let outcome = SimilarityChecker::new()
        .process(
            &all_text_config(Metric::Jaccard),
            &format!("{}/main", base),
            &sub_urls,
        )
        .await
        .unwrap();

    let entries = outcome.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].url(), format!("{}/similar", base));
    assert_eq!(entries[1].url(), format!("{}/unrelated", base));
    assert_eq!(entries[2].url(), format!("{}/missing", base));

    let similar = entries[0].score().value().unwrap();
    let unrelated = entries[1].score().value().unwrap();
    assert!(similar > unrelated);
    assert_eq!(*entries[2].score(), Score::Missing(PAGE_NOT_FOUND.to_string()));
}

#[tokio::test]
async fn test_process_with_failed_main_page() {
    let server = MockServer::start().await;
    serve(&server, "/main", 404, "gone").await;
    serve(&server, "/ok", 200, STORY).await;
    serve(&server, "/missing", 500, "boom").await;

    let base = server.uri();
    let outcome = SimilarityChecker::new()
        .process(
            &all_text_config(Metric::Cosine),
            &format!("{}/main", base),
            &[format!("{}/missing", base), format!("{}/ok", base)],
        )
        .await
        .unwrap();

    let entries = outcome.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].url(), format!("{}/ok", base));
    assert!(entries[0].score().value().is_some());
    assert_eq!(*entries[1].score(), Score::Missing(PAGE_NOT_FOUND.to_string()));
}

#[tokio::test]
async fn test_process_reports_empty_main_page() {
    let server = MockServer::start().await;
    serve(&server, "/main", 200, STORY).await;
    serve(&server, "/sub", 200, SIMILAR).await;

    let config = CheckConfig {
        extractor: ExtractorKind::Selective(SelectorSpec::default()),
        selectors: Selectors {
            main_page: Some("#nothing".to_string()),
            sub_page: Some("p".to_string()),
            ..Selectors::default()
        },
        ..CheckConfig::default()
    };

    let base = server.uri();
    let outcome = SimilarityChecker::new()
        .process(&config, &format!("{}/main", base), &[format!("{}/sub", base)])
        .await
        .unwrap();
    assert_eq!(outcome, CheckOutcome::MainPageEmpty);
}

#[tokio::test]
async fn test_cross_process_names_missing_url() {
    let server = MockServer::start().await;
    serve(&server, "/one", 200, STORY).await;
    serve(&server, "/two", 404, "gone").await;
    serve(&server, "/three", 200, STORY).await;

    let base = server.uri();
    let two = format!("{}/two", base);
    let similarity = SimilarityChecker::new()
        .cross_process(
            &all_text_config(Metric::Cosine),
            &format!("{}/one", base),
            &two,
            &format!("{}/three", base),
        )
        .await
        .unwrap();

    let expected = Score::Missing(format!("{}: {}", PAGE_NOT_FOUND, two));
    assert_eq!(similarity.sim12, expected);
    assert_eq!(similarity.sim23, expected);
    assert!(similarity.sim13.value().unwrap() > 50.0);

    let json = serde_json::to_value(&similarity).unwrap();
    assert!(json.get("sim12").is_some());
    assert!(json.get("sim23").is_some());
    assert!(json.get("sim13").is_some());
}

#[tokio::test]
async fn test_fetch_records_status_errors() {
    let server = MockServer::start().await;
    serve(&server, "/ok", 200, STORY).await;
    serve(&server, "/missing", 404, "gone").await;
    serve(&server, "/broken", 500, "boom").await;

    let base = server.uri();
    let urls = vec![
        format!("{}/ok", base),
        format!("{}/missing", base),
        format!("{}/broken", base),
        format!("{}/ok", base),
    ];
    let crawler = Crawler::new(CrawlConfig::default()).unwrap();
    let pages = crawler.fetch_all(&urls).await;

    assert_eq!(pages.len(), 3);
    let ok = &pages[&urls[0]];
    assert!(ok.ok);
    assert_eq!(ok.code, Some(200));
    assert_eq!(ok.content, STORY);

    let missing = &pages[&urls[1]];
    assert!(!missing.ok);
    assert_eq!(missing.code, Some(404));
    assert_eq!(missing.error.as_deref(), Some("Crawling error: Not Found"));
    assert_eq!(missing.content, "");

    let broken = &pages[&urls[2]];
    assert_eq!(broken.code, Some(500));
    assert_eq!(
        broken.error.as_deref(),
        Some("Crawling error: Internal Server Error")
    );
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(STORY)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    serve(&server, "/fast", 200, STORY).await;

    let crawler = Crawler::new(CrawlConfig {
        fetch_timeout_secs: 1,
        ..CrawlConfig::default()
    })
    .unwrap();
    let slow = format!("{}/slow", server.uri());
    let fast = format!("{}/fast", server.uri());
    let pages = crawler.fetch_all(&[slow.clone(), fast.clone()]).await;

    let page = &pages[&slow];
    assert_eq!(page.error.as_deref(), Some(READ_TIMEOUT));
    assert_eq!(page.code, Some(408));
    assert!(!page.ok);
    assert!(pages[&fast].ok);
}

#[tokio::test]
async fn test_cache_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STORY))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCache::new());
    let crawler = Crawler::new(CrawlConfig {
        cache: Some(CacheConfig { expire_secs: 60 }),
        ..CrawlConfig::default()
    })
    .unwrap()
    .with_cache(store.clone());

    let url = format!("{}/cached", server.uri());
    let first = crawler.fetch_all(&[url.as_str()]).await;
    let second = crawler.fetch_all(&[url.as_str()]).await;

    assert_eq!(first, second);
    assert_eq!(second[&url].content, STORY);
    assert!(second[&url].crawled_date.is_some());
    assert!(store.exists(&url).unwrap());
}

#[tokio::test]
async fn test_extract_pages_keeps_order_and_tokens() {
    let server = MockServer::start().await;
    serve(&server, "/b", 200, UNRELATED).await;
    serve(&server, "/a", 200, STORY).await;

    let base = server.uri();
    let urls = vec![format!("{}/b", base), format!("{}/a", base)];
    let pages = SimilarityChecker::new()
        .extract_pages(&all_text_config(Metric::Cosine), &urls)
        .await
        .unwrap();

    let order: Vec<&str> = pages.iter().map(|(url, _)| url.as_str()).collect();
    assert_eq!(order, vec![urls[0].as_str(), urls[1].as_str()]);
    assert!(pages[0].1.tokens.contains(&"eggs".to_string()));
    assert!(pages[1].1.tokens.contains(&"warplane".to_string()));
}

#[tokio::test]
async fn test_cache_with_unbounded_expiry() {
    let server = MockServer::start().await;
    serve(&server, "/page", 200, STORY).await;

    let store = Arc::new(MemoryCache::new());
    let crawler = Crawler::new(CrawlConfig {
        cache: Some(CacheConfig {
            expire_secs: u64::MAX,
        }),
        ..CrawlConfig::default()
    })
    .unwrap()
    .with_cache(store.clone());

    let url = format!("{}/page", server.uri());
    let pages = crawler.fetch_all(&[url.as_str(), ""]).await;
    assert!(pages[&url].ok);
    assert!(store.exists(&url).unwrap());

    store
        .set("http://other", b"value".to_vec(), Duration::from_secs(60))
        .unwrap();
    assert_eq!(store.get("http://other").unwrap(), Some(b"value".to_vec()));
}

#[tokio::test]
async fn test_declared_charset_is_decoded() {
    let server = MockServer::start().await;
    let mut body = b"<html><body><p>".to_vec();
    body.extend_from_slice(b"caf\xe9 cr\xe8me br\xfbl\xe9e");
    body.extend_from_slice(b"</p></body></html>");
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=iso-8859-1"))
        .mount(&server)
        .await;

    let url = format!("{}/latin1", server.uri());
    let crawler = Crawler::new(CrawlConfig::default()).unwrap();
    let pages = crawler.fetch_all(&[url.as_str()]).await;
    assert!(pages[&url].content.contains("café crème brûlée"));

    let extracted = SimilarityChecker::new()
        .extract_pages(&all_text_config(Metric::Cosine), &[url.as_str()])
        .await
        .unwrap();
    let tokens = &extracted[0].1.tokens;
    assert!(tokens.contains(&"café".to_string()));
    assert!(tokens.contains(&"brûlée".to_string()));
}
