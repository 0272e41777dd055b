use std::io::Cursor;
use url::Url;

/// Fallback base for pages whose URL cannot be parsed
const PLACEHOLDER_URL: &str = "http://localhost/";

/// Cleaned HTML summary of the page produced by the readability algorithm.
///
/// Tags are kept. Returns an empty string when the algorithm fails.
pub fn summary(url: &str, raw_html: &str) -> String {
    let base = match Url::parse(url).or_else(|_| Url::parse(PLACEHOLDER_URL)) {
        Ok(base) => base,
        Err(e) => {
            ::log::error!("Invalid url {}: {}", url, e);
            return String::new();
        }
    };

    let mut cursor = Cursor::new(raw_html.as_bytes());
    match ::readability::extractor::extract(&mut cursor, &base) {
        Ok(product) => product.content,
        Err(_) => {
            ::log::error!("readability extract_page_content error for {}", url);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_keeps_article() {
        let html = r#"<html><head><title>News</title></head><body>
            <div class="article"><p>The quick brown fox jumps over the lazy dog, again and again,
            while the farmer watches from the porch and wonders about the weather.</p>
            <p>Later that evening the fox returned to the field, looking for more dogs to jump over,
            but the dog had already gone home to sleep in front of the fire.</p></div>
            </body></html>"#;
        let content = summary("http://example.com/news", html);
        assert!(content.contains("quick brown fox"));
    }

    #[test]
    fn test_summary_with_bad_url() {
        let content = summary("not a url", "<html><body><p>Hello there</p></body></html>");
        assert!(!content.contains("not a url"));
    }
}
