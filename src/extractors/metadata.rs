//! Page metadata shared by the heuristic extractors

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").expect("static pattern"));

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META: LazyLock<Selector> = LazyLock::new(|| selector("meta"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Title, description and keywords of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

impl PageMetadata {
    pub fn from_document(document: &Html) -> Self {
        Self {
            title: title(document),
            description: meta_content(document, "description"),
            keywords: meta_content(document, "keywords"),
        }
    }
}

/// Text of the first `<title>` element
pub fn title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Content of the first `<meta>` whose `name` (or, when it has no name,
/// `property`) contains `name`, ignoring case
pub fn meta_content(document: &Html, name: &str) -> String {
    let needle = name.to_lowercase();
    document
        .select(&META)
        .find(|meta| {
            let element = meta.value();
            element
                .attr("name")
                .filter(|n| !n.is_empty())
                .or_else(|| element.attr("property"))
                .is_some_and(|n| n.to_lowercase().contains(&needle))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

/// Words derived from a URL: the first host label without `www.`, then
/// the path segments that contain no `.`, with every non-alphanumeric
/// character of the path replaced by a space
pub fn text_from_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        ::log::debug!("Cannot derive text from url {}", url);
        return String::new();
    };

    let host = parsed.host_str().unwrap_or_default().replace("www.", "");
    let root = host.split('.').next().unwrap_or_default();

    let path = parsed
        .path()
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && !segment.contains('.'))
        .collect::<Vec<_>>()
        .join(" ");
    let path = NON_ALPHANUMERIC.replace_all(&path, " ");

    format!("{} {}", root, path).trim().to_string()
}

/// The metadata fragments every heuristic extractor starts with: title,
/// description, keywords and the URL text, blanks dropped
pub fn common_info(url: &str, document: &Html) -> Vec<String> {
    let metadata = PageMetadata::from_document(document);
    [
        metadata.title,
        metadata.description,
        metadata.keywords,
        text_from_url(url),
    ]
    .into_iter()
    .filter(|fragment| !fragment.is_empty())
    .collect()
}
