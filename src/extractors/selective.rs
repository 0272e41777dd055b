use scraper::{ElementRef, Html, Selector};

use super::xpath::{Item, XPath};
use super::{SelectorSpec, SelectorType};

/// Text of every element matched by the selector, each element's text
/// nodes joined by single spaces.
///
/// An invalid selector is logged and yields an empty string, as does a
/// selector matching nothing.
pub fn extract(url: &str, raw_html: &str, spec: &SelectorSpec) -> String {
    let document = Html::parse_document(raw_html);
    let parts = match spec.selector_type {
        SelectorType::Css => match Selector::parse(&spec.selector) {
            Ok(selector) => document.select(&selector).map(element_text).collect::<Vec<_>>(),
            Err(e) => {
                ::log::error!("Invalid css selector '{}' for {}: {}", spec.selector, url, e);
                Vec::new()
            }
        },
        SelectorType::Xpath => match XPath::parse(&spec.selector) {
            Ok(xpath) => xpath
                .select(&document)
                .into_iter()
                .map(|item| match item {
                    Item::Element(element) => element_text(element),
                    Item::Text(text) => text.trim().to_string(),
                })
                .collect(),
            Err(e) => {
                ::log::error!("Invalid xpath '{}' for {}: {}", spec.selector, url, e);
                Vec::new()
            }
        },
    };

    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes of the element and its descendants, trimmed and joined by spaces
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
