use scraper::{ElementRef, Html};

/// Elements whose direct text is never rendered
const HIDDEN_PARENTS: &[&str] = &["style", "script", "head", "title"];

/// Every rendered text node of the document, trimmed, in document order.
///
/// Comments are not text nodes and never appear.
pub fn visible_texts(document: &Html) -> Vec<String> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if HIDDEN_PARENTS.contains(&parent.value().name()) {
                return None;
            }
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect()
}
