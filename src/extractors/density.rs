//! Text-density content extraction
//!
//! The document body is cut into text blocks at block-level element
//! boundaries. A block is kept when it is long enough and not dominated by
//! link text; short blocks sandwiched between two kept blocks are kept as
//! well, so headings and captions inside an article survive.

use scraper::{ElementRef, Html, Node};

use crate::utils::collapse_whitespace;

/// Minimum words for a block to be kept on its own
const MIN_WORDS: usize = 10;
/// Minimum words for a block kept because its neighbours are
const MIN_BRIDGE_WORDS: usize = 3;
/// Maximum share of link words in a kept block
const MAX_LINK_DENSITY: f64 = 0.33;

const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "template", "iframe", "svg", "nav", "footer", "form",
    "button", "select", "textarea",
];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul", "br",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub words: usize,
    pub link_words: usize,
}

impl TextBlock {
    pub fn link_density(&self) -> f64 {
        if self.words == 0 {
            0.0
        } else {
            self.link_words as f64 / self.words as f64
        }
    }
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<TextBlock>,
    text: String,
    words: usize,
    link_words: usize,
}

impl BlockBuilder {
    fn push(&mut self, text: &str, in_link: bool) {
        let words = text.split_whitespace().count();
        self.words += words;
        if in_link {
            self.link_words += words;
        }
        self.text.push_str(text);
        self.text.push(' ');
    }

    fn flush(&mut self) {
        let text = collapse_whitespace(&self.text);
        if !text.is_empty() {
            self.blocks.push(TextBlock {
                text,
                words: self.words,
                link_words: self.link_words,
            });
        }
        self.text.clear();
        self.words = 0;
        self.link_words = 0;
    }
}

/// Splits a document into text blocks in document order
pub fn text_blocks(document: &Html) -> Vec<TextBlock> {
    let mut builder = BlockBuilder::default();
    walk(document.root_element(), false, &mut builder);
    builder.flush();
    builder.blocks
}

fn walk(element: ElementRef<'_>, in_link: bool, builder: &mut BlockBuilder) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }
    let in_link = in_link || name == "a";
    let is_block = BLOCK_TAGS.contains(&name);

    if is_block {
        builder.flush();
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => builder.push(text, in_link),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    walk(child, in_link, builder);
                }
            }
            _ => {}
        }
    }
    if is_block {
        builder.flush();
    }
}

/// Indices of the blocks judged to be content
pub fn content_blocks(blocks: &[TextBlock]) -> Vec<usize> {
    let dense: Vec<bool> = blocks
        .iter()
        .map(|b| b.words >= MIN_WORDS && b.link_density() < MAX_LINK_DENSITY)
        .collect();

    (0..blocks.len())
        .filter(|&i| {
            dense[i]
                || (i > 0
                    && i + 1 < blocks.len()
                    && dense[i - 1]
                    && dense[i + 1]
                    && blocks[i].words >= MIN_BRIDGE_WORDS
                    && blocks[i].link_density() < MAX_LINK_DENSITY)
        })
        .collect()
}

/// Main content of an HTML page, or an empty string if none stands out
pub fn extract_content(raw_html: &str) -> String {
    document_content(&Html::parse_document(raw_html))
}

pub fn document_content(document: &Html) -> String {
    let blocks = text_blocks(document);
    content_blocks(&blocks)
        .into_iter()
        .map(|i| blocks[i].text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<html><head><title>T</title><script>var x = 1;</script></head>
        <body>
          <div class="menu"><a href="/">Home</a> <a href="/news">News</a> <a href="/sport">Sport</a></div>
          <h1>Turkey shoots down a warplane</h1>
          <p>Turkish fighter jets shot down a Russian warplane near the Syrian border on Tuesday morning.</p>
          <h2>Reaction</h2>
          <p>Officials in Moscow reacted with anger and promised a serious response to the incident.</p>
          <p>Follow <a href="/a">us</a> on <a href="/b">social</a> <a href="/c">media</a> <a href="/d">today</a></p>
        </body></html>"#;

    #[test]
    fn test_blocks_split_at_block_elements() {
        let document = Html::parse_document(ARTICLE);
        let blocks = text_blocks(&document);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert!(texts.contains(&"Turkey shoots down a warplane"));
        assert!(texts.contains(&"Reaction"));
        assert!(!texts.iter().any(|t| t.contains("var x")));
    }

    #[test]
    fn test_link_heavy_blocks_are_dropped() {
        let content = extract_content(ARTICLE);
        assert!(content.contains("Turkish fighter jets"));
        assert!(content.contains("Officials in Moscow"));
        assert!(!content.contains("Home"));
        assert!(!content.contains("social"));
    }

    #[test]
    fn test_short_block_between_content_is_kept() {
        let blocks = vec![
            TextBlock { text: "a".into(), words: 12, link_words: 0 },
            TextBlock { text: "bridge".into(), words: 3, link_words: 0 },
            TextBlock { text: "c".into(), words: 15, link_words: 1 },
            TextBlock { text: "tail".into(), words: 4, link_words: 0 },
        ];
        assert_eq!(content_blocks(&blocks), vec![0, 1, 2]);
    }

    #[test]
    fn test_no_content() {
        assert_eq!(extract_content(""), "");
        assert_eq!(extract_content("<html><body><p>too short</p></body></html>"), "");
    }
}
