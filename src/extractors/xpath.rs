//! A small XPath 1.0 subset evaluated over a scraper document
//!
//! Supported:
//! - absolute (`/html/body`), descendant (`//div`) and relative (`body/p`)
//!   location paths; relative paths start at the `<html>` element
//! - node tests: element names, `*`, `.`, `..`, `text()`, `@attr`
//! - predicates: `[n]`, `[last()]`, `[@a]`, `[@a='v']`,
//!   `[contains(@a,'v')]`, `[text()='v']`, `[contains(text(),'v')]`
//!
//! Predicates are applied per context node, so `//li[1]` selects the first
//! `li` child of every list.

use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected '{found}' at position {position}")]
    Unexpected { found: char, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unsupported predicate '{0}'")]
    UnsupportedPredicate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    /// `//`: children of the context node or of any of its descendants
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    AnyElement,
    Text,
    SelfNode,
    Parent,
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Last,
    HasAttr(String),
    AttrEquals(String, String),
    AttrContains(String, String),
    TextEquals(String),
    TextContains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// A compiled XPath expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    absolute: bool,
    steps: Vec<Step>,
}

/// A node selected by an expression
#[derive(Debug, Clone)]
pub enum Item<'a> {
    Element(ElementRef<'a>),
    /// Text node content or attribute value
    Text(String),
}

#[derive(Clone, Copy)]
enum Context<'a> {
    Document,
    Element(ElementRef<'a>),
}

impl XPath {
    pub fn parse(expression: &str) -> Result<Self, XPathError> {
        Parser::new(expression).parse()
    }

    /// Selects the matching nodes of `document`
    pub fn select<'a>(&self, document: &'a Html) -> Vec<Item<'a>> {
        let start = if self.absolute {
            Context::Document
        } else {
            Context::Element(document.root_element())
        };

        let mut items = Vec::new();
        let mut contexts = vec![start];
        for step in &self.steps {
            items = evaluate_step(document, &contexts, step);
            contexts = items.iter().filter_map(Item::context).collect();
        }
        items
    }
}

impl<'a> Item<'a> {
    fn context(&self) -> Option<Context<'a>> {
        match self {
            Item::Element(element) => Some(Context::Element(*element)),
            Item::Text(_) => None,
        }
    }
}

fn evaluate_step<'a>(document: &'a Html, contexts: &[Context<'a>], step: &Step) -> Vec<Item<'a>> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for &context in contexts {
        let bases = match step.axis {
            Axis::Child => vec![context],
            Axis::Descendant => descendants_or_self(document, context),
        };
        for base in bases {
            let candidates = apply_test(document, base, &step.test);
            for item in apply_predicates(candidates, &step.predicates) {
                if let Item::Element(element) = &item {
                    if !seen.insert(element.id()) {
                        continue;
                    }
                }
                results.push(item);
            }
        }
    }
    results
}

fn descendants_or_self<'a>(document: &'a Html, context: Context<'a>) -> Vec<Context<'a>> {
    let (mut out, root) = match context {
        Context::Document => (vec![Context::Document], document.root_element()),
        Context::Element(element) => (Vec::new(), element),
    };
    out.extend(
        root.descendants()
            .filter_map(ElementRef::wrap)
            .map(Context::Element),
    );
    out
}

fn child_elements<'a>(document: &'a Html, context: Context<'a>) -> Vec<ElementRef<'a>> {
    match context {
        Context::Document => vec![document.root_element()],
        Context::Element(element) => element.children().filter_map(ElementRef::wrap).collect(),
    }
}

fn apply_test<'a>(document: &'a Html, context: Context<'a>, test: &NodeTest) -> Vec<Item<'a>> {
    match test {
        NodeTest::Name(name) => child_elements(document, context)
            .into_iter()
            .filter(|element| element.value().name().eq_ignore_ascii_case(name))
            .map(Item::Element)
            .collect(),
        NodeTest::AnyElement => child_elements(document, context)
            .into_iter()
            .map(Item::Element)
            .collect(),
        NodeTest::Text => match context {
            Context::Document => Vec::new(),
            Context::Element(element) => element
                .children()
                .filter_map(|child| child.value().as_text().map(|text| Item::Text(text.to_string())))
                .collect(),
        },
        NodeTest::SelfNode => match context {
            Context::Document => Vec::new(),
            Context::Element(element) => vec![Item::Element(element)],
        },
        NodeTest::Parent => match context {
            Context::Document => Vec::new(),
            Context::Element(element) => element
                .parent()
                .and_then(ElementRef::wrap)
                .map(Item::Element)
                .into_iter()
                .collect(),
        },
        NodeTest::Attribute(name) => match context {
            Context::Document => Vec::new(),
            Context::Element(element) => element
                .value()
                .attr(name)
                .map(|value| Item::Text(value.to_string()))
                .into_iter()
                .collect(),
        },
    }
}

fn apply_predicates<'a>(mut items: Vec<Item<'a>>, predicates: &[Predicate]) -> Vec<Item<'a>> {
    for predicate in predicates {
        items = match predicate {
            Predicate::Position(n) => items.into_iter().nth(n - 1).into_iter().collect(),
            Predicate::Last => items.pop().into_iter().collect(),
            _ => items
                .into_iter()
                .filter(|item| matches_predicate(item, predicate))
                .collect(),
        };
    }
    items
}

fn matches_predicate(item: &Item<'_>, predicate: &Predicate) -> bool {
    let Item::Element(element) = item else {
        return false;
    };
    let el = element.value();
    let mut texts = element.children().filter_map(|child| match child.value() {
        Node::Text(text) => Some(text.to_string()),
        _ => None,
    });

    match predicate {
        Predicate::HasAttr(name) => el.attr(name).is_some(),
        Predicate::AttrEquals(name, value) => el.attr(name) == Some(value.as_str()),
        Predicate::AttrContains(name, value) => el
            .attr(name)
            .is_some_and(|a| a.contains(value.as_str())),
        Predicate::TextEquals(value) => texts.any(|text| text == *value),
        Predicate::TextContains(value) => texts.any(|text| text.contains(value.as_str())),
        Predicate::Position(_) | Predicate::Last => true,
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(expression: &str) -> Self {
        Self {
            chars: expression.trim().chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        prefix
            .chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> XPathError {
        match self.peek() {
            Some(found) => XPathError::Unexpected {
                found,
                position: self.pos,
            },
            None => XPathError::UnexpectedEnd,
        }
    }

    fn parse(mut self) -> Result<XPath, XPathError> {
        if self.chars.is_empty() {
            return Err(XPathError::Empty);
        }

        let (absolute, mut axis) = self.parse_separator().map_or((false, Axis::Child), |axis| (true, axis));
        let mut steps = Vec::new();
        loop {
            steps.push(self.parse_step(axis)?);
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            axis = self.parse_separator().ok_or_else(|| self.unexpected())?;
        }

        Ok(XPath { absolute, steps })
    }

    fn parse_separator(&mut self) -> Option<Axis> {
        if self.starts_with("//") {
            self.pos += 2;
            Some(Axis::Descendant)
        } else if self.starts_with("/") {
            self.pos += 1;
            Some(Axis::Child)
        } else {
            None
        }
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, XPathError> {
        self.skip_whitespace();
        let test = if self.starts_with("..") {
            self.pos += 2;
            NodeTest::Parent
        } else if self.starts_with(".") {
            self.pos += 1;
            NodeTest::SelfNode
        } else if self.starts_with("*") {
            self.pos += 1;
            NodeTest::AnyElement
        } else if self.starts_with("@") {
            self.pos += 1;
            NodeTest::Attribute(self.parse_name()?)
        } else if self.starts_with("text()") {
            self.pos += "text()".len();
            NodeTest::Text
        } else {
            NodeTest::Name(self.parse_name()?.to_lowercase())
        };

        let mut predicates = Vec::new();
        self.skip_whitespace();
        while self.peek() == Some('[') {
            self.pos += 1;
            let body = self.take_bracketed()?;
            predicates.push(parse_predicate(&body)?);
            self.skip_whitespace();
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_name(&mut self) -> Result<String, XPathError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':'))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// Consumes up to the `]` closing the current predicate, honouring quotes
    fn take_bracketed(&mut self) -> Result<String, XPathError> {
        let start = self.pos;
        let mut quote = None;
        while let Some(c) = self.peek() {
            match (quote, c) {
                (None, ']') => {
                    let body = self.chars[start..self.pos].iter().collect();
                    self.pos += 1;
                    return Ok(body);
                }
                (None, '\'' | '"') => quote = Some(c),
                (Some(q), c) if q == c => quote = None,
                _ => {}
            }
            self.pos += 1;
        }
        Err(XPathError::UnexpectedEnd)
    }
}

fn parse_predicate(body: &str) -> Result<Predicate, XPathError> {
    let body = body.trim();
    let unsupported = || XPathError::UnsupportedPredicate(body.to_string());

    if let Ok(n) = body.parse::<usize>() {
        return if n >= 1 { Ok(Predicate::Position(n)) } else { Err(unsupported()) };
    }
    if body == "last()" {
        return Ok(Predicate::Last);
    }
    if let Some(inner) = body
        .strip_prefix("contains(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let (target, value) = inner.split_once(',').ok_or_else(unsupported)?;
        let value = literal(value).ok_or_else(unsupported)?;
        let target = target.trim();
        return match target.strip_prefix('@') {
            Some(name) => Ok(Predicate::AttrContains(name.trim().to_string(), value)),
            None if target == "text()" || target == "." => Ok(Predicate::TextContains(value)),
            None => Err(unsupported()),
        };
    }
    if let Some(rest) = body.strip_prefix('@') {
        return match rest.split_once('=') {
            Some((name, value)) => Ok(Predicate::AttrEquals(
                name.trim().to_string(),
                literal(value).ok_or_else(unsupported)?,
            )),
            None => Ok(Predicate::HasAttr(rest.trim().to_string())),
        };
    }
    if let Some((target, value)) = body.split_once('=') {
        if matches!(target.trim(), "text()" | ".") {
            return Ok(Predicate::TextEquals(literal(value).ok_or_else(unsupported)?));
        }
    }
    Err(unsupported())
}

/// Unquotes a string literal
fn literal(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let quote = raw.chars().next().filter(|c| matches!(c, '\'' | '"'))?;
    raw.strip_prefix(quote)?
        .strip_suffix(quote)
        .map(str::to_string)
}
