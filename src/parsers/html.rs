use crate::error::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Compile a CSS selector, keeping the offending text in the error
pub fn selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Joins text fragments and collapses all runs of whitespace.
///
/// Returns `None` when nothing but whitespace is left.
pub fn collapse_text<'a, I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let text = parts
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() { None } else { Some(text) }
}

/// Full text of an element and its descendants
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    collapse_text(element.text())
}

/// Text nodes that are direct children of the element, concatenated as-is
pub fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect()
}

/// Text of the first sibling after `element` that has any
pub fn following_text(element: ElementRef<'_>) -> Option<String> {
    element.next_siblings().find_map(|node| {
        if let Some(text) = node.value().as_text() {
            collapse_text([&**text])
        } else {
            ElementRef::wrap(node).and_then(element_text)
        }
    })
}

/// Text of the first element matching `selector`
pub fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector).next().and_then(element_text)
}
