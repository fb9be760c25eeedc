use crate::config::SummaryConfig;
use crate::error::ConfigError;
use crate::filter::LinkFilter;
use crate::parsers::html::{self, element_text};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

/// Compiled form of [`SummaryConfig`]
#[derive(Debug)]
pub struct SummaryMatcher {
    selector: Selector,
    pattern: Regex,
}

impl SummaryMatcher {
    pub fn from_config(config: &SummaryConfig) -> Result<Self, ConfigError> {
        // "<marker> <N> <noun>", N possibly written with locale separators
        let pattern = format!(
            r"(?i)\b{}\s+(\d[\d.,]*)\s+{}",
            regex::escape(config.marker.trim()),
            regex::escape(config.noun.trim())
        );

        Ok(Self {
            selector: html::selector(&config.selector)?,
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Finds the total in a single piece of text
    pub fn match_text(&self, text: &str) -> Option<usize> {
        let captures = self.pattern.captures(text)?;
        let digits: String = captures[1].chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

/// Reads the total product count from a listing page's summary text.
///
/// Returns `None` if no summary matches; choosing a fallback is up to the
/// caller.
pub fn discover_total_count(html: &str, matcher: &SummaryMatcher) -> Option<usize> {
    let doc = Html::parse_document(html);

    let total = doc
        .select(&matcher.selector)
        .filter_map(element_text)
        .find_map(|text| matcher.match_text(&text));

    match total {
        Some(total) => ::log::debug!("Listing reports {} products", total),
        None => ::log::debug!("No product count summary found on listing page"),
    }

    total
}

/// Collects the absolute product URLs linked from a listing page
pub fn extract_links(html: &str, filter: &LinkFilter) -> BTreeSet<String> {
    let doc = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").unwrap();

    let links = doc
        .select(&link_selector)
        .filter_map(|e| e.value().attr("href"))
        .filter_map(|href| filter.accept(href))
        .collect::<BTreeSet<String>>();

    ::log::debug!("Listing page has {} product links", links.len());
    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).collect::<Vec<_>>()
        );
    }

    links
}
