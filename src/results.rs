use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One product extracted from a detail page
///
/// Every optional field is either the trimmed text found on the page or
/// `None`, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: Option<String>,
    pub price: Option<String>,
    pub previous_price: Option<String>,
    pub discount_percent: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,

    /// URL of the detail page
    pub url: String,
}

impl ProductRecord {
    /// Column names in output order
    pub const FIELDS: [&'static str; 8] = [
        "name",
        "price",
        "previous_price",
        "discount_percent",
        "brand",
        "model",
        "description",
        "url",
    ];

    /// Record for a page that could not be loaded
    pub fn unreachable(url: &str) -> Self {
        Self {
            name: None,
            price: None,
            previous_price: None,
            discount_percent: None,
            brand: None,
            model: None,
            description: None,
            url: url.to_string(),
        }
    }

    /// A record counts as extracted when its name was found
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
    }
}

/// Where a non-fatal error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorScope {
    ListingPage,
    Product,
}

/// A failure tied to one URL that did not stop the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub url: String,
    pub scope: ErrorScope,
    pub reason: String,
}

impl ItemError {
    pub fn new(url: &str, scope: ErrorScope, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            scope,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.scope {
            ErrorScope::ListingPage => "listing page",
            ErrorScope::Product => "product",
        };
        write!(f, "{} {}: {}", scope, self.url, self.reason)
    }
}

/// How a run ended when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every discovered link was processed
    Completed,
    /// The listing pages yielded no product links
    NoProductsFound,
    /// Stopped early on request; collected records are kept
    Cancelled,
}

/// Aggregate of one pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,

    /// Records ordered by URL
    pub records: Vec<ProductRecord>,

    /// Per-page and per-product failures
    pub errors: Vec<ItemError>,

    /// Total products reported by the listing (or the fallback)
    pub total_count: usize,

    /// Listing pages successfully loaded
    pub pages_visited: usize,

    /// Distinct product links collected
    pub links_found: usize,

    /// Written file, if any records were exported
    pub output: Option<PathBuf>,
}

impl Default for RunResult {
    fn default() -> Self {
        Self {
            status: RunStatus::Completed,
            records: Vec::new(),
            errors: Vec::new(),
            total_count: 0,
            pages_visited: 0,
            links_found: 0,
            output: None,
        }
    }
}

impl RunResult {
    /// Records with a name
    pub fn successful(&self) -> usize {
        self.records.iter().filter(|r| r.is_complete()).count()
    }

    /// Records without a name
    pub fn errored(&self) -> usize {
        self.records.len() - self.successful()
    }

    /// One-line human readable outcome
    pub fn summary(&self) -> String {
        match self.status {
            RunStatus::NoProductsFound => "No products found".to_string(),
            RunStatus::Completed | RunStatus::Cancelled => {
                let prefix = if self.status == RunStatus::Cancelled {
                    "Scraping cancelled"
                } else {
                    "Scraping complete"
                };
                format!(
                    "{}: {} products saved, {} errors",
                    prefix,
                    self.successful(),
                    self.errored()
                )
            }
        }
    }
}
