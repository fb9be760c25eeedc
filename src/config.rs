use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Upper bound on simultaneous detail-page workers
pub const MAX_WORKERS: usize = 10;

/// Which page source implementation fetches markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Plain HTTP GET and static parse
    Http,
    /// Full browser navigation through a WebDriver server
    Browser,
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// How the "X of N products" summary is located on the first listing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Elements whose text is searched for the summary, in document order
    #[serde(default = "default_summary_selector")]
    pub selector: String,

    /// Token that precedes the total count ("de" in "1 - 48 de 656 productos")
    #[serde(default = "default_summary_marker")]
    pub marker: String,

    /// Word that follows the total count
    #[serde(default = "default_summary_noun")]
    pub noun: String,
}

/// Selectors and markers used by the detail page probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailConfig {
    #[serde(default = "default_name_selector")]
    pub name: String,

    #[serde(default = "default_price_selector")]
    pub price: String,

    #[serde(default = "default_previous_price_selector")]
    pub previous_price: String,

    #[serde(default = "default_discount_selector")]
    pub discount: String,

    /// Label preceding the manufacturer part number
    #[serde(default = "default_model_label")]
    pub model_label: String,

    /// Elements searched for the model label
    #[serde(default = "default_model_scope")]
    pub model_scope: String,

    /// Path fragment identifying brand links
    #[serde(default = "default_brand_path_marker")]
    pub brand_path_marker: String,

    /// Id of the description container
    #[serde(default = "default_description_id")]
    pub description_id: String,

    /// Element the browser source waits for before reading a detail page
    #[serde(default = "default_name_selector")]
    pub ready_selector: String,
}

/// Configuration for a catalog scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Listing URL without the `start` offset parameter
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Scheme and host prefixed to relative product links
    #[serde(default = "default_site_base_url")]
    pub site_base_url: String,

    /// Products per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Total product count assumed when the summary cannot be parsed.
    /// `null` makes that a fatal error instead.
    #[serde(default = "default_fallback_total_count")]
    pub fallback_total_count: Option<usize>,

    #[serde(default)]
    pub summary: SummaryConfig,

    /// Path fragment identifying product detail links
    #[serde(default = "default_product_path_marker")]
    pub product_path_marker: String,

    /// Whether product links on other hosts are kept
    #[serde(default)]
    pub allow_external: bool,

    /// Regex patterns for product URLs to drop
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Element the browser source waits for before reading a listing page
    #[serde(default = "default_listing_ready_selector")]
    pub listing_ready_selector: String,

    #[serde(default)]
    pub detail: DetailConfig,

    /// Pause between listing page requests
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Upper bound on a single fetch
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on waiting for a ready selector in the browser
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Maximum number of concurrent detail workers
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_source")]
    pub source: SourceKind,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Directory the output file is written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_export_format")]
    pub export_format: ExportFormat,
}

fn default_listing_url() -> String {
    "https://platanitos.com/pe/productos?filter_brand[]=Under+Armour&sort=timestamp_active_unix+desc"
        .to_string()
}

fn default_site_base_url() -> String {
    "https://platanitos.com".to_string()
}

fn default_page_size() -> usize {
    48
}

/// One page's worth: without a readable summary only the first page is walked
fn default_fallback_total_count() -> Option<usize> {
    Some(default_page_size())
}

fn default_summary_selector() -> String {
    "body".to_string()
}

fn default_summary_marker() -> String {
    "de".to_string()
}

fn default_summary_noun() -> String {
    "productos".to_string()
}

fn default_product_path_marker() -> String {
    "/pe/producto/".to_string()
}

fn default_listing_ready_selector() -> String {
    ".productoItem".to_string()
}

fn default_name_selector() -> String {
    "h1".to_string()
}

fn default_price_selector() -> String {
    "div.text-left".to_string()
}

fn default_previous_price_selector() -> String {
    "del".to_string()
}

fn default_discount_selector() -> String {
    "span.badge.bg-primary.badge-percentage".to_string()
}

fn default_model_label() -> String {
    "MPN:".to_string()
}

fn default_model_scope() -> String {
    "div, span, p, li, td, dt, dd, strong, b".to_string()
}

fn default_brand_path_marker() -> String {
    "/pe/marca/".to_string()
}

fn default_description_id() -> String {
    "description".to_string()
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_wait_timeout_secs() -> u64 {
    10
}

fn default_max_concurrency() -> usize {
    5
}

fn default_source() -> SourceKind {
    SourceKind::Http
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_export_format() -> ExportFormat {
    ExportFormat::Csv
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            selector: default_summary_selector(),
            marker: default_summary_marker(),
            noun: default_summary_noun(),
        }
    }
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            name: default_name_selector(),
            price: default_price_selector(),
            previous_price: default_previous_price_selector(),
            discount: default_discount_selector(),
            model_label: default_model_label(),
            model_scope: default_model_scope(),
            brand_path_marker: default_brand_path_marker(),
            description_id: default_description_id(),
            ready_selector: default_name_selector(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            site_base_url: default_site_base_url(),
            page_size: default_page_size(),
            fallback_total_count: default_fallback_total_count(),
            summary: SummaryConfig::default(),
            product_path_marker: default_product_path_marker(),
            allow_external: false,
            exclude_patterns: Vec::new(),
            listing_ready_selector: default_listing_ready_selector(),
            detail: DetailConfig::default(),
            request_delay_ms: default_request_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            source: default_source(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            user_agent: default_user_agent(),
            output_dir: default_output_dir(),
            export_format: default_export_format(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply environment overrides (`WEBDRIVER_URL`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Check the values that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url(&self.listing_url)?;
        parse_url(&self.site_base_url)?;
        if self.source == SourceKind::Browser {
            parse_url(&self.webdriver_url)?;
        }

        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if self.max_concurrency == 0 || self.max_concurrency > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "max_concurrency must be between 1 and {}, got {}",
                MAX_WORKERS, self.max_concurrency
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.wait_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "wait_timeout_secs must be at least 1".into(),
            ));
        }
        if self.product_path_marker.is_empty() {
            return Err(ConfigError::Invalid(
                "product_path_marker must not be empty".into(),
            ));
        }
        if self.summary.marker.trim().is_empty() {
            return Err(ConfigError::Invalid("summary.marker must not be empty".into()));
        }
        if self.detail.model_label.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "detail.model_label must not be empty".into(),
            ));
        }

        Ok(())
    }

    pub fn site_base(&self) -> Result<Url, ConfigError> {
        parse_url(&self.site_base_url)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}
