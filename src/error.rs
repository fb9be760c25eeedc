use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching a single page.
///
/// These are transient: they fail one listing page or one product, never the
/// whole run (except for the first listing page, see [`ScrapeError::Discovery`]).
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("timed out after {seconds}s fetching {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("WebDriver error for {url}: {message}")]
    WebDriver { url: String, message: String },
}

/// Errors in the configuration layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Errors while writing the output file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to move output into place at {path}: {message}")]
    Persist { path: PathBuf, message: String },
}

/// Fatal errors that abort a run. No output file is written when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not load the first listing page: {0}")]
    Discovery(#[source] FetchError),

    #[error("no product count found on {url} and no fallback is configured")]
    MissingTotalCount { url: String },

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
