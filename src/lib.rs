#![allow(clippy::too_many_arguments)]

// Re-export modules
pub mod config;
pub mod crawlers;
pub mod error;
pub mod export;
pub mod filter;
pub mod parsers;
pub mod pipeline;
pub mod progress;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ExportFormat, ScraperConfig, SourceKind};
pub use error::{ConfigError, ExportError, FetchError, ScrapeError};
pub use pipeline::{CancelFlag, LinkSet, Pipeline, RunState};
pub use progress::{LogProgress, ProgressReporter};
pub use results::{ItemError, ProductRecord, RunResult, RunStatus};

use crawlers::{BrowserSource, HttpSource, PageSource};
use std::path::Path;
use std::sync::Arc;

/// Main builder for a catalog scrape
pub struct Catalog {
    config: ScraperConfig,
    cancel: CancelFlag,
}

impl Catalog {
    /// Create a new builder with the given configuration.
    ///
    /// Environment overrides are applied here, so later `with_*` calls win.
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config: config.with_env_overrides(),
            cancel: CancelFlag::new(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::new(ScraperConfig::from_file(path)?))
    }

    /// Load configuration from a JSON string
    pub fn from_config_str(config_str: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(ScraperConfig::from_json(config_str)?))
    }

    /// Set the listing URL to start from
    pub fn with_listing_url(mut self, listing_url: &str) -> Self {
        self.config.listing_url = listing_url.to_string();
        self
    }

    /// Set the maximum number of concurrent detail workers
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Set the pause between listing page requests
    pub fn with_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.request_delay_ms = delay_ms;
        self
    }

    /// Choose between plain HTTP and browser fetching
    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.config.source = source;
        self
    }

    /// Set the WebDriver endpoint used by the browser source
    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    /// Set where the output file goes
    pub fn with_output_dir(mut self, output_dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.config.export_format = format;
        self
    }

    /// Flag that stops the run early when tripped
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape the catalog and write the output file
    pub async fn run(self, progress: &dyn ProgressReporter) -> Result<RunResult, ScrapeError> {
        let (pipeline, source) = self.build()?;
        let result = pipeline.run(progress).await;
        source.close().await;
        result
    }

    /// Only walk the listing and return the product links
    pub async fn collect_links(
        self,
        progress: &dyn ProgressReporter,
    ) -> Result<LinkSet, ScrapeError> {
        let (pipeline, source) = self.build()?;
        let result = pipeline.collect_links(progress).await;
        source.close().await;
        result
    }

    fn build(self) -> Result<(Pipeline, Arc<dyn PageSource>), ConfigError> {
        let config = self.config;
        config.validate()?;

        let source: Arc<dyn PageSource> = match config.source {
            SourceKind::Http => Arc::new(HttpSource::from_config(&config)?),
            SourceKind::Browser => {
                ::log::info!("Using WebDriver at {}", config.webdriver_url);
                Arc::new(BrowserSource::from_config(&config))
            }
        };
        ::log::debug!("Fetching pages with the {} source", source.name());

        let pipeline = Pipeline::new(config, Arc::clone(&source))?.with_cancel_flag(self.cancel);
        Ok((pipeline, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_webdriver_url_beats_environment() {
        // SAFETY: no other test in this crate reads or writes WEBDRIVER_URL
        unsafe { std::env::set_var("WEBDRIVER_URL", "http://from-env:9999") };

        let from_env = Catalog::new(ScraperConfig::default());
        assert_eq!(from_env.config().webdriver_url, "http://from-env:9999");

        let explicit = Catalog::new(ScraperConfig::default())
            .with_source(SourceKind::Browser)
            .with_webdriver_url("http://localhost:1234");
        let (pipeline, _source) = explicit.build().unwrap();

        unsafe { std::env::remove_var("WEBDRIVER_URL") };

        assert_eq!(pipeline.config().webdriver_url, "http://localhost:1234");
    }
}
