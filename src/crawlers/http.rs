use crate::config::ScraperConfig;
use crate::crawlers::crawler::PageSource;
use crate::error::{ConfigError, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Fetches pages with plain HTTP GET requests
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    timeout: Duration,
}

impl HttpSource {
    /// Create a new HTTP source
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self, ConfigError> {
        Self::new(&config.user_agent, config.request_timeout())
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Connection {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_page(
        &self,
        url: &str,
        _ready_selector: Option<&str>,
    ) -> Result<String, FetchError> {
        ::log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            ::log::warn!("GET {} returned {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.classify(url, e))
    }
}
