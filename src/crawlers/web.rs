use crate::config::ScraperConfig;
use crate::crawlers::crawler::PageSource;
use crate::error::FetchError;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;

/// Fetches pages by driving a real browser over WebDriver.
///
/// Sessions are opened lazily and pooled, so each concurrent worker ends up
/// with its own browser session and reuses it for later pages.
pub struct BrowserSource {
    webdriver_url: String,
    capabilities: serde_json::Map<String, serde_json::Value>,
    wait_timeout: Duration,
    idle: Mutex<Vec<Client>>,
}

impl BrowserSource {
    pub fn new(webdriver_url: &str, headless: bool, wait_timeout: Duration) -> Self {
        let mut args = vec!["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"];
        if headless {
            args.push("--headless=new");
        } else {
            args.push("--start-maximized");
        }

        let mut capabilities = serde_json::Map::new();
        capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        Self {
            webdriver_url: webdriver_url.to_string(),
            capabilities,
            wait_timeout,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(&config.webdriver_url, config.headless, config.wait_timeout())
    }

    /// Takes an idle session or opens a new one
    async fn checkout(&self, url: &str) -> Result<Client, FetchError> {
        if let Some(client) = self.idle.lock().await.pop() {
            return Ok(client);
        }

        ::log::debug!("Opening new WebDriver session");
        self.connect_to_webdriver()
            .await
            .ok_or_else(|| FetchError::WebDriver {
                url: url.to_string(),
                message: format!("no WebDriver server reachable at {}", self.webdriver_url),
            })
    }

    async fn checkin(&self, client: Client) {
        self.idle.lock().await.push(client);
    }

    /// Connects to the WebDriver instance, trying common local ports if the
    /// configured one is not answering
    async fn connect_to_webdriver(&self) -> Option<Client> {
        match self.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Some(client);
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
            }
        }

        let fallback_urls = [
            "http://localhost:9515", // ChromeDriver default
            "http://localhost:4444", // Selenium / geckodriver default
            "http://127.0.0.1:4444",
        ];

        for url in fallback_urls.iter() {
            if *url == self.webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Some(client);
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        None
    }

    async fn connect(
        &self,
        webdriver_url: &str,
    ) -> Result<Client, fantoccini::error::NewSessionError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities.clone());
        builder.connect(webdriver_url).await
    }

    /// Navigates, waits for the ready element and reads the rendered source
    async fn load(
        &self,
        client: &Client,
        url: &str,
        ready_selector: Option<&str>,
    ) -> Result<String, CmdError> {
        client.goto(url).await?;

        if let Some(selector) = ready_selector {
            client
                .wait()
                .at_most(self.wait_timeout)
                .for_element(Locator::Css(selector))
                .await?;
        }

        client.source().await
    }

    fn classify(&self, url: &str, error: CmdError) -> FetchError {
        match error {
            CmdError::WaitTimeout => FetchError::Timeout {
                url: url.to_string(),
                seconds: self.wait_timeout.as_secs(),
            },
            other => FetchError::WebDriver {
                url: url.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// A lost session cannot be reused and is worth one reconnect
fn is_session_lost(error: &CmdError) -> bool {
    let message = error.to_string();
    message.contains("Unable to find session") || message.contains("invalid session id")
}

#[async_trait]
impl PageSource for BrowserSource {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch_page(
        &self,
        url: &str,
        ready_selector: Option<&str>,
    ) -> Result<String, FetchError> {
        let mut client = self.checkout(url).await?;
        let mut result = self.load(&client, url, ready_selector).await;

        if matches!(&result, Err(e) if is_session_lost(e)) {
            ::log::warn!("Lost WebDriver session while loading {}, reconnecting", url);
            let _ = client.close().await;
            client = match self.connect_to_webdriver().await {
                Some(client) => client,
                None => {
                    return Err(FetchError::WebDriver {
                        url: url.to_string(),
                        message: "session lost and reconnect failed".to_string(),
                    });
                }
            };
            result = self.load(&client, url, ready_selector).await;
        }

        match result {
            Ok(html) => {
                self.checkin(client).await;
                Ok(html)
            }
            Err(e) => {
                ::log::error!("Failed to load {}: {}", url, e);
                if is_session_lost(&e) {
                    let _ = client.close().await;
                } else {
                    self.checkin(client).await;
                }
                Err(self.classify(url, e))
            }
        }
    }

    async fn close(&self) {
        let clients: Vec<Client> = self.idle.lock().await.drain(..).collect();
        ::log::debug!("Closing {} WebDriver sessions", clients.len());
        for client in clients {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}
