//! WebDriver-backed page loading for sites that render listings in script.
//! Needs a running driver (chromedriver on `http://localhost:9515` by default).

use crate::html::{PageLoader, USER_AGENT};
use crate::{Result, ScrapeError};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::debug;

pub struct BrowserSession {
    client: Client,
}

impl BrowserSession {
    /// Start a headless Chrome session on `endpoint`.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless",
                    "--disable-gpu",
                    format!("--user-agent={USER_AGENT}"),
                ]
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(endpoint)
            .await
            .map_err(|e| ScrapeError::WebDriver(e.to_string()))?;
        debug!(endpoint, "webdriver session started");
        Ok(Self { client })
    }

    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| ScrapeError::WebDriver(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PageLoader for BrowserSession {
    async fn load(&self, url: &str) -> Result<String> {
        self.client
            .goto(url)
            .await
            .map_err(|e| ScrapeError::WebDriver(e.to_string()))?;
        self.client
            .source()
            .await
            .map_err(|e| ScrapeError::WebDriver(e.to_string()))
    }
}
