use crate::scrape::ScrapeError;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

/// Retrieves the HTML body behind a URL.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Blocking HTTP fetcher. Certificate validation is disabled because the
/// monitoring site serves an invalid chain.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(|source| ScrapeError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(url, "fetching");
        let http = |source| ScrapeError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(http)
    }
}
