use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::ScrapeError;

const USER_AGENT: &str = "CampusScrape/0.1 (+https://github.com/mike/campus-scrape)";
const TIMEOUT: Duration = Duration::from_secs(20);

/// Seam between the pipeline and the network; tests substitute a canned
/// implementation.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    /// One GET, no retries. Non-2xx and transport errors both surface as
    /// `ScrapeError::Fetch` so the caller skips the candidate.
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let fetch_error = |err: reqwest::Error| ScrapeError::Fetch {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        };

        let response = self.client.get(url).send().map_err(fetch_error)?;
        let response = response.error_for_status().map_err(fetch_error)?;
        response.text().map_err(fetch_error)
    }
}
