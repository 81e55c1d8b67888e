use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Bounded timeout for any single source fetch. A source that never answers
/// inside this window counts as a failed source for the cycle.
const FETCH_TIMEOUT: Duration = Duration::from_secs(12);

/// Several of the registry sources answer bot user agents with 403s.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

/// HTTP fetching for harvester sources.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a URL's body. Bytes, not text — feeds declare their own encodings.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Source fetch failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Source returned status {status}");
        }

        Ok(resp
            .bytes()
            .await
            .context("Failed to read source body")?
            .to_vec())
    }
}
