pub mod error;
pub mod types;

pub use error::{FactoryError, Result};
pub use types::{
    CuratedItem, CurationPicks, CurationRequest, FactoryEnvelope, ProducedArtifacts,
    ProductionRequest,
};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

/// Client for the media factory API. Every request carries the shared
/// `X-API-Key` credential.
pub struct FactoryClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FactoryClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Ask the factory to produce a media artifact for a committed item.
    /// Synchronous: blocks until the factory reports completed or failed.
    pub async fn produce(&self, item_id: i64, video_type: &str) -> Result<ProducedArtifacts> {
        info!(item_id, video_type, "Production request");
        let body = ProductionRequest { item_id, video_type };
        self.post_json("/api/generate", &body).await
    }

    /// Ask the factory for a quality-thresholded batch curation decision.
    pub async fn curate(&self, request: &CurationRequest) -> Result<CurationPicks> {
        info!(
            controversy = request.controversy_count,
            explainer = request.explainer_count,
            min_quality = request.min_quality_score,
            "Curation request"
        );
        self.post_json("/api/curate/premium", request).await
    }

    /// Factory health map, passed through as-is.
    pub async fn status(&self) -> Result<serde_json::Value> {
        self.get_raw("/api/status").await
    }

    /// Rolling performance stats over the given window, passed through as-is.
    pub async fn performance_stats(&self, window_days: u32) -> Result<serde_json::Value> {
        self.get_raw(&format!("/api/performance/stats?days={window_days}"))
            .await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await?;

        Self::unwrap_envelope(resp).await
    }

    async fn get_raw(&self, path: &str) -> Result<serde_json::Value> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FactoryError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }

    async fn unwrap_envelope<T: DeserializeOwned + Default>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FactoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: FactoryEnvelope<T> = resp.json().await?;
        if !envelope.success {
            return Err(FactoryError::Rejected(
                envelope.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(envelope.data.unwrap_or_default())
    }
}
