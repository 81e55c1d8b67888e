pub mod error;
pub mod types;

pub use error::{AiError, Result};
pub use types::{ChatMessage, ChatRequest, ChatResponse};

use std::time::Duration;

use tracing::{debug, info};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling temperature for community-content generation.
const TEMPERATURE: f32 = 0.85;
/// Upper bound on generated tokens per completion.
const MAX_TOKENS: u32 = 3000;

/// Chat-completion client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client for the given key and model. An empty key is a fatal
    /// configuration error surfaced immediately, not at call time.
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AiError::MissingCredentials);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Point the client at a different completions endpoint (proxies,
    /// compatible self-hosted servers).
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the assistant's text.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = self.model.as_str(), "Chat completion request");

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let data: ChatResponse = serde_json::from_str(&body)?;
        let text = data
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| AiError::MalformedResponse("response carried no choices".into()))?;

        if text.is_empty() {
            return Err(AiError::MalformedResponse("empty completion text".into()));
        }

        info!(model = self.model.as_str(), chars = text.len(), "Completion received");
        Ok(text)
    }
}
