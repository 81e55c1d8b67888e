// Primary-content generation: one harvested topic in, one post (plus its
// short-video script) out. Failures propagate; the cycle treats a failed
// compose as a skipped topic and moves on.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use topicmill_common::{ContentKind, Persona, RawTopic};

use crate::traits::TextModel;

const COMPOSE_TASK: &str = r#"Write a community post reacting to the news topic below.

Respond with a single JSON object and nothing else:
{"title": "...", "body": "...", "script": {"hook": "...", "story": "...", "cta": "...", "angle": "controversy|explainer"}}

Rules:
- title: punchy, under 80 characters, no clickbait ellipses
- body: 3 to 6 sentences with a strong, concrete take. No markdown.
- script.hook: one line that stops a scrolling viewer
- script.story: 2-3 lines retelling the core of the topic
- script.cta: one line inviting reactions
- script.angle: "controversy" if the post picks a fight, "explainer" if it informs"#;

/// A generated post ready for persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposedPost {
    pub title: String,
    pub body: String,
    pub script: ScriptDraft,
}

/// Short-video script attached to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDraft {
    #[serde(default)]
    pub hook: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub cta: String,
    /// Editorial angle; decides the downstream production category.
    #[serde(default)]
    pub angle: String,
}

impl ComposedPost {
    pub fn kind(&self) -> ContentKind {
        ContentKind::from_angle(&self.script.angle)
    }
}

pub struct PostComposer {
    model: Arc<dyn TextModel>,
}

impl PostComposer {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Generate a post for one topic, optionally in an authoring persona's
    /// voice. An error here means the topic gets skipped; nothing persists.
    pub async fn compose(&self, topic: &RawTopic, author: Option<&Persona>) -> Result<ComposedPost> {
        let task = format!(
            "{COMPOSE_TASK}\n\nTopic title: {}\nCategory: {}\nSource link: {}\nPublished: {}",
            topic.title, topic.category, topic.link, topic.published,
        );
        let voice = author.map(|p| p.voice_prompt.as_str()).unwrap_or("");

        let raw = self
            .model
            .complete("", voice, &task)
            .await
            .context("Post generation call failed")?;

        let post: ComposedPost = serde_json::from_str(strip_code_fence(&raw))
            .context("Model returned malformed post JSON")?;

        if post.title.trim().is_empty() || post.body.trim().is_empty() {
            anyhow::bail!("Model returned an empty title or body");
        }
        Ok(post)
    }
}

/// Models wrap JSON in markdown fences often enough to tolerate it.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTextModel;

    fn topic() -> RawTopic {
        RawTopic {
            title: "City approves late-night transit pilot".to_string(),
            link: "https://example.com/transit".to_string(),
            published: String::new(),
            category: "society".to_string(),
            fingerprint: "f".repeat(64),
        }
    }

    const GOOD_REPLY: &str = r#"{"title": "Night buses at last", "body": "The pilot starts next month. Critics already call it a waste.", "script": {"hook": "Your city finally sleeps less", "story": "Late-night buses are coming.", "cta": "Would you ride one?", "angle": "controversy"}}"#;

    #[tokio::test]
    async fn composes_post_from_model_json() {
        let model = Arc::new(MockTextModel::new(GOOD_REPLY));
        let composer = PostComposer::new(model);
        let post = composer.compose(&topic(), None).await.unwrap();
        assert_eq!(post.title, "Night buses at last");
        assert_eq!(post.kind(), ContentKind::Controversy);
    }

    #[tokio::test]
    async fn tolerates_fenced_json() {
        let fenced = format!("```json\n{GOOD_REPLY}\n```");
        let model = Arc::new(MockTextModel::new(&fenced));
        let composer = PostComposer::new(model);
        let post = composer.compose(&topic(), None).await.unwrap();
        assert_eq!(post.script.angle, "controversy");
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let model = Arc::new(MockTextModel::new("I refuse to answer in JSON."));
        let composer = PostComposer::new(model);
        assert!(composer.compose(&topic(), None).await.is_err());
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = Arc::new(MockTextModel::failing());
        let composer = PostComposer::new(model);
        assert!(composer.compose(&topic(), None).await.is_err());
    }

    #[tokio::test]
    async fn empty_body_rejected() {
        let empty = r#"{"title": "t", "body": "  ", "script": {}}"#;
        let model = Arc::new(MockTextModel::new(empty));
        let composer = PostComposer::new(model);
        assert!(composer.compose(&topic(), None).await.is_err());
    }

    #[tokio::test]
    async fn missing_angle_defaults_to_explainer() {
        let no_angle = r#"{"title": "A title", "body": "A body sentence.", "script": {"hook": "h"}}"#;
        let model = Arc::new(MockTextModel::new(no_angle));
        let composer = PostComposer::new(model);
        let post = composer.compose(&topic(), None).await.unwrap();
        assert_eq!(post.kind(), ContentKind::Explainer);
    }
}
