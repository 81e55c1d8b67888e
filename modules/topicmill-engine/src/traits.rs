// Trait abstractions for the pipeline's external collaborators.
//
// TextModel wraps the chat-completion client; ProductionService wraps the
// media factory. Together with the store traits they let the whole cycle run
// against MockTextModel / MockProductionService / MemoryContentStore:
// no network, no credentials, no Docker.

use anyhow::Result;
use async_trait::async_trait;

use factory_client::{CurationPicks, CurationRequest, FactoryClient, ProducedArtifacts};
use topicmill_common::ContentKind;

/// Synchronous text-completion capability. Any failure is an `Err`; there is
/// no sentinel string to check for.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Complete a generation task. `context` describes the recent board
    /// situation and may be empty; `persona_prompt` is the voice to write in.
    async fn complete(&self, context: &str, persona_prompt: &str, task: &str) -> Result<String>;
}

#[async_trait]
impl TextModel for ai_client::OpenAiClient {
    async fn complete(&self, context: &str, persona_prompt: &str, task: &str) -> Result<String> {
        let system = "You are a helpful AI assistant who writes engaging community posts. \
                      Be creative, provocative, and entertaining.";
        let user = format!(
            "### System instructions ###\n\
             You are a real user active on an online community board right now.\n\
             Recent board situation: {}\n\
             Your persona and voice: {}\n\
             Task: {}\n\
             ------------------\n\
             Using the context above, write the reaction the task asks for.",
            if context.is_empty() {
                "The board is quiet at the moment."
            } else {
                context
            },
            persona_prompt,
            task,
        );
        Ok(self.chat(system, &user).await?)
    }
}

/// Downstream media production and curation capability.
#[async_trait]
pub trait ProductionService: Send + Sync {
    /// Ask the factory to produce a media artifact for a committed item.
    async fn request_production(&self, item_id: i64, kind: ContentKind)
        -> Result<ProducedArtifacts>;

    /// Ask the factory for a quality-thresholded batch curation decision.
    async fn request_curation(
        &self,
        controversy_count: u32,
        explainer_count: u32,
        min_quality_score: f64,
    ) -> Result<CurationPicks>;
}

#[async_trait]
impl ProductionService for FactoryClient {
    async fn request_production(
        &self,
        item_id: i64,
        kind: ContentKind,
    ) -> Result<ProducedArtifacts> {
        Ok(self.produce(item_id, kind.tag()).await?)
    }

    async fn request_curation(
        &self,
        controversy_count: u32,
        explainer_count: u32,
        min_quality_score: f64,
    ) -> Result<CurationPicks> {
        let request = CurationRequest {
            controversy_count,
            explainer_count,
            min_quality_score,
        };
        Ok(self.curate(&request).await?)
    }
}
