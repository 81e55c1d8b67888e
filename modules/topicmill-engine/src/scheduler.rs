// Cycle orchestration. Two periodic jobs drive the pipeline:
//
// - the post cycle: harvest topics, generate posts under a per-cycle cap,
//   gate near-duplicates, persist, fan out persona replies, request
//   production;
// - the production cycle: ask the factory to curate a premium batch and
//   issue production requests for each pick.
//
// Failure containment is per unit of work. One source, one topic, or one
// reply failing never aborts its cycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::seq::IndexedRandom;
use tracing::{error, info, warn};

use topicmill_common::{ContentItem, ContentKind, NewContentItem, Persona, RawTopic};
use topicmill_store::{ContentStore, PersonaPool, StoreError};

use crate::compose::PostComposer;
use crate::harvest::fetch::PageFetcher;
use crate::harvest::Harvester;
use crate::replies::ReplyOrchestrator;
use crate::similarity::{SimilarityConfig, SimilarityDetector};
use crate::traits::{ProductionService, TextModel};

/// Author identity used when the persona pool is empty.
const HOUSE_AUTHOR_ID: &str = "house";
const HOUSE_AUTHOR_NAME: &str = "Topicmill";

/// Per-cycle generation budgets.
#[derive(Debug, Clone, Copy)]
pub struct CycleLimits {
    /// Hard cap on new items per post cycle.
    pub posts_per_cycle: u32,
    /// How many candidates to harvest per cycle. Over-fetched relative to
    /// `posts_per_cycle` to absorb duplicate and generation losses.
    pub harvest_batch: u32,
}

impl Default for CycleLimits {
    fn default() -> Self {
        Self {
            posts_per_cycle: 3,
            harvest_batch: 15,
        }
    }
}

/// Long-cycle curation parameters.
#[derive(Debug, Clone, Copy)]
pub struct CurationPolicy {
    pub controversy_count: u32,
    pub explainer_count: u32,
    pub min_quality_score: f64,
}

impl Default for CurationPolicy {
    fn default() -> Self {
        Self {
            controversy_count: 2,
            explainer_count: 2,
            min_quality_score: 6.5,
        }
    }
}

/// Outcome counts for one post cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub created: u32,
    pub skipped: u32,
    /// Total candidates seen this cycle.
    pub total: u32,
}

impl std::fmt::Display for CycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "created={} skipped={} total={}",
            self.created, self.skipped, self.total
        )
    }
}

enum PublishOutcome {
    Created(ContentItem, ContentKind),
    /// Rejected by the near-duplicate detector or the store's fingerprint
    /// constraint.
    Duplicate,
}

pub struct CycleRunner {
    store: Arc<dyn ContentStore>,
    personas: Arc<dyn PersonaPool>,
    production: Arc<dyn ProductionService>,
    harvester: Harvester,
    detector: SimilarityDetector,
    composer: PostComposer,
    replies: ReplyOrchestrator,
    limits: CycleLimits,
    curation: CurationPolicy,
}

impl CycleRunner {
    pub fn new(
        store: Arc<dyn ContentStore>,
        personas: Arc<dyn PersonaPool>,
        model: Arc<dyn TextModel>,
        production: Arc<dyn ProductionService>,
        fetcher: Arc<dyn PageFetcher>,
        similarity: SimilarityConfig,
        limits: CycleLimits,
        curation: CurationPolicy,
    ) -> Self {
        Self {
            harvester: Harvester::new(fetcher, store.clone()),
            detector: SimilarityDetector::new(similarity),
            composer: PostComposer::new(model.clone()),
            replies: ReplyOrchestrator::new(model, personas.clone(), store.clone()),
            store,
            personas,
            production,
            limits,
            curation,
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn with_harvester(mut self, harvester: Harvester) -> Self {
        self.harvester = harvester;
        self
    }

    /// One harvest + generate + reply + production-request pass.
    pub async fn run_post_cycle(&self) -> Result<CycleStats> {
        info!("Starting post cycle");

        let (topics, _) = self
            .harvester
            .fetch_latest_topics(self.limits.harvest_batch as usize)
            .await;

        let mut stats = CycleStats {
            total: topics.len() as u32,
            ..Default::default()
        };

        if topics.is_empty() {
            info!("No topics harvested this cycle (duplicates or failed sources); nothing to do");
            return Ok(stats);
        }

        let pool = match self.personas.list_all().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Failed to load persona pool, posting without author persona");
                Vec::new()
            }
        };

        for topic in &topics {
            if stats.created >= self.limits.posts_per_cycle {
                break;
            }

            let author = pool.choose(&mut rand::rng());
            match self.publish_topic(topic, author).await {
                Ok(PublishOutcome::Created(item, kind)) => {
                    stats.created += 1;

                    // Post-commit work: reply and production failures are
                    // logged but never roll the item back.
                    if let Err(e) = self.replies.generate_replies(&item).await {
                        warn!(item_id = item.id, error = %e, "Reply generation failed");
                    }
                    self.dispatch_production(item.id, kind).await;
                }
                Ok(PublishOutcome::Duplicate) => {
                    stats.skipped += 1;
                    info!(title = topic.title.as_str(), "Skipped duplicate topic");
                }
                Err(e) => {
                    stats.skipped += 1;
                    warn!(title = topic.title.as_str(), error = %e, "Topic skipped after generation error");
                }
            }
        }

        info!(
            created = stats.created,
            skipped = stats.skipped,
            total = stats.total,
            "Post cycle complete"
        );
        Ok(stats)
    }

    /// Generate, gate, and persist one topic. Errors mean nothing was
    /// committed for this topic.
    async fn publish_topic(
        &self,
        topic: &RawTopic,
        author: Option<&Persona>,
    ) -> Result<PublishOutcome> {
        let post = self.composer.compose(topic, author).await?;

        let candidate = format!("{} {}", post.title, post.body);
        let recent = self
            .store
            .recent_items(self.detector.config().recent_window)
            .await
            .context("Failed to load recent items for similarity check")?;
        if self.detector.is_too_similar(&candidate, &recent) {
            return Ok(PublishOutcome::Duplicate);
        }

        let kind = post.kind();
        let script =
            serde_json::to_string(&post.script).context("Failed to serialize script")?;
        let (persona_id, author_name) = match author {
            Some(p) => (p.id.clone(), p.name.clone()),
            None => (HOUSE_AUTHOR_ID.to_string(), HOUSE_AUTHOR_NAME.to_string()),
        };

        let new_item = NewContentItem {
            persona_id: persona_id.clone(),
            author_name,
            category: topic.category.clone(),
            title: post.title.clone(),
            body: post.body.clone(),
            script: Some(script),
            fingerprint: topic.fingerprint.clone(),
            source_url: topic.link.clone(),
        };

        let id = match self.store.create_item(&new_item).await {
            Ok(id) => id,
            // Lost the race against a concurrent writer; the constraint is
            // the real invariant, so treat it as a duplicate skip.
            Err(StoreError::DuplicateFingerprint) => return Ok(PublishOutcome::Duplicate),
            Err(e) => return Err(e).context("Failed to persist content item"),
        };

        info!(item_id = id, title = post.title.as_str(), "Content item committed");

        Ok(PublishOutcome::Created(
            ContentItem {
                id,
                persona_id,
                category: topic.category.clone(),
                title: post.title,
                body: post.body,
                created_at: Utc::now(),
            },
            kind,
        ))
    }

    /// Issue the downstream production request and record the outcome on the
    /// item's queue row. The committed item is never rolled back on failure;
    /// the failed queue row is the retry hook.
    async fn dispatch_production(&self, item_id: i64, kind: ContentKind) {
        match self.production.request_production(item_id, kind).await {
            Ok(artifacts) => {
                info!(item_id, kind = kind.tag(), "Production request succeeded");
                if let Err(e) = self
                    .store
                    .mark_production_completed(
                        item_id,
                        artifacts.video_path.as_deref(),
                        artifacts.thumbnail_path.as_deref(),
                    )
                    .await
                {
                    warn!(item_id, error = %e, "Failed to record production completion");
                }
            }
            Err(e) => {
                warn!(item_id, kind = kind.tag(), error = %e, "Production request failed");
                if let Err(e) = self.store.mark_production_failed(item_id, &e.to_string()).await {
                    warn!(item_id, error = %e, "Failed to record production failure");
                }
            }
        }
    }

    /// Curated batch production pass.
    pub async fn run_production_cycle(&self) -> Result<()> {
        info!("Starting curated production cycle");

        let picks = match self
            .production
            .request_curation(
                self.curation.controversy_count,
                self.curation.explainer_count,
                self.curation.min_quality_score,
            )
            .await
        {
            Ok(picks) => picks,
            Err(e) => {
                error!(error = %e, "Curation request failed");
                return Ok(());
            }
        };

        info!(
            controversy = picks.controversy.len(),
            explainer = picks.explainer.len(),
            "Curation picks received"
        );

        for pick in &picks.controversy {
            self.dispatch_production(pick.item_id, ContentKind::Controversy)
                .await;
        }
        for pick in &picks.explainer {
            self.dispatch_production(pick.item_id, ContentKind::Explainer)
                .await;
        }

        Ok(())
    }
}
