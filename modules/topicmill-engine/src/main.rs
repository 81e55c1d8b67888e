use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ai_client::OpenAiClient;
use factory_client::FactoryClient;
use topicmill_common::Config;
use topicmill_engine::harvest::fetch::HttpFetcher;
use topicmill_engine::scheduler::{CurationPolicy, CycleLimits, CycleRunner};
use topicmill_engine::similarity::SimilarityConfig;
use topicmill_store::{PgContentStore, PgPersonaPool};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("topicmill=info".parse()?))
        .init();

    info!("Topicmill engine starting...");

    // Missing credentials fail here, before any cycle can run.
    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    let store = PgContentStore::new(pool.clone());
    store.migrate().await?;

    let model = OpenAiClient::new(&config.openai_api_key, &config.openai_model)?
        .with_api_url(&config.openai_api_url);
    let factory = FactoryClient::new(&config.factory_api_url, &config.factory_api_key);

    let runner = Arc::new(CycleRunner::new(
        Arc::new(store),
        Arc::new(PgPersonaPool::new(pool)),
        Arc::new(model),
        Arc::new(factory),
        Arc::new(HttpFetcher::new()),
        SimilarityConfig {
            title_threshold: config.title_threshold,
            word_threshold: config.word_threshold,
            bigram_threshold: config.bigram_threshold,
            recent_window: config.recent_window,
        },
        CycleLimits {
            posts_per_cycle: config.posts_per_cycle,
            harvest_batch: config.harvest_batch,
        },
        CurationPolicy {
            controversy_count: config.controversy_count,
            explainer_count: config.explainer_count,
            min_quality_score: config.min_quality_score,
        },
    ));

    // Long cycle in the background; within each task, work is sequential and
    // ticks never overlap a still-running pass.
    let production_runner = runner.clone();
    let production_interval = config.production_cycle_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(production_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the factory gets
        // a full interval of content before the first curation pass.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = production_runner.run_production_cycle().await {
                error!(error = %e, "Production cycle failed");
            }
        }
    });

    let mut ticker = tokio::time::interval(config.post_cycle_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = runner.run_post_cycle().await {
            error!(error = %e, "Post cycle failed");
        }
    }
}
