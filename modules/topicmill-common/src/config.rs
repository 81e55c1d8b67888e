use std::env;
use std::time::Duration;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Language model
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,

    // Media factory
    pub factory_api_url: String,
    pub factory_api_key: String,

    // Cycle cadence
    pub post_cycle_interval: Duration,
    pub production_cycle_interval: Duration,

    // Per-cycle budgets
    pub posts_per_cycle: u32,
    pub harvest_batch: u32,

    // Near-duplicate thresholds
    pub title_threshold: f64,
    pub word_threshold: f64,
    pub bigram_threshold: f64,
    pub recent_window: u32,

    // Long-cycle curation
    pub controversy_count: u32,
    pub explainer_count: u32,
    pub min_quality_score: f64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            openai_api_url: env_or(
                "OPENAI_API_URL",
                "https://api.openai.com/v1/chat/completions",
            ),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            factory_api_url: env_or("FACTORY_API_URL", "http://localhost:5001"),
            factory_api_key: required_env("FACTORY_API_KEY"),
            post_cycle_interval: Duration::from_secs(env_parse("POST_CYCLE_SECS", 1800)),
            production_cycle_interval: Duration::from_secs(env_parse(
                "PRODUCTION_CYCLE_SECS",
                43_200,
            )),
            posts_per_cycle: env_parse("POSTS_PER_CYCLE", 3),
            harvest_batch: env_parse("HARVEST_BATCH", 15),
            title_threshold: env_parse("SIMILARITY_TITLE_THRESHOLD", 0.5),
            word_threshold: env_parse("SIMILARITY_WORD_THRESHOLD", 0.6),
            bigram_threshold: env_parse("SIMILARITY_BIGRAM_THRESHOLD", 0.55),
            recent_window: env_parse("SIMILARITY_RECENT_WINDOW", 200),
            controversy_count: env_parse("CURATION_CONTROVERSY_COUNT", 2),
            explainer_count: env_parse("CURATION_EXPLAINER_COUNT", 2),
            min_quality_score: env_parse("CURATION_MIN_QUALITY", 6.5),
        }
    }

    /// Log the effective configuration without credentials.
    pub fn log_redacted(&self) {
        info!(
            model = self.openai_model.as_str(),
            factory_url = self.factory_api_url.as_str(),
            post_cycle_secs = self.post_cycle_interval.as_secs(),
            production_cycle_secs = self.production_cycle_interval.as_secs(),
            posts_per_cycle = self.posts_per_cycle,
            harvest_batch = self.harvest_batch,
            recent_window = self.recent_window,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got: {raw}")),
        Err(_) => default,
    }
}
