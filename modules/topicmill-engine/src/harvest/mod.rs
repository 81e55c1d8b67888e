pub mod fetch;
pub mod parse;
pub mod sources;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use topicmill_common::{fingerprint, RawTopic};
use topicmill_store::ContentStore;

use fetch::PageFetcher;
use parse::ParsedEntry;
use sources::{ParseStrategy, SourceSpec, SOURCES};

/// Minimum title length (in chars) for a candidate to survive filtering.
const MIN_TITLE_CHARS: usize = 10;

/// Case-insensitive markers of promotional entries.
const PROMO_MARKERS: &[&str] = &["sponsored", "ad:"];

/// Aggregate counts from one harvesting pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HarvestStats {
    pub collected: u32,
    pub duplicates_skipped: u32,
    pub sources_failed: u32,
}

/// Collects exact-duplicate-free topic candidates across a fixed registry of
/// heterogeneous sources. One source failing, timing out, or parsing badly
/// never aborts the pass; it just contributes zero candidates.
pub struct Harvester {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn ContentStore>,
    registry: &'static [SourceSpec],
}

impl Harvester {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<dyn ContentStore>) -> Self {
        Self {
            fetcher,
            store,
            registry: SOURCES,
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn with_registry(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn ContentStore>,
        registry: &'static [SourceSpec],
    ) -> Self {
        Self {
            fetcher,
            store,
            registry,
        }
    }

    /// Collect up to `max_topics` candidates. The per-source quota
    /// `max(2, max_topics / source_count)` keeps any single source from
    /// exhausting the global budget. Exact duplicates are skipped before any
    /// generation cost is spent on them.
    pub async fn fetch_latest_topics(&self, max_topics: usize) -> (Vec<RawTopic>, HarvestStats) {
        let mut topics: Vec<RawTopic> = Vec::new();
        let mut stats = HarvestStats::default();
        let per_source_limit = (max_topics / self.registry.len().max(1)).max(2);

        for source in self.registry {
            if topics.len() >= max_topics {
                break;
            }

            let entries = match self.fetch_source(source).await {
                Ok(entries) => entries,
                Err(e) => {
                    stats.sources_failed += 1;
                    warn!(
                        source = source.url,
                        category = source.category,
                        error = %e,
                        "Source harvest failed"
                    );
                    continue;
                }
            };

            let mut from_source = 0usize;
            for entry in entries {
                if topics.len() >= max_topics || from_source >= per_source_limit {
                    break;
                }
                if !passes_filters(&entry.title) {
                    continue;
                }

                let fp = fingerprint(&entry.link, &entry.title);
                match self.store.exists_by_fingerprint(&fp).await {
                    Ok(true) => {
                        stats.duplicates_skipped += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(link = entry.link.as_str(), error = %e, "Fingerprint check failed, dropping candidate");
                        continue;
                    }
                }

                topics.push(RawTopic {
                    title: entry.title,
                    link: entry.link,
                    published: entry.published,
                    category: source.category.to_string(),
                    fingerprint: fp,
                });
                from_source += 1;
            }
        }

        stats.collected = topics.len() as u32;
        info!(
            collected = stats.collected,
            duplicates_skipped = stats.duplicates_skipped,
            sources_failed = stats.sources_failed,
            sources = self.registry.len(),
            "Harvest complete"
        );
        (topics, stats)
    }

    async fn fetch_source(&self, source: &SourceSpec) -> Result<Vec<ParsedEntry>> {
        let body = self.fetcher.get(source.url).await?;
        match source.strategy {
            ParseStrategy::Feed => parse::parse_feed(&body),
            ParseStrategy::HackerNews => Ok(parse::parse_hacker_news(
                &String::from_utf8_lossy(&body),
                source.url,
            )),
            ParseStrategy::Lobsters => Ok(parse::parse_lobsters(
                &String::from_utf8_lossy(&body),
                source.url,
            )),
        }
    }
}

fn passes_filters(title: &str) -> bool {
    if title.chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    let lower = title.to_lowercase();
    !PROMO_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{feed_body, MockPageFetcher};
    use topicmill_store::memory::MemoryContentStore;

    const fn feed_source(url: &'static str) -> SourceSpec {
        SourceSpec {
            url,
            category: "test",
            strategy: ParseStrategy::Feed,
        }
    }

    static TEN_SOURCES: &[SourceSpec] = &[
        feed_source("https://src0.example/feed"),
        feed_source("https://src1.example/feed"),
        feed_source("https://src2.example/feed"),
        feed_source("https://src3.example/feed"),
        feed_source("https://src4.example/feed"),
        feed_source("https://src5.example/feed"),
        feed_source("https://src6.example/feed"),
        feed_source("https://src7.example/feed"),
        feed_source("https://src8.example/feed"),
        feed_source("https://src9.example/feed"),
    ];

    static ONE_SOURCE: &[SourceSpec] = &[feed_source("https://solo.example/feed")];

    static TWO_SOURCES: &[SourceSpec] = &[
        feed_source("https://first.example/feed"),
        feed_source("https://second.example/feed"),
    ];

    fn titled(i: usize, j: usize) -> (String, String) {
        (
            format!("Source {i} headline number {j} with enough length"),
            format!("https://src{i}.example/story-{j}"),
        )
    }

    #[tokio::test]
    async fn respects_global_and_per_source_quotas() {
        // 10 sources, each offering 5 entries; max 15 ⇒ per-source cap is
        // max(2, 15/10) = 2 and at most 15 total.
        let mut fetcher = MockPageFetcher::new();
        for i in 0..10 {
            let entries: Vec<(String, String)> = (0..5).map(|j| titled(i, j)).collect();
            fetcher = fetcher.on_url(TEN_SOURCES[i].url, feed_body(&entries).into_bytes());
        }
        let store = Arc::new(MemoryContentStore::new());
        let harvester = Harvester::with_registry(Arc::new(fetcher), store, TEN_SOURCES);

        let (topics, stats) = harvester.fetch_latest_topics(15).await;

        assert!(topics.len() <= 15);
        assert_eq!(stats.collected as usize, topics.len());
        for i in 0..10 {
            let from_source = topics
                .iter()
                .filter(|t| t.link.starts_with(&format!("https://src{i}.")))
                .count();
            assert!(from_source <= 2, "source {i} contributed {from_source}");
        }
    }

    #[tokio::test]
    async fn exact_duplicates_never_returned() {
        let entries = vec![
            (
                "A fresh headline nobody has seen before".to_string(),
                "https://solo.example/fresh".to_string(),
            ),
            (
                "A headline that is already in the store".to_string(),
                "https://solo.example/known".to_string(),
            ),
        ];
        let fetcher =
            MockPageFetcher::new().on_url(ONE_SOURCE[0].url, feed_body(&entries).into_bytes());
        let store = Arc::new(MemoryContentStore::new());
        store.seed_fingerprint(&fingerprint(
            "https://solo.example/known",
            "A headline that is already in the store",
        ));

        let harvester = Harvester::with_registry(Arc::new(fetcher), store, ONE_SOURCE);
        let (topics, stats) = harvester.fetch_latest_topics(10).await;

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].link, "https://solo.example/fresh");
        assert_eq!(stats.duplicates_skipped, 1);
    }

    #[tokio::test]
    async fn short_and_promotional_titles_filtered() {
        let entries = vec![
            ("Too short".to_string(), "https://solo.example/short".to_string()),
            (
                "Sponsored: the best deal you will ever see".to_string(),
                "https://solo.example/promo".to_string(),
            ),
            (
                "AD: limited time offer on everything today".to_string(),
                "https://solo.example/promo2".to_string(),
            ),
            (
                "A legitimate headline of respectable length".to_string(),
                "https://solo.example/real".to_string(),
            ),
        ];
        let fetcher =
            MockPageFetcher::new().on_url(ONE_SOURCE[0].url, feed_body(&entries).into_bytes());
        let store = Arc::new(MemoryContentStore::new());

        let harvester = Harvester::with_registry(Arc::new(fetcher), store, ONE_SOURCE);
        let (topics, _) = harvester.fetch_latest_topics(10).await;

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].link, "https://solo.example/real");
    }

    #[tokio::test]
    async fn failed_source_does_not_abort_harvest() {
        // First source unregistered ⇒ fetch error; second still contributes.
        let entries = vec![(
            "A perfectly good headline from the second source".to_string(),
            "https://second.example/story".to_string(),
        )];
        let fetcher =
            MockPageFetcher::new().on_url(TWO_SOURCES[1].url, feed_body(&entries).into_bytes());
        let store = Arc::new(MemoryContentStore::new());

        let harvester = Harvester::with_registry(Arc::new(fetcher), store, TWO_SOURCES);
        let (topics, stats) = harvester.fetch_latest_topics(10).await;

        assert_eq!(topics.len(), 1);
        assert_eq!(stats.sources_failed, 1);
        assert_eq!(stats.collected, 1);
    }

    #[tokio::test]
    async fn carries_category_and_fingerprint() {
        let entries = vec![(
            "Some story with a reasonable headline".to_string(),
            "https://solo.example/story".to_string(),
        )];
        let fetcher =
            MockPageFetcher::new().on_url(ONE_SOURCE[0].url, feed_body(&entries).into_bytes());
        let store = Arc::new(MemoryContentStore::new());

        let harvester = Harvester::with_registry(Arc::new(fetcher), store, ONE_SOURCE);
        let (topics, _) = harvester.fetch_latest_topics(10).await;

        assert_eq!(topics[0].category, "test");
        assert_eq!(
            topics[0].fingerprint,
            fingerprint(
                "https://solo.example/story",
                "Some story with a reasonable headline"
            )
        );
    }
}
