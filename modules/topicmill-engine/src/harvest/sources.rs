/// How a source's payload is turned into topic candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// RSS/Atom feed entries.
    Feed,
    /// Hacker News front-page list markup.
    HackerNews,
    /// Lobsters front-page list markup.
    Lobsters,
}

/// A harvester source: where to fetch, how to label it, how to parse it.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    pub url: &'static str,
    pub category: &'static str,
    pub strategy: ParseStrategy,
}

/// Zero-cost source registry: public RSS where available, plain-HTML list
/// pages for the two community boards. Mass-interest categories only.
pub const SOURCES: &[SourceSpec] = &[
    // Reddit topical RSS (no API key required)
    SourceSpec {
        url: "https://www.reddit.com/r/entertainment/top/.rss?t=day",
        category: "entertainment",
        strategy: ParseStrategy::Feed,
    },
    SourceSpec {
        url: "https://www.reddit.com/r/sports/top/.rss?t=day",
        category: "sports",
        strategy: ParseStrategy::Feed,
    },
    SourceSpec {
        url: "https://www.reddit.com/r/todayilearned/top/.rss?t=day",
        category: "life",
        strategy: ParseStrategy::Feed,
    },
    SourceSpec {
        url: "https://www.reddit.com/r/technology/top/.rss?t=day",
        category: "tech",
        strategy: ParseStrategy::Feed,
    },
    SourceSpec {
        url: "https://www.reddit.com/r/worldnews/top/.rss?t=day",
        category: "world",
        strategy: ParseStrategy::Feed,
    },
    // Mainstream media RSS
    SourceSpec {
        url: "https://www.theverge.com/rss/index.xml",
        category: "tech",
        strategy: ParseStrategy::Feed,
    },
    SourceSpec {
        url: "https://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml",
        category: "entertainment",
        strategy: ParseStrategy::Feed,
    },
    SourceSpec {
        url: "https://www.espn.com/espn/rss/news",
        category: "sports",
        strategy: ParseStrategy::Feed,
    },
    // Trending search results
    SourceSpec {
        url: "https://news.google.com/rss/search?q=trending+viral&hl=en-US&gl=US&ceid=US:en",
        category: "trending",
        strategy: ParseStrategy::Feed,
    },
    // Community list pages (plain HTML, no headless browser needed)
    SourceSpec {
        url: "https://news.ycombinator.com/",
        category: "community",
        strategy: ParseStrategy::HackerNews,
    },
    SourceSpec {
        url: "https://lobste.rs/",
        category: "community",
        strategy: ParseStrategy::Lobsters,
    },
];
