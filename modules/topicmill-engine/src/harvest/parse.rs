// Per-strategy parsers. Each one satisfies the same contract: turn a raw
// source payload into (title, link, publish-marker) triples. Filtering and
// dedup happen later, uniformly, in the harvester.

use anyhow::{Context, Result};
use regex::Regex;

/// One candidate entry as extracted from a source.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub title: String,
    pub link: String,
    /// Publish marker as reported by the source. Free-form, may be empty.
    pub published: String,
}

/// Parse an RSS/Atom feed body.
pub fn parse_feed(body: &[u8]) -> Result<Vec<ParsedEntry>> {
    let feed = feed_rs::parser::parse(body).context("Failed to parse RSS/Atom feed")?;

    let entries = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let published = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default();
            Some(ParsedEntry {
                title: title.trim().to_string(),
                link,
                published,
            })
        })
        .collect();

    Ok(entries)
}

/// Extract front-page stories from Hacker News list markup:
/// `<span class="titleline"><a href="...">Title</a>`.
pub fn parse_hacker_news(html: &str, base_url: &str) -> Vec<ParsedEntry> {
    let re = Regex::new(r#"<span class="titleline"><a href="([^"]+)"[^>]*>([^<]+)</a>"#)
        .expect("valid regex");
    extract_list_entries(html, base_url, &re)
}

/// Extract front-page stories from Lobsters list markup:
/// `<a class="u-url" href="...">Title</a>`.
pub fn parse_lobsters(html: &str, base_url: &str) -> Vec<ParsedEntry> {
    let re = Regex::new(r#"<a[^>]*class="u-url"[^>]*href="([^"]+)"[^>]*>([^<]+)</a>"#)
        .expect("valid regex");
    extract_list_entries(html, base_url, &re)
}

/// Shared list-page extraction: first capture is the href, second the title.
/// Relative hrefs are resolved against `base_url`.
fn extract_list_entries(html: &str, base_url: &str, re: &Regex) -> Vec<ParsedEntry> {
    let base = url::Url::parse(base_url).ok();

    re.captures_iter(html)
        .filter_map(|cap| {
            let raw_href = &cap[1];
            let link = if raw_href.starts_with("http://") || raw_href.starts_with("https://") {
                raw_href.to_string()
            } else {
                base.as_ref()?.join(raw_href).ok()?.to_string()
            };
            let title = decode_entities(cap[2].trim());
            Some(ParsedEntry {
                title,
                link,
                published: String::new(),
            })
        })
        .collect()
}

/// Minimal HTML entity decoding for titles pulled out of list markup.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
}
