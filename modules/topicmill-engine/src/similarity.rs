// Near-duplicate detection over a rolling window of recent items.
//
// The exact-fingerprint gate only catches the same (link, title) pair; the
// model can still paraphrase a story that arrived through a different source.
// Three tiers, cheapest and most decisive first, short-circuiting on the
// first hit: title word overlap, full-text word overlap, bigram overlap.
// Bigrams catch paraphrases that shuffle word choice but keep phrase
// structure, which unordered word sets miss.

use std::collections::HashSet;

use tracing::debug;

use topicmill_common::ContentItem;

/// Thresholds for the three-tier check. The defaults are empirically chosen
/// constants, not derived values; treat them as starting points and tune.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityConfig {
    pub title_threshold: f64,
    pub word_threshold: f64,
    pub bigram_threshold: f64,
    /// How many recent items to compare against.
    pub recent_window: u32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            title_threshold: 0.5,
            word_threshold: 0.6,
            bigram_threshold: 0.55,
            recent_window: 200,
        }
    }
}

pub struct SimilarityDetector {
    config: SimilarityConfig,
}

impl SimilarityDetector {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// True if `candidate` is too close to any of `recent` to publish.
    pub fn is_too_similar(&self, candidate: &str, recent: &[ContentItem]) -> bool {
        let candidate_title = approximate_title(candidate);

        for item in recent {
            let existing = format!("{} {}", item.title, item.body);

            let title_sim = jaccard_words(&item.title, candidate_title);
            if title_sim > self.config.title_threshold {
                debug!(item_id = item.id, similarity = title_sim, "Title overlap too high");
                return true;
            }

            let word_sim = jaccard_words(&existing, candidate);
            if word_sim > self.config.word_threshold {
                debug!(item_id = item.id, similarity = word_sim, "Word overlap too high");
                return true;
            }

            let bigram_sim = jaccard_bigrams(&existing, candidate);
            if bigram_sim > self.config.bigram_threshold {
                debug!(item_id = item.id, similarity = bigram_sim, "Bigram overlap too high");
                return true;
            }
        }
        false
    }
}

/// The candidate's first ~50 chars stand in for its title; text with no
/// whitespace is compared whole.
fn approximate_title(text: &str) -> &str {
    if !text.contains(char::is_whitespace) {
        return text;
    }
    match text.char_indices().nth(50) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

fn jaccard<T: std::hash::Hash + Eq>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Jaccard similarity over unordered word sets.
pub fn jaccard_words(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = tokens(a).into_iter().collect();
    let set_b: HashSet<String> = tokens(b).into_iter().collect();
    jaccard(&set_a, &set_b)
}

/// Jaccard similarity over unordered sets of adjacent word pairs.
pub fn jaccard_bigrams(a: &str, b: &str) -> f64 {
    jaccard(&bigram_set(a), &bigram_set(b))
}

fn bigram_set(text: &str) -> HashSet<String> {
    tokens(text)
        .windows(2)
        .map(|pair| pair.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64, title: &str, body: &str) -> ContentItem {
        ContentItem {
            id,
            persona_id: "p1".to_string(),
            category: "test".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn near_identical_titles_flagged() {
        let detector = SimilarityDetector::new(SimilarityConfig::default());
        let recent = vec![item(
            1,
            "Local team wins championship after dramatic overtime",
            "The underdogs took the trophy home last night.",
        )];
        let candidate = "Local team wins championship in dramatic overtime win";
        assert!(
            jaccard_words(&recent[0].title, candidate) > 0.5,
            "expected title Jaccard above threshold"
        );
        assert!(detector.is_too_similar(candidate, &recent));
    }

    #[test]
    fn disjoint_titles_score_zero() {
        let detector = SimilarityDetector::new(SimilarityConfig::default());
        let recent = vec![item(
            1,
            "Quarterly earnings beat analyst expectations",
            "Markets reacted positively this morning.",
        )];
        let candidate = "Volcanic eruption disrupts island ferry schedules";
        assert_eq!(jaccard_words(&recent[0].title, candidate), 0.0);
        assert!(!detector.is_too_similar(candidate, &recent));
    }

    #[test]
    fn paraphrase_caught_by_bigrams() {
        // Shared phrase structure with enough word substitutions to dodge
        // the title tier on a long candidate.
        let a = "the city council approved the new transit budget after a long public hearing downtown";
        let b = "the city council approved the new transit budget after a heated public hearing yesterday";
        assert!(jaccard_bigrams(a, b) > 0.55);
    }

    #[test]
    fn empty_inputs_are_not_similar() {
        let detector = SimilarityDetector::new(SimilarityConfig::default());
        assert_eq!(jaccard_words("", ""), 0.0);
        assert_eq!(jaccard_bigrams("one", "one"), 0.0); // no pairs, empty union
        assert!(!detector.is_too_similar("", &[]));
    }

    #[test]
    fn whitespace_free_candidate_compared_whole() {
        assert_eq!(approximate_title("single_token_without_spaces_goes_past_fifty_characters_easily"),
            "single_token_without_spaces_goes_past_fifty_characters_easily");
        let long = "many words here ".repeat(10);
        assert_eq!(approximate_title(&long).chars().count(), 50);
    }

    #[test]
    fn thresholds_are_tunable() {
        let strict = SimilarityDetector::new(SimilarityConfig {
            title_threshold: 0.0,
            ..Default::default()
        });
        let recent = vec![item(1, "shared word appears", "body text")];
        // One shared token is enough once the threshold drops to zero.
        assert!(strict.is_too_similar("shared something entirely different", &recent));
    }
}
