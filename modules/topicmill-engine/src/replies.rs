// Persona reactions: exactly five replies per committed item, one per fixed
// archetype, each from a distinct persona while the pool allows it. Each
// reply is persisted individually so a failure on one never loses the others.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use rand::seq::IndexedRandom;
use regex::Regex;
use tracing::{debug, info, warn};

use topicmill_common::{ContentItem, NewReply, Persona};
use topicmill_store::{ContentStore, PersonaPool};

use crate::traits::TextModel;

/// The five fixed reaction archetypes, in assignment order.
const ARCHETYPES: [(&str, &str); 5] = [
    (
        "analyst",
        "You are the cool-headed analyst.\n\
         - Leave emotion out; judge by data and logic\n\
         - Favor phrasings like \"statistically speaking\" or \"the structural cause is\"\n\
         - Name the core issue and always give a supporting reason\n\
         - At least 2 sentences. One-word filler reactions are banned",
    ),
    (
        "empathizer",
        "You are the warm empathizer.\n\
         - Put yourself in the shoes of the people involved\n\
         - Favor phrasings like \"anyone in that situation would\" or \"this one stays with you\"\n\
         - Bring in a personal experience or a similar case to widen the empathy\n\
         - At least 2 sentences. One-word filler reactions are banned",
    ),
    (
        "fact-checker",
        "You are the fact-checker.\n\
         - Verify and complete the factual claims in the post\n\
         - Favor phrasings like \"to be precise\" or \"worth knowing as well\"\n\
         - Add related facts or context the post left out\n\
         - At least 2 sentences. One-word filler reactions are banned",
    ),
    (
        "humorist",
        "You are the sharp-witted humorist.\n\
         - Sum the situation up with a pointed comparison or a clever one-liner\n\
         - Smart humor over cheap jokes; never punch down\n\
         - Land the joke, then add the observation behind it\n\
         - At least 2 sentences. Laughing-only replies are banned",
    ),
    (
        "realist-critic",
        "You are the realist critic.\n\
         - Pour cold water on rosy takes, on principle\n\
         - Favor phrasings like \"realistically\" or \"what everyone is overlooking\"\n\
         - Push back with logic, but include a constructive alternative\n\
         - At least 2 sentences. One-word filler reactions are banned",
    ),
];

/// Substitute body when generation fails outright.
const FALLBACK_REPLY: &str = "This topic deserves a closer look than a quick take allows. \
                              There is clearly more going on here than the headline suggests.";

/// Replies shorter than this (after cleanup and one repair) become the fallback.
const MIN_REPLY_CHARS: usize = 10;

/// First N chars of the item body included in the generation request.
const PREVIEW_CHARS: usize = 300;

/// Samples personas for one reply round, preferring identities not yet used.
/// Seeded with the item's author so authors never reply to themselves.
pub struct PersonaPicker<'a> {
    pool: &'a [Persona],
    used: HashSet<String>,
}

impl<'a> PersonaPicker<'a> {
    pub fn new(pool: &'a [Persona], author_id: &str) -> Self {
        let mut used = HashSet::new();
        used.insert(author_id.to_string());
        Self { pool, used }
    }

    /// Pick a persona, preferring one unused this round. Once the pool is
    /// exhausted, falls back to an unrestricted random pick.
    pub fn pick(&mut self) -> &'a Persona {
        let available: Vec<&'a Persona> = self
            .pool
            .iter()
            .filter(|p| !self.used.contains(&p.id))
            .collect();

        let chosen = match available.choose(&mut rand::rng()) {
            Some(p) => *p,
            None => self.pool.choose(&mut rand::rng()).expect("pool is non-empty"),
        };
        self.used.insert(chosen.id.clone());
        chosen
    }
}

pub struct ReplyOrchestrator {
    model: Arc<dyn TextModel>,
    personas: Arc<dyn PersonaPool>,
    store: Arc<dyn ContentStore>,
}

impl ReplyOrchestrator {
    pub fn new(
        model: Arc<dyn TextModel>,
        personas: Arc<dyn PersonaPool>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            model,
            personas,
            store,
        }
    }

    /// Generate and persist the five archetype reactions for a committed
    /// item. No-op for pools under two personas. Returns how many replies
    /// were persisted.
    pub async fn generate_replies(&self, item: &ContentItem) -> Result<u32> {
        let pool = self.personas.list_all().await?;
        if pool.len() < 2 {
            info!(item_id = item.id, "Persona pool too small, skipping replies");
            return Ok(0);
        }

        let preview = char_prefix(&item.body, PREVIEW_CHARS);
        let mut picker = PersonaPicker::new(&pool, &item.persona_id);
        let mut persisted = 0u32;

        for (index, (archetype, instruction)) in ARCHETYPES.iter().enumerate() {
            let replier = picker.pick();
            let task = build_task(replier, instruction, item, preview);

            let raw = match self.model.complete("", &replier.voice_prompt, &task).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(item_id = item.id, archetype, error = %e, "Reply generation failed");
                    String::new()
                }
            };

            let mut clean = clean_reply(&raw);

            if count_sentences(&clean) < 2 {
                debug!(item_id = item.id, archetype, "Reply under two sentences, repairing once");
                let repair = format!(
                    "Expand the following comment to at least 2 sentences. \
                     No filler; add a concrete opinion or detail: {clean}"
                );
                match self.model.complete("", "", &repair).await {
                    Ok(boosted_raw) => {
                        let boosted = clean_reply(&boosted_raw);
                        if boosted.chars().count() > clean.chars().count() {
                            clean = boosted;
                        }
                    }
                    Err(e) => {
                        warn!(item_id = item.id, archetype, error = %e, "Reply repair failed");
                    }
                }
            }

            if clean.chars().count() < MIN_REPLY_CHARS {
                clean = FALLBACK_REPLY.to_string();
            }

            let reply = NewReply {
                item_id: item.id,
                persona_id: replier.id.clone(),
                author_name: replier.name.clone(),
                body: clean,
                position: (index + 1) as u8,
            };

            match self.store.create_reply(&reply).await {
                Ok(_) => persisted += 1,
                Err(e) => {
                    warn!(item_id = item.id, archetype, error = %e, "Failed to persist reply")
                }
            }
        }

        info!(item_id = item.id, persisted, "Persona replies generated");
        Ok(persisted)
    }
}

fn build_task(replier: &Persona, instruction: &str, item: &ContentItem, preview: &str) -> String {
    format!(
        "You are {name} ({role}), commenting on an online community board.\n\n\
         [Role instruction]\n{instruction}\n\n\
         [Comment rules]\n\
         - Write at least 2 sentences\n\
         - No reactions made of interjections or filler alone\n\
         - Include your own angle or an extra piece of information\n\
         - Do not prefix the comment with \"Reply:\" or \"Comment:\"\n\
         - React to something specific in the post\n\n\
         [Post]\nTitle: {title}\nCategory: {category}\nPreview: {preview}\n\n\
         Output only the comment.",
        name = replier.name,
        role = replier.role,
        title = item.title,
        category = item.category,
    )
}

/// Strip `reply:`/`comment:` prefixes, markdown emphasis and wrapping
/// quotes; join the first three non-empty lines with spaces.
fn clean_reply(raw: &str) -> String {
    let prefix = Regex::new(r"(?i)^(reply|comment)\s*:?\s*").expect("valid regex");
    let mut parts: Vec<String> = Vec::new();

    for line in raw.lines() {
        let stripped = line.trim().replace(['#', '*'], "");
        let stripped = prefix.replace(&stripped, "");
        let stripped = stripped.trim_matches('"').trim();
        if stripped.chars().count() < 3 {
            continue;
        }
        parts.push(stripped.to_string());
        if parts.len() >= 3 {
            break;
        }
    }

    parts.join(" ").trim().to_string()
}

/// Count sentences: fragments over 5 chars between terminal punctuation,
/// floored at 1 for non-empty text.
fn count_sentences(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let count = text
        .split(['.', '?', '!'])
        .filter(|fragment| fragment.trim().chars().count() > 5)
        .count();
    count.max(1)
}

fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{persona, MockTextModel};
    use chrono::Utc;
    use topicmill_store::memory::{MemoryContentStore, MemoryPersonaPool};

    const GOOD_REPLY: &str =
        "That ruling changes more than people think. The precedent will outlive the case itself.";

    fn item(author: &str) -> ContentItem {
        ContentItem {
            id: 42,
            persona_id: author.to_string(),
            category: "society".to_string(),
            title: "Court ruling reshapes rental market".to_string(),
            body: "A long body describing the ruling in detail.".to_string(),
            created_at: Utc::now(),
        }
    }

    fn pool_of(n: usize) -> Vec<Persona> {
        (0..n).map(|i| persona(&format!("p{i}"), &format!("Persona {i}"))).collect()
    }

    async fn run_with_pool(n: usize) -> (u32, Vec<topicmill_common::NewReply>) {
        let store = Arc::new(MemoryContentStore::new());
        let orchestrator = ReplyOrchestrator::new(
            Arc::new(MockTextModel::new(GOOD_REPLY)),
            Arc::new(MemoryPersonaPool::new(pool_of(n))),
            store.clone(),
        );
        let persisted = orchestrator.generate_replies(&item("op")).await.unwrap();
        (persisted, store.replies())
    }

    #[tokio::test]
    async fn pool_of_one_is_a_noop() {
        let (persisted, replies) = run_with_pool(1).await;
        assert_eq!(persisted, 0);
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn pool_of_two_produces_five_replies_with_reuse() {
        let (persisted, replies) = run_with_pool(2).await;
        assert_eq!(persisted, 5);
        assert_eq!(replies.len(), 5);
        let distinct: HashSet<_> = replies.iter().map(|r| r.persona_id.clone()).collect();
        assert_eq!(distinct.len(), 2);
    }

    #[tokio::test]
    async fn pool_of_five_never_reuses_a_persona() {
        let (_, replies) = run_with_pool(5).await;
        let distinct: HashSet<_> = replies.iter().map(|r| r.persona_id.clone()).collect();
        assert_eq!(distinct.len(), 5);
    }

    #[tokio::test]
    async fn pool_of_ten_never_reuses_a_persona() {
        let (_, replies) = run_with_pool(10).await;
        let distinct: HashSet<_> = replies.iter().map(|r| r.persona_id.clone()).collect();
        assert_eq!(distinct.len(), 5);
    }

    #[tokio::test]
    async fn author_never_replies_to_own_item() {
        let store = Arc::new(MemoryContentStore::new());
        let orchestrator = ReplyOrchestrator::new(
            Arc::new(MockTextModel::new(GOOD_REPLY)),
            Arc::new(MemoryPersonaPool::new(pool_of(6))),
            store.clone(),
        );
        // The author is p0, a member of the pool.
        orchestrator.generate_replies(&item("p0")).await.unwrap();
        assert!(store.replies().iter().all(|r| r.persona_id != "p0"));
    }

    #[tokio::test]
    async fn positions_follow_archetype_order() {
        let (_, replies) = run_with_pool(6).await;
        let positions: Vec<u8> = replies.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn short_model_output_repaired_once_then_fallback() {
        // The model always answers with one stunted sentence; the repair
        // returns the same text (not strictly longer), so every reply falls
        // through to the fixed fallback.
        let model = Arc::new(MockTextModel::new("Bad."));
        let store = Arc::new(MemoryContentStore::new());
        let orchestrator = ReplyOrchestrator::new(
            model.clone(),
            Arc::new(MemoryPersonaPool::new(pool_of(5))),
            store.clone(),
        );
        orchestrator.generate_replies(&item("op")).await.unwrap();

        let repairs = model.calls_containing("Expand the following comment");
        assert_eq!(repairs, 5, "exactly one repair per archetype");
        for reply in store.replies() {
            assert_eq!(reply.body, FALLBACK_REPLY);
            assert!(reply.body.chars().count() >= MIN_REPLY_CHARS);
        }
    }

    #[tokio::test]
    async fn repair_accepted_only_when_strictly_longer() {
        let repaired =
            "A first full sentence with real substance. And a second one that lands properly.";
        let model = Arc::new(
            MockTextModel::new("One stunted sentence here.")
                .on_task_containing("Expand the following comment", repaired),
        );
        let store = Arc::new(MemoryContentStore::new());
        let orchestrator = ReplyOrchestrator::new(
            model,
            Arc::new(MemoryPersonaPool::new(pool_of(5))),
            store.clone(),
        );
        orchestrator.generate_replies(&item("op")).await.unwrap();
        assert!(store.replies().iter().all(|r| r.body == repaired));
    }

    #[tokio::test]
    async fn model_failure_yields_fallback_not_error() {
        let store = Arc::new(MemoryContentStore::new());
        let orchestrator = ReplyOrchestrator::new(
            Arc::new(MockTextModel::failing()),
            Arc::new(MemoryPersonaPool::new(pool_of(5))),
            store.clone(),
        );
        let persisted = orchestrator.generate_replies(&item("op")).await.unwrap();
        assert_eq!(persisted, 5);
        assert!(store.replies().iter().all(|r| r.body == FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn reply_persist_failure_does_not_abort_round() {
        let store = Arc::new(MemoryContentStore::new());
        store.fail_reply_writes();
        let model = Arc::new(MockTextModel::new(GOOD_REPLY));
        let orchestrator = ReplyOrchestrator::new(
            model.clone(),
            Arc::new(MemoryPersonaPool::new(pool_of(5))),
            store.clone(),
        );
        let persisted = orchestrator.generate_replies(&item("op")).await.unwrap();
        assert_eq!(persisted, 0);
        // All five archetypes were still attempted.
        assert_eq!(model.calls_containing("[Role instruction]"), 5);
    }

    #[test]
    fn clean_reply_strips_prefixes_and_markdown() {
        assert_eq!(
            clean_reply("Reply: **Bold** take on this."),
            "Bold take on this."
        );
        assert_eq!(
            clean_reply("comment:  \"quoted opinion here\""),
            "quoted opinion here"
        );
    }

    #[test]
    fn clean_reply_joins_first_three_lines() {
        let raw = "First line here.\n\nSecond line here.\nThird line here.\nFourth line ignored.";
        assert_eq!(
            clean_reply(raw),
            "First line here. Second line here. Third line here."
        );
    }

    #[test]
    fn clean_reply_drops_tiny_fragments() {
        assert_eq!(clean_reply("ok\nA real sentence follows here."), "A real sentence follows here.");
    }

    #[test]
    fn sentence_counting() {
        assert_eq!(count_sentences(""), 0);
        assert_eq!(count_sentences("Short words only."), 1);
        assert_eq!(
            count_sentences("A first real sentence. And then a second one!"),
            2
        );
        // Fragments of five chars or fewer don't count, but the floor is 1.
        assert_eq!(count_sentences("Hm. Ok. No."), 1);
    }
}
