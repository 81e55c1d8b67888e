// Test mocks for the pipeline's trait seams.
//
// Three mocks matching the three engine-side boundaries:
// - MockPageFetcher (PageFetcher) — HashMap-based URL → body
// - MockTextModel (TextModel) — substring-matched scripted responses
// - MockProductionService (ProductionService) — recording, scriptable failure
//
// The store doubles (MemoryContentStore, MemoryPersonaPool) live in
// topicmill-store::memory. Plus helpers for fixture feeds and personas.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use factory_client::{CurationPicks, ProducedArtifacts};
use topicmill_common::{ContentKind, Persona};

use crate::harvest::fetch::PageFetcher;
use crate::traits::{ProductionService, TextModel};

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// HashMap-based page fetcher. Returns `Err` for unregistered URLs.
#[derive(Default)]
pub struct MockPageFetcher {
    bodies: HashMap<String, Vec<u8>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_url(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        match self.bodies.get(url) {
            Some(body) => Ok(body.clone()),
            None => bail!("MockPageFetcher: no body registered for {url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockTextModel
// ---------------------------------------------------------------------------

enum ModelRule {
    Reply(String),
    Fail,
}

/// Scripted text model. Rules are matched against the task prompt by
/// substring, first hit wins; unmatched tasks get the default behavior.
pub struct MockTextModel {
    rules: Vec<(String, ModelRule)>,
    default: ModelRule,
    calls: Mutex<Vec<String>>,
}

impl MockTextModel {
    /// Every call answers with `reply`.
    pub fn new(reply: &str) -> Self {
        Self {
            rules: Vec::new(),
            default: ModelRule::Reply(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            default: ModelRule::Fail,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Tasks containing `needle` answer with `reply`.
    pub fn on_task_containing(mut self, needle: &str, reply: &str) -> Self {
        self.rules
            .push((needle.to_string(), ModelRule::Reply(reply.to_string())));
        self
    }

    /// Tasks containing `needle` fail.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), ModelRule::Fail));
        self
    }

    /// How many recorded task prompts contain `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|task| task.contains(needle))
            .count()
    }
}

#[async_trait]
impl TextModel for MockTextModel {
    async fn complete(&self, _context: &str, _persona_prompt: &str, task: &str) -> Result<String> {
        self.calls.lock().unwrap().push(task.to_string());

        let rule = self
            .rules
            .iter()
            .find(|(needle, _)| task.contains(needle))
            .map(|(_, rule)| rule)
            .unwrap_or(&self.default);

        match rule {
            ModelRule::Reply(text) => Ok(text.clone()),
            ModelRule::Fail => bail!("MockTextModel: scripted failure"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockProductionService
// ---------------------------------------------------------------------------

/// Records production requests; optionally fails them. Curation picks are
/// whatever the test scripts.
#[derive(Default)]
pub struct MockProductionService {
    requests: Mutex<Vec<(i64, ContentKind)>>,
    fail_production: bool,
    fail_curation: bool,
    picks: CurationPicks,
}

impl MockProductionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_production(mut self) -> Self {
        self.fail_production = true;
        self
    }

    pub fn failing_curation(mut self) -> Self {
        self.fail_curation = true;
        self
    }

    pub fn with_picks(mut self, picks: CurationPicks) -> Self {
        self.picks = picks;
        self
    }

    pub fn requests(&self) -> Vec<(i64, ContentKind)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductionService for MockProductionService {
    async fn request_production(
        &self,
        item_id: i64,
        kind: ContentKind,
    ) -> Result<ProducedArtifacts> {
        self.requests.lock().unwrap().push((item_id, kind));
        if self.fail_production {
            bail!("MockProductionService: scripted production failure");
        }
        Ok(ProducedArtifacts {
            video_path: Some(format!("/out/{item_id}.mp4")),
            thumbnail_path: Some(format!("/out/{item_id}.jpg")),
        })
    }

    async fn request_curation(
        &self,
        _controversy_count: u32,
        _explainer_count: u32,
        _min_quality_score: f64,
    ) -> Result<CurationPicks> {
        if self.fail_curation {
            bail!("MockProductionService: scripted curation failure");
        }
        Ok(self.picks.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Build a minimal RSS body from (title, link) pairs.
pub fn feed_body(entries: &[(String, String)]) -> String {
    let items: String = entries
        .iter()
        .map(|(title, link)| {
            format!("<item><title>{title}</title><link>{link}</link></item>")
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>fixture</title>{items}</channel></rss>"
    )
}

pub fn persona(id: &str, name: &str) -> Persona {
    Persona {
        id: id.to_string(),
        name: name.to_string(),
        role: "commenter".to_string(),
        voice_prompt: format!("Write as {name}, casual and direct."),
        avatar_url: None,
    }
}
