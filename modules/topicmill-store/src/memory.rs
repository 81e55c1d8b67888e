// In-memory stateful doubles for the store traits.
//
// MemoryContentStore mirrors the Postgres behavior that matters to callers:
// fingerprint uniqueness on insert, newest-first recent window, and the
// pending/completed/failed production-queue lifecycle. No network, no
// database, no Docker — deterministic tests in milliseconds.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use topicmill_common::{ContentItem, NewContentItem, NewReply, Persona};

use crate::error::{Result, StoreError};
use crate::traits::{ContentStore, PersonaPool};

/// Outcome recorded for a production-queue row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductionMark {
    Completed {
        video_path: Option<String>,
        thumbnail_path: Option<String>,
    },
    Failed(String),
}

#[derive(Default)]
struct State {
    next_id: i64,
    fingerprints: HashSet<String>,
    items: Vec<(ContentItem, NewContentItem)>,
    replies: Vec<NewReply>,
    marks: Vec<(i64, ProductionMark)>,
    fail_reply_writes: bool,
}

#[derive(Default)]
pub struct MemoryContentStore {
    state: Mutex<State>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register a fingerprint as already persisted.
    pub fn seed_fingerprint(&self, fingerprint: &str) {
        self.state
            .lock()
            .unwrap()
            .fingerprints
            .insert(fingerprint.to_string());
    }

    /// Seed a pre-existing item so it appears in the recent window.
    pub fn seed_item(&self, title: &str, body: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let item = ContentItem {
            id,
            persona_id: "seed".to_string(),
            category: "seed".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };
        let new_item = NewContentItem {
            persona_id: item.persona_id.clone(),
            author_name: "seed".to_string(),
            category: item.category.clone(),
            title: item.title.clone(),
            body: item.body.clone(),
            script: None,
            fingerprint: format!("seed-{id}"),
            source_url: String::new(),
        };
        state.items.push((item, new_item));
        id
    }

    /// Make every create_reply call fail, for failure-isolation tests.
    pub fn fail_reply_writes(&self) {
        self.state.lock().unwrap().fail_reply_writes = true;
    }

    pub fn items(&self) -> Vec<ContentItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .map(|(item, _)| item.clone())
            .collect()
    }

    /// Originals as handed to create_item, insertion order.
    pub fn created(&self) -> Vec<NewContentItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .map(|(_, new)| new.clone())
            .collect()
    }

    pub fn replies(&self) -> Vec<NewReply> {
        self.state.lock().unwrap().replies.clone()
    }

    pub fn marks(&self) -> Vec<(i64, ProductionMark)> {
        self.state.lock().unwrap().marks.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .fingerprints
            .contains(fingerprint))
    }

    async fn create_item(&self, item: &NewContentItem) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if !state.fingerprints.insert(item.fingerprint.clone()) {
            return Err(StoreError::DuplicateFingerprint);
        }
        state.next_id += 1;
        let id = state.next_id;
        let stored = ContentItem {
            id,
            persona_id: item.persona_id.clone(),
            category: item.category.clone(),
            title: item.title.clone(),
            body: item.body.clone(),
            created_at: Utc::now(),
        };
        state.items.push((stored, item.clone()));
        Ok(id)
    }

    async fn recent_items(&self, limit: u32) -> Result<Vec<ContentItem>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .items
            .iter()
            .rev()
            .take(limit as usize)
            .map(|(item, _)| item.clone())
            .collect())
    }

    async fn create_reply(&self, reply: &NewReply) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reply_writes {
            return Err(StoreError::Database("reply writes disabled".to_string()));
        }
        state.replies.push(reply.clone());
        Ok(state.replies.len() as i64)
    }

    async fn mark_production_completed(
        &self,
        item_id: i64,
        video_path: Option<&str>,
        thumbnail_path: Option<&str>,
    ) -> Result<()> {
        self.state.lock().unwrap().marks.push((
            item_id,
            ProductionMark::Completed {
                video_path: video_path.map(String::from),
                thumbnail_path: thumbnail_path.map(String::from),
            },
        ));
        Ok(())
    }

    async fn mark_production_failed(&self, item_id: i64, error: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .marks
            .push((item_id, ProductionMark::Failed(error.to_string())));
        Ok(())
    }
}

/// Fixed persona pool.
pub struct MemoryPersonaPool {
    personas: Vec<Persona>,
}

impl MemoryPersonaPool {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }
}

#[async_trait]
impl PersonaPool for MemoryPersonaPool {
    async fn list_all(&self) -> Result<Vec<Persona>> {
        Ok(self.personas.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Persona>> {
        Ok(self.personas.iter().find(|p| p.id == id).cloned())
    }
}
