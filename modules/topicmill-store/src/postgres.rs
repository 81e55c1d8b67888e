// Postgres persistence behind the ContentStore/PersonaPool traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use topicmill_common::{ContentItem, NewContentItem, NewReply, Persona};

use crate::error::Result;
use crate::traits::{ContentStore, PersonaPool};

pub struct PgContentStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    persona_id: String,
    category: String,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for ContentItem {
    fn from(row: ItemRow) -> Self {
        ContentItem {
            id: row.id,
            persona_id: row.persona_id,
            category: row.category,
            title: row.title,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn exists_by_fingerprint(&self, fingerprint: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM content_items WHERE fingerprint = $1)",
        )
        .bind(fingerprint)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_item(&self, item: &NewContentItem) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO content_items
                (persona_id, author_name, category, title, body, script, fingerprint, source_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&item.persona_id)
        .bind(&item.author_name)
        .bind(&item.category)
        .bind(&item.title)
        .bind(&item.body)
        .bind(&item.script)
        .bind(&item.fingerprint)
        .bind(&item.source_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO production_queue (item_id, status) VALUES ($1, 0)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn recent_items(&self, limit: u32) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, persona_id, category, title, body, created_at
            FROM content_items
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_reply(&self, reply: &NewReply) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO replies (item_id, persona_id, author_name, body, ordinal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(reply.item_id)
        .bind(&reply.persona_id)
        .bind(&reply.author_name)
        .bind(&reply.body)
        .bind(reply.position as i32)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn mark_production_completed(
        &self,
        item_id: i64,
        video_path: Option<&str>,
        thumbnail_path: Option<&str>,
    ) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE production_queue
            SET status = 1, video_path = $1, thumbnail_path = $2, completed_at = now()
            WHERE item_id = $3 AND status = 0
            "#,
        )
        .bind(video_path)
        .bind(thumbnail_path)
        .bind(item_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            warn!(item_id, "No pending production row to mark completed");
        }
        Ok(())
    }

    async fn mark_production_failed(&self, item_id: i64, error: &str) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE production_queue
            SET status = 9, error_msg = $1, completed_at = now()
            WHERE item_id = $2 AND status = 0
            "#,
        )
        .bind(error)
        .bind(item_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            warn!(item_id, "No pending production row to mark failed");
        }
        Ok(())
    }
}

pub struct PgPersonaPool {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct PersonaRow {
    id: String,
    name: String,
    role: String,
    voice_prompt: String,
    avatar_url: Option<String>,
}

impl From<PersonaRow> for Persona {
    fn from(row: PersonaRow) -> Self {
        Persona {
            id: row.id,
            name: row.name,
            role: row.role,
            voice_prompt: row.voice_prompt,
            avatar_url: row.avatar_url,
        }
    }
}

impl PgPersonaPool {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonaPool for PgPersonaPool {
    async fn list_all(&self) -> Result<Vec<Persona>> {
        let rows = sqlx::query_as::<_, PersonaRow>(
            "SELECT id, name, role, voice_prompt, avatar_url FROM personas",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Persona>> {
        let row = sqlx::query_as::<_, PersonaRow>(
            "SELECT id, name, role, voice_prompt, avatar_url FROM personas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

// Note: `create_item` maps a unique-violation on the fingerprint column to
// StoreError::DuplicateFingerprint via the From<sqlx::Error> impl. The
// application-level exists_by_fingerprint pre-check is racy by design; this
// constraint is what actually holds the invariant.
