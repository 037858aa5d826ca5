use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::domain::{
    models::{
        DeliveryStatus, MessageRecord, ProviderStatusUpdate, Template, TemplateCategory,
        TemplateStatus,
    },
    repositories::{MessageRepository, TemplateRepository},
};

pub type PgPool = Pool<Postgres>;

#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(
        &self,
        recipient: String,
        body: String,
        metadata: serde_json::Value,
    ) -> anyhow::Result<MessageRecord> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO messages (
                id, recipient, body, status, metadata, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&recipient)
        .bind(&body)
        .bind(DeliveryStatus::Queued.as_str())
        .bind(&metadata)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        MessageRecord::try_from(row)
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        provider_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        // The provider_id guard keeps the assignment one-shot even if the
        // same job instance is replayed.
        sqlx::query(
            r#"
            UPDATE messages
            SET provider_id = $2,
                status = 'sent',
                sent_at = $3,
                updated_at = $4
            WHERE id = $1
              AND provider_id IS NULL
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .bind(sent_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error_code: &str,
        error_message: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET status = 'failed',
                error_code = $2,
                error_message = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_code)
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn apply_provider_status(&self, update: &ProviderStatusUpdate) -> anyhow::Result<bool> {
        // One conditional row update keyed by provider_id; concurrent
        // callbacks for the same id serialize on the row.
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET status = $2,
                error_code = $3,
                error_message = $4,
                updated_at = $5
            WHERE provider_id = $1
            "#,
        )
        .bind(&update.provider_id)
        .bind(update.status.as_str())
        .bind(&update.error_code)
        .bind(&update.error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MessageRecord>> {
        let row = sqlx::query(r#"SELECT * FROM messages WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MessageRecord::try_from).transpose()
    }

    async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> anyhow::Result<Option<MessageRecord>> {
        let row = sqlx::query(r#"SELECT * FROM messages WHERE provider_id = $1"#)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MessageRecord::try_from).transpose()
    }

    async fn list(
        &self,
        recipient: Option<String>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<MessageRecord>, bool)> {
        let limit = limit.unwrap_or(50).min(200) as i32;
        let offset = offset.unwrap_or(0) as i32;

        // Fetch one extra row to learn whether there is a next page.
        let rows = sqlx::query(
            r#"
            SELECT *
            FROM messages
            WHERE ($1::text IS NULL OR recipient = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&recipient)
        .bind(limit + 1)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let has_more = rows.len() > limit as usize;
        let records: Vec<MessageRecord> = rows
            .into_iter()
            .take(limit as usize)
            .map(MessageRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, has_more))
    }
}

#[derive(Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn insert(
        &self,
        name: String,
        content_sid: Option<String>,
        body: String,
        variables: serde_json::Value,
    ) -> anyhow::Result<Template> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO templates (
                id, name, content_sid, body, variables, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&content_sid)
        .bind(&body)
        .bind(&variables)
        .bind(TemplateStatus::Draft.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Template::try_from(row)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Template>> {
        let row = sqlx::query(r#"SELECT * FROM templates WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Template::try_from).transpose()
    }

    async fn mark_submitted(&self, id: Uuid, category: TemplateCategory) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE templates
            SET status = 'pending',
                category = $2,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(category.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_approval(
        &self,
        id: Uuid,
        status: TemplateStatus,
        rejection_reason: Option<String>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE templates
            SET status = $2,
                rejection_reason = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(&rejection_reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl TryFrom<sqlx::postgres::PgRow> for MessageRecord {
    type Error = anyhow::Error;

    fn try_from(row: sqlx::postgres::PgRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("status")?;
        let status = DeliveryStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown delivery status {status_str}"))?;

        Ok(MessageRecord {
            id: row.try_get("id")?,
            provider_id: row.try_get("provider_id")?,
            recipient: row.try_get("recipient")?,
            body: row.try_get("body")?,
            status,
            error_code: row.try_get("error_code")?,
            error_message: row.try_get("error_message")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            sent_at: row.try_get("sent_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<sqlx::postgres::PgRow> for Template {
    type Error = anyhow::Error;

    fn try_from(row: sqlx::postgres::PgRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("status")?;
        let status = TemplateStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown template status {status_str}"))?;
        let category = row
            .try_get::<Option<String>, _>("category")?
            .map(|value| {
                TemplateCategory::from_str(&value)
                    .ok_or_else(|| anyhow::anyhow!("unknown template category {value}"))
            })
            .transpose()?;

        Ok(Template {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            content_sid: row.try_get("content_sid")?,
            body: row.try_get("body")?,
            variables: row.try_get("variables")?,
            category,
            status,
            rejection_reason: row.try_get("rejection_reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
