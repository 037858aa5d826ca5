use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{
    MessageRecord, ProviderStatusUpdate, Template, TemplateCategory, TemplateStatus,
};

/// Durable per-attempt message records. Updates are conditional per-row
/// operations in the store; callers never read-modify-write.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(
        &self,
        recipient: String,
        body: String,
        metadata: serde_json::Value,
    ) -> anyhow::Result<MessageRecord>;

    /// Marks the record sent and assigns the provider id. The provider id is
    /// set at most once; a second call for the same record is a no-op.
    async fn mark_sent(
        &self,
        id: Uuid,
        provider_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn mark_failed(
        &self,
        id: Uuid,
        error_code: &str,
        error_message: &str,
    ) -> anyhow::Result<()>;

    /// Applies a provider callback by provider id as one atomic row update.
    /// Returns false when no record carries that provider id.
    async fn apply_provider_status(&self, update: &ProviderStatusUpdate) -> anyhow::Result<bool>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MessageRecord>>;

    async fn find_by_provider_id(&self, provider_id: &str)
        -> anyhow::Result<Option<MessageRecord>>;

    async fn list(
        &self,
        recipient: Option<String>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<MessageRecord>, bool)>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn insert(
        &self,
        name: String,
        content_sid: Option<String>,
        body: String,
        variables: serde_json::Value,
    ) -> anyhow::Result<Template>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Template>>;

    async fn mark_submitted(&self, id: Uuid, category: TemplateCategory) -> anyhow::Result<()>;

    async fn set_approval(
        &self,
        id: Uuid,
        status: TemplateStatus,
        rejection_reason: Option<String>,
    ) -> anyhow::Result<()>;
}
