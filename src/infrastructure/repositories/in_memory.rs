use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{
        DeliveryStatus, MessageRecord, ProviderStatusUpdate, Template, TemplateCategory,
        TemplateStatus,
    },
    repositories::{MessageRepository, TemplateRepository},
};

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<Uuid, MessageRecord>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(
        &self,
        recipient: String,
        body: String,
        metadata: serde_json::Value,
    ) -> anyhow::Result<MessageRecord> {
        let now = Utc::now();
        let record = MessageRecord {
            id: Uuid::new_v4(),
            provider_id: None,
            recipient,
            body,
            status: DeliveryStatus::Queued,
            error_code: None,
            error_message: None,
            metadata,
            created_at: now,
            sent_at: None,
            updated_at: now,
        };
        let mut messages = self.messages.write().await;
        messages.insert(record.id, record.clone());
        Ok(record)
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        provider_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        // provider_id is set at most once per record
        if let Some(record) = messages.get_mut(&id) {
            if record.provider_id.is_none() {
                record.provider_id = Some(provider_id.to_string());
                record.status = DeliveryStatus::Sent;
                record.sent_at = Some(sent_at);
                record.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error_code: &str,
        error_message: &str,
    ) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        if let Some(record) = messages.get_mut(&id) {
            record.status = DeliveryStatus::Failed;
            record.error_code = Some(error_code.to_string());
            record.error_message = Some(error_message.to_string());
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn apply_provider_status(&self, update: &ProviderStatusUpdate) -> anyhow::Result<bool> {
        let mut messages = self.messages.write().await;
        let record = messages
            .values_mut()
            .find(|r| r.provider_id.as_deref() == Some(update.provider_id.as_str()));
        match record {
            Some(record) => {
                record.status = update.status;
                record.error_code = update.error_code.clone();
                record.error_message = update.error_message.clone();
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MessageRecord>> {
        let messages = self.messages.read().await;
        Ok(messages.get(&id).cloned())
    }

    async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> anyhow::Result<Option<MessageRecord>> {
        let messages = self.messages.read().await;
        Ok(messages
            .values()
            .find(|r| r.provider_id.as_deref() == Some(provider_id))
            .cloned())
    }

    async fn list(
        &self,
        recipient: Option<String>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<MessageRecord>, bool)> {
        let limit = limit.unwrap_or(50).min(200) as usize;
        let offset = offset.unwrap_or(0) as usize;

        let messages = self.messages.read().await;
        let mut entries: Vec<MessageRecord> = messages
            .values()
            .filter(|r| recipient.as_deref().is_none_or(|to| r.recipient == to))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page: Vec<MessageRecord> = entries.into_iter().skip(offset).take(limit + 1).collect();
        let has_more = page.len() > limit;
        Ok((page.into_iter().take(limit).collect(), has_more))
    }
}

#[derive(Default)]
pub struct InMemoryTemplateRepository {
    templates: Arc<RwLock<HashMap<Uuid, Template>>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn insert(
        &self,
        name: String,
        content_sid: Option<String>,
        body: String,
        variables: serde_json::Value,
    ) -> anyhow::Result<Template> {
        let mut templates = self.templates.write().await;
        if templates.values().any(|t| t.name == name) {
            anyhow::bail!("template name already exists: {name}");
        }
        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4(),
            name,
            content_sid,
            body,
            variables,
            category: None,
            status: TemplateStatus::Draft,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Template>> {
        let templates = self.templates.read().await;
        Ok(templates.get(&id).cloned())
    }

    async fn mark_submitted(&self, id: Uuid, category: TemplateCategory) -> anyhow::Result<()> {
        let mut templates = self.templates.write().await;
        if let Some(template) = templates.get_mut(&id) {
            template.status = TemplateStatus::Pending;
            template.category = Some(category);
            template.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_approval(
        &self,
        id: Uuid,
        status: TemplateStatus,
        rejection_reason: Option<String>,
    ) -> anyhow::Result<()> {
        let mut templates = self.templates.write().await;
        if let Some(template) = templates.get_mut(&id) {
            template.status = status;
            template.rejection_reason = rejection_reason;
            template.updated_at = Utc::now();
        }
        Ok(())
    }
}
