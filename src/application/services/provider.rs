use async_trait::async_trait;

use crate::domain::{errors::SendError, models::TemplateCategory};

/// Adapter over the external delivery API. A successful send yields the
/// provider-assigned message id used later to correlate status callbacks.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn send(&self, recipient: &str, body: &str) -> Result<String, SendError>;
}

#[derive(Debug, Clone)]
pub struct ContentDraft {
    pub sid: String,
}

#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub channel: String,
    pub status: String,
    pub rejection_reason: Option<String>,
}

/// Provider content API: template drafts and their channel approval flow.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn create_draft(
        &self,
        name: &str,
        body: &str,
        variables: &serde_json::Value,
    ) -> anyhow::Result<ContentDraft>;

    async fn submit_for_approval(
        &self,
        content_sid: &str,
        name: &str,
        category: TemplateCategory,
    ) -> anyhow::Result<()>;

    async fn approval_requests(&self, content_sid: &str) -> anyhow::Result<Vec<ApprovalRequest>>;
}
