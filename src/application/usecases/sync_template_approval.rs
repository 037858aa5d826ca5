use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::services::provider::ContentApi,
    domain::{
        models::{Template, TemplateStatus},
        repositories::TemplateRepository,
    },
};

/// Pulls the provider's approval requests for a template and syncs the local
/// status, capturing the rejection reason when the channel said no.
pub struct SyncTemplateApprovalUseCase {
    templates: Arc<dyn TemplateRepository>,
    content: Arc<dyn ContentApi>,
}

impl SyncTemplateApprovalUseCase {
    pub fn new(templates: Arc<dyn TemplateRepository>, content: Arc<dyn ContentApi>) -> Self {
        Self { templates, content }
    }

    pub async fn execute(&self, template_id: Uuid) -> anyhow::Result<Template> {
        let template = self
            .templates
            .get(template_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("template not found"))?;

        let content_sid = template
            .content_sid
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("template has no content sid"))?;

        let approvals = self.content.approval_requests(content_sid).await?;
        let whatsapp = approvals.into_iter().find(|a| a.channel == "whatsapp");

        if let Some(approval) = whatsapp {
            let (status, reason) = match approval.status.as_str() {
                "approved" => (TemplateStatus::Approved, None),
                "rejected" => (TemplateStatus::Rejected, approval.rejection_reason),
                _ => (TemplateStatus::Pending, None),
            };
            self.templates
                .set_approval(template.id, status, reason)
                .await?;
        }

        self.templates
            .get(template_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("template not found"))
    }
}
