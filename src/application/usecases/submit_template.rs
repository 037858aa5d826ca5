use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::services::provider::ContentApi,
    domain::{
        models::{TemplateCategory, TemplateStatus},
        repositories::TemplateRepository,
    },
};

pub struct SubmitTemplateUseCase {
    templates: Arc<dyn TemplateRepository>,
    content: Arc<dyn ContentApi>,
}

impl SubmitTemplateUseCase {
    pub fn new(templates: Arc<dyn TemplateRepository>, content: Arc<dyn ContentApi>) -> Self {
        Self { templates, content }
    }

    pub async fn execute(
        &self,
        template_id: Uuid,
        category: TemplateCategory,
    ) -> anyhow::Result<()> {
        let template = self
            .templates
            .get(template_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("template not found"))?;

        if template.status != TemplateStatus::Draft {
            anyhow::bail!("template already submitted or finalized");
        }

        let content_sid = template
            .content_sid
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("template has no content sid"))?;

        self.content
            .submit_for_approval(content_sid, &template.name, category)
            .await?;

        self.templates.mark_submitted(template.id, category).await
    }
}
