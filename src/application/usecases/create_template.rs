use std::sync::Arc;

use crate::{
    application::services::provider::ContentApi,
    domain::{models::Template, repositories::TemplateRepository},
};

pub struct CreateTemplateRequest {
    pub name: String,
    pub body: String,
    pub variables: serde_json::Value,
}

/// Creates a draft on the provider's content API first, then persists the
/// template with the provider-assigned content sid.
pub struct CreateTemplateUseCase {
    templates: Arc<dyn TemplateRepository>,
    content: Arc<dyn ContentApi>,
}

impl CreateTemplateUseCase {
    pub fn new(templates: Arc<dyn TemplateRepository>, content: Arc<dyn ContentApi>) -> Self {
        Self { templates, content }
    }

    pub async fn execute(&self, request: CreateTemplateRequest) -> anyhow::Result<Template> {
        let draft = self
            .content
            .create_draft(&request.name, &request.body, &request.variables)
            .await?;

        self.templates
            .insert(
                request.name,
                Some(draft.sid),
                request.body,
                request.variables,
            )
            .await
    }
}
