use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};

use crate::{
    application::usecases::create_template::CreateTemplateRequest,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_template,
        requests::{CreateTemplateRequestDto, SubmitTemplateRequestDto},
        responses::{TemplateApprovalDto, TemplateDto},
    },
};

#[derive(Clone)]
pub struct TemplatesEndpoints {
    state: Arc<ApiState>,
}

impl TemplatesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl TemplatesEndpoints {
    #[oai(
        path = "/templates",
        method = "post",
        tag = EndpointsTags::Templates,
    )]
    pub async fn create_template(
        &self,
        request: Json<CreateTemplateRequestDto>,
    ) -> PoemResult<Json<TemplateDto>> {
        let template = self
            .state
            .create_template_usecase
            .execute(CreateTemplateRequest {
                name: request.0.name,
                body: request.0.body,
                variables: request.0.variables.unwrap_or(serde_json::Value::Null),
            })
            .await
            .map_err(internal_error)?;

        Ok(Json(map_template(&template)))
    }

    #[oai(
        path = "/templates/:template_id/submit",
        method = "post",
        tag = EndpointsTags::Templates,
    )]
    pub async fn submit_template(
        &self,
        template_id: Path<uuid::Uuid>,
        request: Json<SubmitTemplateRequestDto>,
    ) -> PoemResult<()> {
        self.state
            .submit_template_usecase
            .execute(template_id.0, request.category.into())
            .await
            .map_err(|e| {
                if e.to_string().contains("not found") {
                    poem::Error::from_string(
                        "template not found",
                        poem::http::StatusCode::NOT_FOUND,
                    )
                } else if e.to_string().contains("already submitted")
                    || e.to_string().contains("no content sid")
                {
                    poem::Error::from_string(e.to_string(), poem::http::StatusCode::BAD_REQUEST)
                } else {
                    internal_error(e)
                }
            })?;

        Ok(())
    }

    #[oai(
        path = "/templates/:template_id/approval-status",
        method = "get",
        tag = EndpointsTags::Templates,
    )]
    pub async fn approval_status(
        &self,
        template_id: Path<uuid::Uuid>,
    ) -> PoemResult<Json<TemplateApprovalDto>> {
        let template = self
            .state
            .sync_template_approval_usecase
            .execute(template_id.0)
            .await
            .map_err(|e| {
                if e.to_string().contains("not found") {
                    poem::Error::from_string(
                        "template not found",
                        poem::http::StatusCode::NOT_FOUND,
                    )
                } else if e.to_string().contains("no content sid") {
                    poem::Error::from_string(e.to_string(), poem::http::StatusCode::BAD_REQUEST)
                } else {
                    internal_error(e)
                }
            })?;

        Ok(Json(TemplateApprovalDto {
            template_id: template.id,
            content_sid: template.content_sid.clone(),
            status: template.status.into(),
            rejection_reason: template.rejection_reason.clone(),
        }))
    }
}

fn internal_error(err: anyhow::Error) -> poem::Error {
    poem::Error::from_string(
        err.to_string(),
        poem::http::StatusCode::INTERNAL_SERVER_ERROR,
    )
}
