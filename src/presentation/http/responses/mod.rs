use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{DeliveryStatusDto, TemplateCategoryDto, TemplateStatusDto};

#[derive(Object)]
pub struct BulkSendResponseDto {
    pub queued_jobs: Vec<Uuid>,
}

#[derive(Object)]
pub struct MessageRecordDto {
    pub id: Uuid,
    pub provider_id: Option<String>,
    pub recipient: String,
    pub body: String,
    pub status: DeliveryStatusDto,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: String,
    pub sent_at: Option<String>,
    pub updated_at: String,
}

#[derive(Object)]
pub struct PaginatedMessagesDto {
    pub messages: Vec<MessageRecordDto>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

#[derive(Object)]
pub struct TemplateDto {
    pub id: Uuid,
    pub name: String,
    pub content_sid: Option<String>,
    pub body: String,
    pub variables: serde_json::Value,
    pub category: Option<TemplateCategoryDto>,
    pub status: TemplateStatusDto,
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Object)]
pub struct TemplateApprovalDto {
    pub template_id: Uuid,
    pub content_sid: Option<String>,
    pub status: TemplateStatusDto,
    pub rejection_reason: Option<String>,
}
