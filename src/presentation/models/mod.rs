use poem_openapi::Enum;

use crate::domain::models::{DeliveryStatus, TemplateCategory, TemplateStatus};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeliveryStatusDto {
    #[oai(rename = "queued")]
    Queued,
    #[oai(rename = "sent")]
    Sent,
    #[oai(rename = "delivered")]
    Delivered,
    #[oai(rename = "read")]
    Read,
    #[oai(rename = "failed")]
    Failed,
    #[oai(rename = "undelivered")]
    Undelivered,
}

impl From<DeliveryStatus> for DeliveryStatusDto {
    fn from(value: DeliveryStatus) -> Self {
        match value {
            DeliveryStatus::Queued => DeliveryStatusDto::Queued,
            DeliveryStatus::Sent => DeliveryStatusDto::Sent,
            DeliveryStatus::Delivered => DeliveryStatusDto::Delivered,
            DeliveryStatus::Read => DeliveryStatusDto::Read,
            DeliveryStatus::Failed => DeliveryStatusDto::Failed,
            DeliveryStatus::Undelivered => DeliveryStatusDto::Undelivered,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum TemplateStatusDto {
    #[oai(rename = "draft")]
    Draft,
    #[oai(rename = "pending")]
    Pending,
    #[oai(rename = "approved")]
    Approved,
    #[oai(rename = "rejected")]
    Rejected,
}

impl From<TemplateStatus> for TemplateStatusDto {
    fn from(value: TemplateStatus) -> Self {
        match value {
            TemplateStatus::Draft => TemplateStatusDto::Draft,
            TemplateStatus::Pending => TemplateStatusDto::Pending,
            TemplateStatus::Approved => TemplateStatusDto::Approved,
            TemplateStatus::Rejected => TemplateStatusDto::Rejected,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum TemplateCategoryDto {
    #[oai(rename = "UTILITY")]
    Utility,
    #[oai(rename = "MARKETING")]
    Marketing,
    #[oai(rename = "AUTHENTICATION")]
    Authentication,
}

impl From<TemplateCategoryDto> for TemplateCategory {
    fn from(value: TemplateCategoryDto) -> Self {
        match value {
            TemplateCategoryDto::Utility => TemplateCategory::Utility,
            TemplateCategoryDto::Marketing => TemplateCategory::Marketing,
            TemplateCategoryDto::Authentication => TemplateCategory::Authentication,
        }
    }
}

impl From<TemplateCategory> for TemplateCategoryDto {
    fn from(value: TemplateCategory) -> Self {
        match value {
            TemplateCategory::Utility => TemplateCategoryDto::Utility,
            TemplateCategory::Marketing => TemplateCategoryDto::Marketing,
            TemplateCategory::Authentication => TemplateCategoryDto::Authentication,
        }
    }
}
