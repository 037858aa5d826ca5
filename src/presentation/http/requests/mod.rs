use poem_openapi::Object;

use crate::presentation::models::TemplateCategoryDto;

#[derive(Object, Debug)]
pub struct BulkSendItemDto {
    #[oai(validator(min_length = 1))]
    pub to: String,
    #[oai(validator(min_length = 1, max_length = 4096))]
    pub body: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Object, Debug)]
pub struct BulkSendRequestDto {
    pub messages: Vec<BulkSendItemDto>,
}

#[derive(Object, Debug)]
pub struct CreateTemplateRequestDto {
    #[oai(validator(min_length = 1, max_length = 100))]
    pub name: String,
    #[oai(validator(min_length = 1))]
    pub body: String,
    pub variables: Option<serde_json::Value>,
}

#[derive(Object, Debug)]
pub struct SubmitTemplateRequestDto {
    pub category: TemplateCategoryDto,
}
