use crate::{
    domain::models::{MessageRecord, Template},
    presentation::http::responses::{MessageRecordDto, TemplateDto},
};

pub fn map_message(record: &MessageRecord) -> MessageRecordDto {
    MessageRecordDto {
        id: record.id,
        provider_id: record.provider_id.clone(),
        recipient: record.recipient.clone(),
        body: record.body.clone(),
        status: record.status.into(),
        error_code: record.error_code.clone(),
        error_message: record.error_message.clone(),
        metadata: record.metadata.clone(),
        created_at: record.created_at.to_rfc3339(),
        sent_at: record.sent_at.map(|at| at.to_rfc3339()),
        updated_at: record.updated_at.to_rfc3339(),
    }
}

pub fn map_template(template: &Template) -> TemplateDto {
    TemplateDto {
        id: template.id,
        name: template.name.clone(),
        content_sid: template.content_sid.clone(),
        body: template.body.clone(),
        variables: template.variables.clone(),
        category: template.category.map(Into::into),
        status: template.status.into(),
        rejection_reason: template.rejection_reason.clone(),
        created_at: template.created_at.to_rfc3339(),
        updated_at: template.updated_at.to_rfc3339(),
    }
}
