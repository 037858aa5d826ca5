use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::usecases::{
    create_template::CreateTemplateUseCase, enqueue_bulk::EnqueueBulkUseCase,
    get_message::GetMessageUseCase, list_messages::ListMessagesUseCase,
    submit_template::SubmitTemplateUseCase, sync_template_approval::SyncTemplateApprovalUseCase,
};

#[derive(Clone)]
pub struct ApiState {
    pub enqueue_bulk_usecase: Arc<EnqueueBulkUseCase>,
    pub get_message_usecase: Arc<GetMessageUseCase>,
    pub list_messages_usecase: Arc<ListMessagesUseCase>,
    pub create_template_usecase: Arc<CreateTemplateUseCase>,
    pub submit_template_usecase: Arc<SubmitTemplateUseCase>,
    pub sync_template_approval_usecase: Arc<SyncTemplateApprovalUseCase>,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Messages,
    Templates,
}
