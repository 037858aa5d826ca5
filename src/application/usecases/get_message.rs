use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{models::MessageRecord, repositories::MessageRepository};

pub struct GetMessageUseCase {
    messages: Arc<dyn MessageRepository>,
}

impl GetMessageUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    pub async fn execute(&self, message_id: Uuid) -> anyhow::Result<MessageRecord> {
        self.messages
            .get(message_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("message not found"))
    }
}
