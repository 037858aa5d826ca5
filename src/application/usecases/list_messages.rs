use std::sync::Arc;

use crate::domain::{models::MessageRecord, repositories::MessageRepository};

pub struct ListMessagesResult {
    pub messages: Vec<MessageRecord>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

pub struct ListMessagesUseCase {
    messages: Arc<dyn MessageRepository>,
}

impl ListMessagesUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    pub async fn execute(
        &self,
        recipient: Option<String>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<ListMessagesResult> {
        let (messages, has_more) = self.messages.list(recipient, limit, offset).await?;
        let next_offset = if has_more {
            Some(offset.unwrap_or(0) + messages.len() as u32)
        } else {
            None
        };
        Ok(ListMessagesResult {
            messages,
            has_more,
            next_offset,
        })
    }
}
