use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, param::Query, payload::Json};

use crate::{
    application::usecases::enqueue_bulk::BulkMessageItem,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_message,
        requests::BulkSendRequestDto,
        responses::{BulkSendResponseDto, MessageRecordDto, PaginatedMessagesDto},
    },
};

#[derive(Clone)]
pub struct MessagesEndpoints {
    state: Arc<ApiState>,
}

impl MessagesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl MessagesEndpoints {
    #[oai(
        path = "/messages/bulk",
        method = "post",
        tag = EndpointsTags::Messages,
    )]
    pub async fn bulk_send(
        &self,
        request: Json<BulkSendRequestDto>,
    ) -> PoemResult<Json<BulkSendResponseDto>> {
        if request.messages.is_empty() {
            return Err(poem::Error::from_string(
                "messages array cannot be empty",
                poem::http::StatusCode::BAD_REQUEST,
            ));
        }

        if request.messages.len() > 100 {
            return Err(poem::Error::from_string(
                "messages array cannot exceed 100 items",
                poem::http::StatusCode::BAD_REQUEST,
            ));
        }

        let items = request
            .0
            .messages
            .into_iter()
            .map(|msg| BulkMessageItem {
                recipient: msg.to,
                body: msg.body,
                metadata: msg.metadata.unwrap_or(serde_json::Value::Null),
            })
            .collect();

        let response = self
            .state
            .enqueue_bulk_usecase
            .execute(items)
            .await
            .map_err(internal_error)?;

        Ok(Json(BulkSendResponseDto {
            queued_jobs: response.job_ids,
        }))
    }

    #[oai(
        path = "/messages/:message_id",
        method = "get",
        tag = EndpointsTags::Messages,
    )]
    pub async fn get_message(
        &self,
        message_id: Path<uuid::Uuid>,
    ) -> PoemResult<Json<MessageRecordDto>> {
        let record = self
            .state
            .get_message_usecase
            .execute(message_id.0)
            .await
            .map_err(|e| {
                if e.to_string().contains("not found") {
                    poem::Error::from_string("message not found", poem::http::StatusCode::NOT_FOUND)
                } else {
                    internal_error(e)
                }
            })?;

        Ok(Json(map_message(&record)))
    }

    #[oai(
        path = "/messages",
        method = "get",
        tag = EndpointsTags::Messages,
    )]
    pub async fn list_messages(
        &self,
        recipient: Query<Option<String>>,
        limit: Query<Option<u32>>,
        offset: Query<Option<u32>>,
    ) -> PoemResult<Json<PaginatedMessagesDto>> {
        let result = self
            .state
            .list_messages_usecase
            .execute(recipient.0, limit.0, offset.0)
            .await
            .map_err(internal_error)?;

        Ok(Json(PaginatedMessagesDto {
            messages: result.messages.iter().map(map_message).collect(),
            has_more: result.has_more,
            next_offset: result.next_offset,
        }))
    }
}

fn internal_error(err: anyhow::Error) -> poem::Error {
    poem::Error::from_string(
        err.to_string(),
        poem::http::StatusCode::INTERNAL_SERVER_ERROR,
    )
}
