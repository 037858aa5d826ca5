use std::sync::Arc;

use poem::{
    handler,
    http::StatusCode,
    web::{Data, Form},
};
use serde::Deserialize;
use tracing::{error, warn};

use crate::{
    application::handlers::reconciler::StatusReconciler,
    domain::models::{DeliveryStatus, ProviderStatusUpdate},
};

/// Form fields the provider posts on every status change.
#[derive(Debug, Deserialize)]
pub struct StatusCallbackForm {
    #[serde(rename = "MessageSid")]
    pub message_sid: String,
    #[serde(rename = "MessageStatus")]
    pub message_status: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: Option<String>,
    #[serde(rename = "ErrorMessage")]
    pub error_message: Option<String>,
}

/// Always answers 200 for callbacks we choose to ignore; anything else makes
/// the provider retry the callback indefinitely.
#[handler]
pub async fn provider_status_callback(
    reconciler: Data<&Arc<StatusReconciler>>,
    Form(form): Form<StatusCallbackForm>,
) -> StatusCode {
    let Some(status) = DeliveryStatus::from_str(&form.message_status) else {
        warn!(
            provider_id = %form.message_sid,
            status = %form.message_status,
            "ignoring callback with unrecognized status"
        );
        return StatusCode::OK;
    };

    let update = ProviderStatusUpdate {
        provider_id: form.message_sid,
        status,
        error_code: form.error_code,
        error_message: form.error_message,
    };

    match reconciler.apply_callback(update).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            error!(?err, "failed to apply status callback");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
