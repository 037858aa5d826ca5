use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scheduled unit of work: a single recipient's send attempt(s) within
/// one bulk request. Attempt counting, retry budget and redelivery timing
/// belong to the job queue, not the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchJob {
    pub job_id: Uuid,
    pub recipient: String,
    pub body: String,
    pub metadata: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}
