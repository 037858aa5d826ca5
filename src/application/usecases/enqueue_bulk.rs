use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    application::services::job_queue::JobQueue,
    domain::events::DispatchJob,
};

pub struct BulkMessageItem {
    pub recipient: String,
    pub body: String,
    pub metadata: serde_json::Value,
}

pub struct EnqueueBulkResponse {
    pub job_ids: Vec<Uuid>,
}

/// Fans a bulk request out into one durable job per recipient. No record is
/// created here; records are per attempt and belong to the dispatcher.
pub struct EnqueueBulkUseCase {
    queue: Arc<dyn JobQueue>,
}

impl EnqueueBulkUseCase {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    pub async fn execute(
        &self,
        items: Vec<BulkMessageItem>,
    ) -> anyhow::Result<EnqueueBulkResponse> {
        let mut job_ids = Vec::with_capacity(items.len());
        for item in items {
            let job = DispatchJob {
                job_id: Uuid::new_v4(),
                recipient: item.recipient,
                body: item.body,
                metadata: item.metadata,
                enqueued_at: Utc::now(),
            };
            self.queue.enqueue(job.clone()).await?;
            job_ids.push(job.job_id);
        }
        Ok(EnqueueBulkResponse { job_ids })
    }
}
