use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    application::services::{provider::ProviderClient, rate_limit::RateLimiter},
    domain::{errors::DispatchError, events::DispatchJob, repositories::MessageRepository},
};

/// Worker-side handling of one dequeued job: admission check, record create,
/// provider send, record update. Every failure comes back classified so the
/// queue can decide between redelivery and the dead state.
pub struct DispatchHandler {
    rate_limiter: RateLimiter,
    messages: Arc<dyn MessageRepository>,
    provider: Arc<dyn ProviderClient>,
}

impl DispatchHandler {
    pub fn new(
        rate_limiter: RateLimiter,
        messages: Arc<dyn MessageRepository>,
        provider: Arc<dyn ProviderClient>,
    ) -> Self {
        Self {
            rate_limiter,
            messages,
            provider,
        }
    }

    pub async fn handle(&self, job: &DispatchJob, attempt: u32) -> Result<(), DispatchError> {
        // Admission first: a rate-limited attempt leaves no record behind.
        if !self.rate_limiter.allow(&job.recipient).await? {
            warn!(
                job_id = %job.job_id,
                recipient = %job.recipient,
                attempt,
                "rate limit exceeded, deferring job"
            );
            return Err(DispatchError::RateLimited {
                recipient: job.recipient.clone(),
            });
        }

        // One record per attempt. A failed record stays as-is; the retried
        // attempt gets its own record, preserving the audit trail.
        let record = self
            .messages
            .insert(job.recipient.clone(), job.body.clone(), job.metadata.clone())
            .await?;

        match self.provider.send(&job.recipient, &job.body).await {
            Ok(provider_id) => {
                self.messages
                    .mark_sent(record.id, &provider_id, Utc::now())
                    .await?;
                info!(
                    job_id = %job.job_id,
                    record_id = %record.id,
                    provider_id = %provider_id,
                    attempt,
                    "message accepted by provider"
                );
                Ok(())
            }
            Err(err) => {
                self.messages
                    .mark_failed(record.id, err.code(), &err.to_string())
                    .await?;
                warn!(
                    job_id = %job.job_id,
                    record_id = %record.id,
                    attempt,
                    error = %err,
                    permanent = err.is_permanent(),
                    "provider send failed"
                );
                if err.is_permanent() {
                    Err(DispatchError::Permanent {
                        code: err.code().to_string(),
                        message: err.to_string(),
                    })
                } else {
                    Err(DispatchError::Transient(err.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::*;
    use crate::{
        application::services::rate_limit::RateLimitConfig,
        domain::{errors::SendError, models::DeliveryStatus},
        infrastructure::{
            rate_limit::in_memory::InMemoryCounterStore,
            repositories::in_memory::InMemoryMessageRepository,
        },
    };

    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String, SendError>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, SendError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl ProviderClient for ScriptedProvider {
        async fn send(&self, _recipient: &str, _body: &str) -> Result<String, SendError> {
            self.responses.lock().await.remove(0)
        }
    }

    fn job(recipient: &str) -> DispatchJob {
        DispatchJob {
            job_id: Uuid::new_v4(),
            recipient: recipient.to_string(),
            body: "hello".to_string(),
            metadata: serde_json::json!({"order": "order_123"}),
            enqueued_at: Utc::now(),
        }
    }

    fn handler(
        max_requests: u64,
        messages: Arc<InMemoryMessageRepository>,
        provider: Arc<dyn ProviderClient>,
    ) -> DispatchHandler {
        let limiter = RateLimiter::new(
            Arc::new(InMemoryCounterStore::new()),
            RateLimitConfig {
                max_requests,
                window: Duration::from_secs(3600),
            },
        );
        DispatchHandler::new(limiter, messages, provider)
    }

    #[tokio::test]
    async fn successful_send_records_sent_with_provider_id() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let provider = ScriptedProvider::new(vec![Ok("SM123".to_string())]);
        let handler = handler(50, messages.clone(), provider);

        handler.handle(&job("+15550001111"), 1).await.unwrap();

        let (records, _) = messages.list(None, None, None).await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.status, DeliveryStatus::Sent);
        assert_eq!(record.provider_id.as_deref(), Some("SM123"));
        assert!(record.sent_at.is_some());
    }

    #[tokio::test]
    async fn rate_limited_job_creates_no_record() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let provider = ScriptedProvider::new(vec![Ok("SM1".into()), Ok("SM2".into())]);
        let handler = handler(1, messages.clone(), provider);

        handler.handle(&job("+15550001111"), 1).await.unwrap();
        let err = handler.handle(&job("+15550001111"), 1).await.unwrap_err();

        assert!(matches!(err, DispatchError::RateLimited { .. }));
        assert!(err.is_retryable());
        let (records, _) = messages.list(None, None, None).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn distinct_recipients_are_admitted_independently() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let provider = ScriptedProvider::new(vec![Ok("SM1".into()), Ok("SM2".into())]);
        let handler = handler(1, messages.clone(), provider);

        handler.handle(&job("+15550001111"), 1).await.unwrap();
        handler.handle(&job("+15550002222"), 1).await.unwrap();

        let (records, _) = messages.list(None, None, None).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_marks_record_failed_and_is_not_retryable() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let provider = ScriptedProvider::new(vec![Err(SendError::Rejected {
            code: "21656".to_string(),
            message: "template not approved".to_string(),
            permanent: true,
        })]);
        let handler = handler(50, messages.clone(), provider);

        let err = handler.handle(&job("+15550001111"), 1).await.unwrap_err();

        assert!(!err.is_retryable());
        let (records, _) = messages.list(None, None, None).await.unwrap();
        assert_eq!(records[0].status, DeliveryStatus::Failed);
        assert_eq!(records[0].error_code.as_deref(), Some("21656"));
        assert!(records[0].provider_id.is_none());
    }

    #[tokio::test]
    async fn transient_failure_keeps_failed_record_and_retry_adds_a_new_one() {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let provider = ScriptedProvider::new(vec![
            Err(SendError::Timeout),
            Ok("SM456".to_string()),
        ]);
        let handler = handler(50, messages.clone(), provider);
        let job = job("+15550001111");

        let err = handler.handle(&job, 1).await.unwrap_err();
        assert!(err.is_retryable());
        handler.handle(&job, 2).await.unwrap();

        let (records, _) = messages.list(None, None, None).await.unwrap();
        assert_eq!(records.len(), 2);
        let failed = records
            .iter()
            .find(|r| r.status == DeliveryStatus::Failed)
            .unwrap();
        assert_eq!(failed.error_code.as_deref(), Some("timeout"));
        let sent = records
            .iter()
            .find(|r| r.status == DeliveryStatus::Sent)
            .unwrap();
        assert_eq!(sent.provider_id.as_deref(), Some("SM456"));
    }
}
