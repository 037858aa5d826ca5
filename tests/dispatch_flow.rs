use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use sendhub::application::handlers::dispatcher::DispatchHandler;
use sendhub::application::handlers::reconciler::{ReconcileOutcome, StatusReconciler};
use sendhub::application::services::job_queue::{JobQueue, RetryPolicy};
use sendhub::application::services::provider::ProviderClient;
use sendhub::application::services::rate_limit::{RateLimitConfig, RateLimiter};
use sendhub::application::usecases::enqueue_bulk::{BulkMessageItem, EnqueueBulkUseCase};
use sendhub::domain::errors::SendError;
use sendhub::domain::events::DispatchJob;
use sendhub::domain::models::{DeliveryStatus, ProviderStatusUpdate};
use sendhub::domain::repositories::MessageRepository;
use sendhub::infrastructure::rate_limit::in_memory::InMemoryCounterStore;
use sendhub::infrastructure::repositories::in_memory::InMemoryMessageRepository;

/// Queue stub the tests drain by hand, replaying the redelivery rules the
/// durable queue applies in production.
#[derive(Default)]
struct DrainQueue {
    jobs: Mutex<VecDeque<DispatchJob>>,
}

#[async_trait::async_trait]
impl JobQueue for DrainQueue {
    async fn enqueue(&self, job: DispatchJob) -> anyhow::Result<()> {
        self.jobs.lock().await.push_back(job);
        Ok(())
    }
}

struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, SendError>>>,
}

impl ScriptedProvider {
    fn with_responses(responses: Vec<Result<String, SendError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from(responses)),
        })
    }
}

#[async_trait::async_trait]
impl ProviderClient for ScriptedProvider {
    async fn send(&self, _recipient: &str, _body: &str) -> Result<String, SendError> {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("SM-default".to_string()))
    }
}

struct Harness {
    queue: Arc<DrainQueue>,
    enqueue: EnqueueBulkUseCase,
    handler: DispatchHandler,
    messages: Arc<InMemoryMessageRepository>,
    retry: RetryPolicy,
}

fn harness(provider: Arc<ScriptedProvider>, max_per_window: u64) -> Harness {
    let retry = RetryPolicy::default();
    let queue = Arc::new(DrainQueue::default());
    let messages = Arc::new(InMemoryMessageRepository::new());
    let rate_limiter = RateLimiter::new(
        Arc::new(InMemoryCounterStore::new()),
        RateLimitConfig {
            max_requests: max_per_window,
            window: Duration::from_secs(3600),
        },
    );
    Harness {
        queue: queue.clone(),
        enqueue: EnqueueBulkUseCase::new(queue),
        handler: DispatchHandler::new(rate_limiter, messages.clone(), provider),
        messages,
        retry,
    }
}

fn item(recipient: &str) -> BulkMessageItem {
    BulkMessageItem {
        recipient: recipient.to_string(),
        body: "order update".to_string(),
        metadata: serde_json::json!({"campaign": "launch"}),
    }
}

/// Drains the queue the way the worker does: ack on success, redeliver
/// retryable failures until the policy is exhausted, drop the rest. Returns
/// the redelivery delays that were scheduled along the way.
async fn drain(h: &Harness) -> Vec<Duration> {
    let mut delays = Vec::new();
    loop {
        let Some(job) = h.queue.jobs.lock().await.pop_front() else {
            break;
        };
        let mut attempt = 1;
        loop {
            match h.handler.handle(&job, attempt).await {
                Ok(()) => break,
                Err(err) if err.is_retryable() && !h.retry.exhausted(attempt) => {
                    delays.push(h.retry.delay_for(attempt));
                    attempt += 1;
                }
                Err(_) => break,
            }
        }
    }
    delays
}

#[tokio::test]
async fn bulk_enqueue_dispatches_each_recipient_once() {
    let provider = ScriptedProvider::with_responses(vec![
        Ok("SM-1".to_string()),
        Ok("SM-2".to_string()),
    ]);
    let h = harness(provider, 50);

    let response = h
        .enqueue
        .execute(vec![item("+15550001111"), item("+15550002222")])
        .await
        .unwrap();
    assert_eq!(response.job_ids.len(), 2);

    let delays = drain(&h).await;
    assert!(delays.is_empty());

    let (records, _) = h.messages.list(None, None, None).await.unwrap();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.status, DeliveryStatus::Sent);
        assert!(record.provider_id.is_some());
        assert!(record.sent_at.is_some());
    }
}

#[tokio::test]
async fn transient_failures_retry_with_backoff_and_a_record_per_attempt() {
    let provider = ScriptedProvider::with_responses(vec![
        Err(SendError::Timeout),
        Err(SendError::Transport("connection reset".to_string())),
        Ok("SM-ok".to_string()),
    ]);
    let h = harness(provider, 50);

    h.enqueue.execute(vec![item("+15550001111")]).await.unwrap();
    let delays = drain(&h).await;

    assert_eq!(
        delays,
        vec![Duration::from_secs(60), Duration::from_secs(120)]
    );

    let (records, _) = h.messages.list(None, None, None).await.unwrap();
    assert_eq!(records.len(), 3);
    let sent = records
        .iter()
        .filter(|r| r.status == DeliveryStatus::Sent)
        .count();
    let failed = records
        .iter()
        .filter(|r| r.status == DeliveryStatus::Failed)
        .count();
    assert_eq!(sent, 1);
    assert_eq!(failed, 2);
}

#[tokio::test]
async fn exhausted_retries_leave_only_failed_records() {
    let provider = ScriptedProvider::with_responses(vec![
        Err(SendError::Timeout),
        Err(SendError::Timeout),
        Err(SendError::Timeout),
    ]);
    let h = harness(provider, 50);

    h.enqueue.execute(vec![item("+15550001111")]).await.unwrap();
    let delays = drain(&h).await;
    assert_eq!(delays.len(), 2);

    let (records, _) = h.messages.list(None, None, None).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.status == DeliveryStatus::Failed));
}

#[tokio::test]
async fn permanent_rejection_is_not_redelivered() {
    let provider = ScriptedProvider::with_responses(vec![Err(SendError::Rejected {
        code: "21211".to_string(),
        message: "invalid recipient".to_string(),
        permanent: true,
    })]);
    let h = harness(provider, 50);

    h.enqueue.execute(vec![item("+15550001111")]).await.unwrap();
    let delays = drain(&h).await;
    assert!(delays.is_empty());

    let (records, _) = h.messages.list(None, None, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DeliveryStatus::Failed);
    assert_eq!(records[0].error_code.as_deref(), Some("21211"));
}

#[tokio::test]
async fn rate_limited_attempt_creates_no_record() {
    let provider = ScriptedProvider::with_responses(vec![Ok("SM-1".to_string())]);
    let h = harness(provider, 1);

    h.enqueue
        .execute(vec![item("+15550001111"), item("+15550001111")])
        .await
        .unwrap();

    let mut rate_limited = 0;
    while let Some(job) = h.queue.jobs.lock().await.pop_front() {
        if h.handler.handle(&job, 1).await.is_err() {
            rate_limited += 1;
        }
    }

    assert_eq!(rate_limited, 1);
    let (records, _) = h.messages.list(None, None, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DeliveryStatus::Sent);
}

#[tokio::test]
async fn provider_callback_reconciles_the_dispatched_record() {
    let provider = ScriptedProvider::with_responses(vec![Ok("SM-roundtrip".to_string())]);
    let h = harness(provider, 50);

    h.enqueue.execute(vec![item("+15550001111")]).await.unwrap();
    drain(&h).await;

    let reconciler = StatusReconciler::new(h.messages.clone());
    let outcome = reconciler
        .apply_callback(ProviderStatusUpdate {
            provider_id: "SM-roundtrip".to_string(),
            status: DeliveryStatus::Delivered,
            error_code: None,
            error_message: None,
        })
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Applied);

    let record = h
        .messages
        .find_by_provider_id("SM-roundtrip")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, DeliveryStatus::Delivered);
    assert!(record.sent_at.is_some());

    let dropped = reconciler
        .apply_callback(ProviderStatusUpdate {
            provider_id: "SM-unknown".to_string(),
            status: DeliveryStatus::Delivered,
            error_code: None,
            error_message: None,
        })
        .await
        .unwrap();
    assert_eq!(dropped, ReconcileOutcome::Dropped);
}
