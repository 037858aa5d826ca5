use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{
    self, AckKind,
    consumer::{AckPolicy, PullConsumer, pull},
};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{error, warn};

use crate::{
    application::{
        handlers::dispatcher::DispatchHandler,
        services::job_queue::{JobQueue, RetryPolicy},
    },
    domain::{errors::DispatchError, events::DispatchJob},
};

#[derive(Clone)]
pub struct JetstreamConfig {
    pub url: String,
    pub stream: String,
    pub subject: String,
    pub durable: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
}

pub struct JetstreamQueue {
    context: jetstream::Context,
    subject: String,
}

impl JetstreamQueue {
    pub async fn new(
        config: &JetstreamConfig,
        retry: RetryPolicy,
    ) -> anyhow::Result<(Arc<Self>, JetstreamWorker)> {
        let client = async_nats::connect(&config.url).await?;
        let context = jetstream::new(client);

        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: vec![config.subject.clone()],
                ..Default::default()
            })
            .await?;

        // No max_deliver cap: the worker alone decides when a job is dead,
        // so redeliveries caused by infrastructure stalls cannot make the
        // broker drop a job on its own.
        let consumer = stream
            .get_or_create_consumer(
                &config.durable,
                pull::Config {
                    durable_name: Some(config.durable.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_seconds),
                    ..Default::default()
                },
            )
            .await?;

        let queue = Arc::new(Self {
            context,
            subject: config.subject.clone(),
        });

        let worker = JetstreamWorker {
            consumer,
            pull_batch: config.pull_batch,
            retry,
        };

        Ok((queue, worker))
    }
}

#[async_trait]
impl JobQueue for JetstreamQueue {
    async fn enqueue(&self, job: DispatchJob) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(&job)?;
        self.context
            .publish(self.subject.clone(), payload.into())
            .await?
            .await?;
        Ok(())
    }
}

pub struct JetstreamWorker {
    consumer: PullConsumer,
    pull_batch: usize,
    retry: RetryPolicy,
}

impl JetstreamWorker {
    pub fn spawn(self, handler: Arc<DispatchHandler>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run(handler).await {
                error!(?err, "jetstream worker stopped");
            }
        })
    }

    async fn run(self, handler: Arc<DispatchHandler>) -> anyhow::Result<()> {
        loop {
            let mut batch = self
                .consumer
                .batch()
                .max_messages(self.pull_batch)
                .messages()
                .await?;
            while let Some(message) = batch.next().await {
                match message {
                    Ok(msg) => {
                        if let Err(err) =
                            Self::process_message(msg, handler.clone(), &self.retry).await
                        {
                            error!(?err, "failed to process job");
                        }
                    }
                    Err(err) => {
                        error!(?err, "jetstream batch error");
                    }
                }
            }
        }
    }

    async fn process_message(
        message: jetstream::Message,
        handler: Arc<DispatchHandler>,
        retry: &RetryPolicy,
    ) -> anyhow::Result<()> {
        let job: DispatchJob = serde_json::from_slice(&message.payload)?;
        let attempt = message
            .info()
            .map(|info| info.delivered.max(1) as u32)
            .unwrap_or(1);

        match dispose(handler.handle(&job, attempt).await, attempt, retry) {
            JobDisposition::Complete => {
                message
                    .ack()
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to ack job: {e}"))?;
            }
            JobDisposition::Redeliver { delay, error } => {
                warn!(
                    job_id = %job.job_id,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %error,
                    "retryable failure, scheduling redelivery"
                );
                message
                    .ack_with(AckKind::Nak(Some(delay)))
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to nak job: {e}"))?;
            }
            JobDisposition::Dead(error) => {
                // Permanent failure or attempts exhausted: the job is dead.
                // Outcomes stay visible through the message records.
                warn!(
                    job_id = %job.job_id,
                    recipient = %job.recipient,
                    attempt,
                    error = %error,
                    "job permanently failed, not redelivering"
                );
                message
                    .ack_with(AckKind::Term)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to terminate job: {e}"))?;
            }
            JobDisposition::Stalled(error) => {
                // Left unacked: the job redelivers after ack_wait once the
                // store recovers. A health signal, not a send attempt.
                error!(
                    job_id = %job.job_id,
                    attempt,
                    error = %error,
                    "infrastructure failure, holding job for redelivery"
                );
            }
        }
        Ok(())
    }
}

enum JobDisposition {
    Complete,
    Redeliver {
        delay: Duration,
        error: DispatchError,
    },
    Dead(DispatchError),
    Stalled(anyhow::Error),
}

/// Maps a handler outcome onto the queue's ack vocabulary. Infrastructure
/// failures never enter the retryable/dead classification: they neither
/// consume the retry schedule nor terminate the job.
fn dispose(
    outcome: Result<(), DispatchError>,
    attempt: u32,
    retry: &RetryPolicy,
) -> JobDisposition {
    match outcome {
        Ok(()) => JobDisposition::Complete,
        Err(DispatchError::Infrastructure(err)) => JobDisposition::Stalled(err),
        Err(err) if err.is_retryable() && !retry.exhausted(attempt) => JobDisposition::Redeliver {
            delay: retry.delay_for(attempt),
            error: err,
        },
        Err(err) => JobDisposition::Dead(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> DispatchError {
        DispatchError::Transient("provider request timed out".to_string())
    }

    #[test]
    fn success_completes_the_job() {
        assert!(matches!(
            dispose(Ok(()), 1, &RetryPolicy::default()),
            JobDisposition::Complete
        ));
    }

    #[test]
    fn transient_failure_redelivers_per_schedule() {
        let policy = RetryPolicy::default();
        match dispose(Err(transient()), 2, &policy) {
            JobDisposition::Redeliver { delay, .. } => {
                assert_eq!(delay, Duration::from_secs(120));
            }
            _ => panic!("expected redelivery"),
        }
    }

    #[test]
    fn transient_failure_at_last_attempt_is_dead() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            dispose(Err(transient()), policy.max_attempts, &policy),
            JobDisposition::Dead(_)
        ));
    }

    #[test]
    fn permanent_failure_is_dead_on_first_attempt() {
        let err = DispatchError::Permanent {
            code: "21211".to_string(),
            message: "invalid recipient".to_string(),
        };
        assert!(matches!(
            dispose(Err(err), 1, &RetryPolicy::default()),
            JobDisposition::Dead(_)
        ));
    }

    #[test]
    fn infrastructure_failure_stalls_even_past_the_schedule() {
        let policy = RetryPolicy::default();
        for attempt in [1, policy.max_attempts, policy.max_attempts + 5] {
            let err = DispatchError::Infrastructure(anyhow::anyhow!("record store unavailable"));
            assert!(matches!(
                dispose(Err(err), attempt, &policy),
                JobDisposition::Stalled(_)
            ));
        }
    }
}
