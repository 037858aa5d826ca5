use std::time::Duration;

use async_trait::async_trait;

use crate::domain::events::DispatchJob;

/// Durable at-least-once work queue. Each job instance is delivered to one
/// consumer at a time; redelivery timing follows the retry policy.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: DispatchJob) -> anyhow::Result<()>;
}

/// Bounded attempts with a fixed backoff schedule between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: vec![
                Duration::from_secs(60),
                Duration::from_secs(120),
                Duration::from_secs(300),
            ],
        }
    }
}

impl RetryPolicy {
    /// Wait before redelivery after failed attempt `attempt` (1-based).
    /// Attempts past the end of the schedule reuse its last element.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let last = self.backoff.len().saturating_sub(1);
        let idx = (attempt.saturating_sub(1) as usize).min(last);
        self.backoff.get(idx).copied().unwrap_or(Duration::ZERO)
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
