use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Shared keyed counter with per-key expiry. Incrementing and arming the
/// expiry on a fresh window must be a single atomic operation, otherwise a
/// counter can survive its window forever.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u64,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 50,
            window: Duration::from_secs(3600),
        }
    }
}

/// Fixed-window limiter. A window boundary can admit up to twice the limit
/// across the two adjacent windows; callers accept that trade-off.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub async fn allow(&self, key: &str) -> anyhow::Result<bool> {
        let count = self
            .store
            .incr_with_ttl(&format!("send_rate:{key}"), self.config.window)
            .await?;
        Ok(count <= self.config.max_requests)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::sync::Mutex;

    use super::*;

    struct StubStore {
        counts: Mutex<HashMap<String, u64>>,
    }

    #[async_trait]
    impl CounterStore for StubStore {
        async fn incr_with_ttl(&self, key: &str, _ttl: Duration) -> anyhow::Result<u64> {
            let mut counts = self.counts.lock().await;
            let count = counts.entry(key.to_string()).or_insert(0);
            *count += 1;
            Ok(*count)
        }
    }

    fn limiter(max_requests: u64) -> RateLimiter {
        RateLimiter::new(
            Arc::new(StubStore {
                counts: Mutex::new(HashMap::new()),
            }),
            RateLimitConfig {
                max_requests,
                window: Duration::from_secs(3600),
            },
        )
    }

    #[tokio::test]
    async fn admits_at_most_max_requests_per_key() {
        let limiter = limiter(3);
        let mut admitted = 0;
        for _ in 0..10 {
            if limiter.allow("+15550001111").await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
    }

    #[tokio::test]
    async fn keys_are_limited_independently() {
        let limiter = limiter(1);
        assert!(limiter.allow("+15550001111").await.unwrap());
        assert!(limiter.allow("+15550002222").await.unwrap());
        assert!(!limiter.allow("+15550001111").await.unwrap());
    }
}
