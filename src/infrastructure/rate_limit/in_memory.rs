use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::application::services::rate_limit::CounterStore;

/// Keyed counters with deadline-based expiry, for tests and single-process
/// runs. The mutex makes increment-and-arm-expiry atomic, matching the
/// contract the Redis store satisfies with a script.
#[derive(Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, WindowCounter>>,
}

struct WindowCounter {
    count: u64,
    expires_at: Instant,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> anyhow::Result<u64> {
        let now = Instant::now();
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(key.to_string()).or_insert(WindowCounter {
            count: 0,
            expires_at: now + ttl,
        });
        if counter.expires_at <= now {
            counter.count = 0;
            counter.expires_at = now + ttl;
        }
        counter.count += 1;
        Ok(counter.count)
    }
}
