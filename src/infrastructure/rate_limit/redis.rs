use std::time::Duration;

use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use crate::application::services::rate_limit::CounterStore;

// INCR and the first-increment EXPIRE must land together, otherwise a crash
// in between leaves a counter that never expires.
const INCR_WITH_TTL: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Holds one multiplexed connection for the store's lifetime; the manager
/// reconnects on its own after broker hiccups.
pub struct RedisCounterStore {
    conn: ConnectionManager,
    script: Script,
}

impl RedisCounterStore {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            conn: ConnectionManager::new(client).await?,
            script: Script::new(INCR_WITH_TTL),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_with_ttl(&self, key: &str, ttl: Duration) -> anyhow::Result<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = self
            .script
            .key(key)
            .arg(ttl.as_secs())
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }
}
