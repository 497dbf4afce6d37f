//! Redis-backed cooldown store.
//!
//! Records are stored as JSON strings under
//! `<hash_key>.<identifier>.<user_id>` with a `PX` expiry equal to the
//! cooldown window, so stale entries disappear on their own. The
//! `identifier` keeps deployments sharing one server apart.
//!
//! The read-modify-write of `increase_cooldown` and `try_acquire` and the
//! expire-on-read of `is_in_cooldown` run as Lua scripts, so concurrent
//! dispatches for the same user cannot interleave between the read and the
//! write.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Script};
use tracing::{debug, info};

use crate::error::CooldownResult;
use crate::record::{Acquire, CooldownPolicy, CooldownRecord, now_millis};
use crate::store::CooldownStore;

// KEYS[1] = record key; ARGV = now, cooldown_ms, max_times
const INCREASE_SCRIPT: &str = r#"
local now = tonumber(ARGV[1])
local cooldown = tonumber(ARGV[2])
local max_times = tonumber(ARGV[3])
local called_at = now
local times = 1
local raw = redis.call('GET', KEYS[1])
if raw then
  local record = cjson.decode(raw)
  if record.times < max_times and now < record.calledAt + cooldown then
    called_at = record.calledAt
    times = record.times + 1
  end
end
local encoded = string.format('{"calledAt":%d,"times":%d}', called_at, times)
redis.call('SET', KEYS[1], encoded, 'PX', cooldown)
return encoded
"#;

// KEYS[1] = record key; ARGV = now, cooldown_ms, max_times
const CHECK_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return 0
end
local record = cjson.decode(raw)
if record.times < tonumber(ARGV[3]) then
  return 0
end
if tonumber(ARGV[1]) >= record.calledAt + tonumber(ARGV[2]) then
  redis.call('DEL', KEYS[1])
  return 0
end
return 1
"#;

// KEYS[1] = record key; ARGV = now, cooldown_ms, max_times
// returns {1, new record} when granted, {0, current record} when denied
const ACQUIRE_SCRIPT: &str = r#"
local now = tonumber(ARGV[1])
local cooldown = tonumber(ARGV[2])
local max_times = tonumber(ARGV[3])
local called_at = now
local times = 1
local raw = redis.call('GET', KEYS[1])
if raw then
  local record = cjson.decode(raw)
  if now < record.calledAt + cooldown then
    if record.times >= max_times then
      return {0, raw}
    end
    called_at = record.calledAt
    times = record.times + 1
  end
end
local encoded = string.format('{"calledAt":%d,"times":%d}', called_at, times)
redis.call('SET', KEYS[1], encoded, 'PX', cooldown)
return {1, encoded}
"#;

const SCAN_BATCH: usize = 100;

/// A [`CooldownStore`] persisted in Redis.
pub struct RedisCooldownStore {
    conn: MultiplexedConnection,
    policy: CooldownPolicy,
    hash_key: String,
    identifier: String,
    increase: Script,
    check: Script,
    acquire: Script,
}

impl RedisCooldownStore {
    /// Connects to `url` and creates a store namespaced by `hash_key` and
    /// `identifier`.
    pub async fn connect(
        url: &str,
        hash_key: impl Into<String>,
        identifier: impl Into<String>,
        policy: CooldownPolicy,
    ) -> CooldownResult<Self> {
        policy.validate()?;
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        let store = Self::new(conn, hash_key, identifier, policy);
        info!(namespace = %store.namespace(), "connected redis cooldown store");
        Ok(store)
    }

    /// Creates a store over an existing connection.
    pub fn new(
        conn: MultiplexedConnection,
        hash_key: impl Into<String>,
        identifier: impl Into<String>,
        policy: CooldownPolicy,
    ) -> Self {
        Self {
            conn,
            policy,
            hash_key: hash_key.into(),
            identifier: identifier.into(),
            increase: Script::new(INCREASE_SCRIPT),
            check: Script::new(CHECK_SCRIPT),
            acquire: Script::new(ACQUIRE_SCRIPT),
        }
    }

    /// The key prefix shared by every record of this store.
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.hash_key, self.identifier)
    }

    /// The key under which `user_id`'s record is stored.
    pub fn key(&self, user_id: &str) -> String {
        format!("{}.{}.{}", self.hash_key, self.identifier, user_id)
    }
}

#[async_trait]
impl CooldownStore for RedisCooldownStore {
    fn policy(&self) -> CooldownPolicy {
        self.policy
    }

    async fn get_cooldown(&self, user_id: &str) -> CooldownResult<Option<CooldownRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.key(user_id)).await?;
        raw.as_deref().map(CooldownRecord::from_json).transpose()
    }

    async fn is_in_cooldown(&self, user_id: &str) -> CooldownResult<bool> {
        let mut conn = self.conn.clone();
        let active: i64 = self
            .check
            .key(self.key(user_id))
            .arg(now_millis())
            .arg(self.policy.cooldown_ms)
            .arg(self.policy.max_times)
            .invoke_async(&mut conn)
            .await?;
        Ok(active == 1)
    }

    async fn increase_cooldown(
        &self,
        user_id: &str,
        now: Option<u64>,
    ) -> CooldownResult<CooldownRecord> {
        let mut conn = self.conn.clone();
        let raw: String = self
            .increase
            .key(self.key(user_id))
            .arg(now.unwrap_or_else(now_millis))
            .arg(self.policy.cooldown_ms)
            .arg(self.policy.max_times)
            .invoke_async(&mut conn)
            .await?;
        CooldownRecord::from_json(&raw)
    }

    async fn try_acquire(&self, user_id: &str, now: Option<u64>) -> CooldownResult<Acquire> {
        let now = now.unwrap_or_else(now_millis);
        let mut conn = self.conn.clone();
        let (granted, raw): (i64, String) = self
            .acquire
            .key(self.key(user_id))
            .arg(now)
            .arg(self.policy.cooldown_ms)
            .arg(self.policy.max_times)
            .invoke_async(&mut conn)
            .await?;
        let record = CooldownRecord::from_json(&raw)?;
        if granted == 1 {
            Ok(Acquire::Granted(record))
        } else {
            Ok(Acquire::Denied {
                retry_after: self.policy.retry_after(&record, now),
            })
        }
    }

    async fn delete_cooldown(&self, user_id: &str) -> CooldownResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.key(user_id)).await?;
        Ok(removed > 0)
    }

    async fn clear(&self) -> CooldownResult<()> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}.*", self.namespace());
        let mut cursor: u64 = 0;
        let mut removed = 0usize;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            if !keys.is_empty() {
                removed += keys.len();
                let _: i64 = conn.del(keys).await?;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!(namespace = %self.namespace(), removed, "cleared cooldown records");
        Ok(())
    }
}

impl std::fmt::Debug for RedisCooldownStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCooldownStore")
            .field("namespace", &self.namespace())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn store(identifier: &str, cooldown_ms: u64, max_times: u32) -> RedisCooldownStore {
        let url = std::env::var("EMBER_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let store = RedisCooldownStore::connect(
            &url,
            "ember-test",
            identifier,
            CooldownPolicy {
                cooldown_ms,
                max_times,
            },
        )
        .await
        .unwrap();
        store.clear().await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore = "requires a redis server (EMBER_TEST_REDIS_URL)"]
    async fn test_single_use_window_resets() {
        let store = store("window", 100, 1).await;
        store.increase_cooldown("u", None).await.unwrap();
        assert!(store.is_in_cooldown("u").await.unwrap());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!store.is_in_cooldown("u").await.unwrap());

        let record = store.increase_cooldown("u", None).await.unwrap();
        assert_eq!(record.times, 1);
        assert_eq!(store.get_cooldown("u").await.unwrap(), Some(record));
    }

    #[tokio::test]
    #[ignore = "requires a redis server (EMBER_TEST_REDIS_URL)"]
    async fn test_concurrent_acquire_grants_once() {
        let store = store("acquire", 60_000, 1).await;
        let (a, b) = tokio::join!(store.try_acquire("u", None), store.try_acquire("u", None));
        let granted = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|outcome| outcome.is_granted())
            .count();
        assert_eq!(granted, 1);
        assert_eq!(store.get_cooldown("u").await.unwrap().unwrap().times, 1);
    }

    #[tokio::test]
    #[ignore = "requires a redis server (EMBER_TEST_REDIS_URL)"]
    async fn test_increase_and_clear() {
        let store = store("counting", 60_000, 3).await;
        let now = now_millis();
        store.increase_cooldown("a", Some(now)).await.unwrap();
        let record = store.increase_cooldown("a", Some(now + 5)).await.unwrap();
        assert_eq!(record, CooldownRecord { called_at: now, times: 2 });
        assert!(!store.is_in_cooldown("a").await.unwrap());

        store.increase_cooldown("b", Some(now)).await.unwrap();
        assert!(store.delete_cooldown("b").await.unwrap());
        assert!(!store.delete_cooldown("b").await.unwrap());

        store.clear().await.unwrap();
        assert!(store.get_cooldown("a").await.unwrap().is_none());
    }
}
