//! In-process cooldown store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::CooldownResult;
use crate::record::{Acquire, CooldownPolicy, CooldownRecord, CooldownState, now_millis};
use crate::store::CooldownStore;

/// A [`CooldownStore`] backed by a map guarded by a mutex.
///
/// Each operation holds the lock for its whole check-and-update. Writes
/// sweep out records whose window has closed, at most once per window.
#[derive(Debug, Default)]
pub struct MemoryCooldownStore {
    policy: CooldownPolicy,
    records: Mutex<HashMap<String, CooldownRecord>>,
    next_sweep: AtomicU64,
}

impl MemoryCooldownStore {
    pub fn new(policy: CooldownPolicy) -> Self {
        Self {
            policy,
            records: Mutex::new(HashMap::new()),
            next_sweep: AtomicU64::new(0),
        }
    }

    /// Number of stored records, including stale ones not swept yet.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    // callers hold the records lock
    fn sweep(&self, records: &mut HashMap<String, CooldownRecord>, now: u64) {
        if now < self.next_sweep.load(Ordering::Relaxed) {
            return;
        }
        self.next_sweep
            .store(now.saturating_add(self.policy.cooldown_ms), Ordering::Relaxed);

        let before = records.len();
        records.retain(|_, record| !self.policy.is_stale(record, now));
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, remaining = records.len(), "swept stale cooldown records");
        }
    }
}

#[async_trait]
impl CooldownStore for MemoryCooldownStore {
    fn policy(&self) -> CooldownPolicy {
        self.policy
    }

    async fn get_cooldown(&self, user_id: &str) -> CooldownResult<Option<CooldownRecord>> {
        Ok(self.records.lock().get(user_id).copied())
    }

    async fn is_in_cooldown(&self, user_id: &str) -> CooldownResult<bool> {
        let mut records = self.records.lock();
        match self.policy.check(records.get(user_id), now_millis()) {
            CooldownState::Free => Ok(false),
            CooldownState::Active { .. } => Ok(true),
            CooldownState::Expired => {
                trace!(user_id, "cooldown expired");
                records.remove(user_id);
                Ok(false)
            }
        }
    }

    async fn increase_cooldown(
        &self,
        user_id: &str,
        now: Option<u64>,
    ) -> CooldownResult<CooldownRecord> {
        let now = now.unwrap_or_else(now_millis);
        let mut records = self.records.lock();
        self.sweep(&mut records, now);
        let record = self.policy.increase(records.get(user_id), now);
        records.insert(user_id.to_string(), record);
        Ok(record)
    }

    async fn try_acquire(&self, user_id: &str, now: Option<u64>) -> CooldownResult<Acquire> {
        let now = now.unwrap_or_else(now_millis);
        let mut records = self.records.lock();
        self.sweep(&mut records, now);
        let outcome = self.policy.acquire(records.get(user_id), now);
        if let Acquire::Granted(record) = outcome {
            records.insert(user_id.to_string(), record);
        }
        Ok(outcome)
    }

    async fn delete_cooldown(&self, user_id: &str) -> CooldownResult<bool> {
        Ok(self.records.lock().remove(user_id).is_some())
    }

    async fn clear(&self) -> CooldownResult<()> {
        self.records.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store(cooldown_ms: u64, max_times: u32) -> MemoryCooldownStore {
        MemoryCooldownStore::new(CooldownPolicy {
            cooldown_ms,
            max_times,
        })
    }

    #[tokio::test]
    async fn test_single_use_window_resets() {
        let store = store(100, 1);
        store.increase_cooldown("u", None).await.unwrap();
        assert!(store.is_in_cooldown("u").await.unwrap());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!store.is_in_cooldown("u").await.unwrap());
        assert!(store.get_cooldown("u").await.unwrap().is_none());

        store.increase_cooldown("u", None).await.unwrap();
        let record = store.get_cooldown("u").await.unwrap().unwrap();
        assert_eq!(record.times, 1);
    }

    #[tokio::test]
    async fn test_uses_accumulate_until_max() {
        let store = store(60_000, 3);
        let now = now_millis();
        store.increase_cooldown("u", Some(now)).await.unwrap();
        assert!(!store.is_in_cooldown("u").await.unwrap());
        store.increase_cooldown("u", Some(now + 1)).await.unwrap();
        let record = store.increase_cooldown("u", Some(now + 2)).await.unwrap();
        assert_eq!(record, CooldownRecord { called_at: now, times: 3 });
        assert!(store.is_in_cooldown("u").await.unwrap());
        assert!(!store.is_in_cooldown("someone-else").await.unwrap());

        // a use at the threshold starts a new window
        let record = store.increase_cooldown("u", Some(now + 3)).await.unwrap();
        assert_eq!(record, CooldownRecord::first(now + 3));
    }

    #[tokio::test]
    async fn test_try_acquire_denies_exhausted_user() {
        let store = store(60_000, 2);
        let now = now_millis();
        assert!(store.try_acquire("u", Some(now)).await.unwrap().is_granted());
        assert!(store.try_acquire("u", Some(now + 1)).await.unwrap().is_granted());

        let denied = store.try_acquire("u", Some(now + 10)).await.unwrap();
        assert_eq!(denied, Acquire::Denied { retry_after: Duration::from_millis(59_990) });
        // a denial leaves the window untouched
        let record = store.get_cooldown("u").await.unwrap().unwrap();
        assert_eq!(record, CooldownRecord { called_at: now, times: 2 });

        let again = store.try_acquire("u", Some(now + 60_000)).await.unwrap();
        assert_eq!(again, Acquire::Granted(CooldownRecord::first(now + 60_000)));
    }

    #[tokio::test]
    async fn test_stale_records_are_swept() {
        let store = store(100, 3);
        store.increase_cooldown("a", Some(1_000)).await.unwrap();
        store.try_acquire("b", Some(1_050)).await.unwrap();
        assert_eq!(store.len(), 2);

        // "a" never reached max_times, so no check would ever remove it
        store.increase_cooldown("c", Some(1_120)).await.unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get_cooldown("a").await.unwrap().is_none());

        store.try_acquire("d", Some(1_300)).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get_cooldown("d").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = store(60_000, 1);
        store.increase_cooldown("a", None).await.unwrap();
        store.increase_cooldown("b", None).await.unwrap();

        assert!(store.delete_cooldown("a").await.unwrap());
        assert!(!store.delete_cooldown("a").await.unwrap());
        assert!(!store.is_in_cooldown("a").await.unwrap());
        assert_eq!(store.len(), 1);

        store.clear().await.unwrap();
        assert!(store.is_empty());
    }
}
