//! The cooldown store contract.

use async_trait::async_trait;

use crate::error::CooldownResult;
use crate::record::{Acquire, CooldownPolicy, CooldownRecord};

/// Per-user rate-limit state, bounded by a [`CooldownPolicy`].
///
/// In-process and durable backends share this one asynchronous interface
/// and apply the transitions of [`CooldownPolicy::increase`] and
/// [`CooldownPolicy::check`]. Each operation is atomic per user.
#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// The window length and use count this store enforces.
    fn policy(&self) -> CooldownPolicy;

    /// Returns the user's record, if any.
    async fn get_cooldown(&self, user_id: &str) -> CooldownResult<Option<CooldownRecord>>;

    /// Returns whether the user is rate-limited right now.
    ///
    /// An exhausted record whose window has elapsed is deleted and reported
    /// as not in cooldown.
    async fn is_in_cooldown(&self, user_id: &str) -> CooldownResult<bool>;

    /// Records one use at `now` (milliseconds since the Unix epoch, current
    /// time when `None`) and returns the updated record.
    async fn increase_cooldown(&self, user_id: &str, now: Option<u64>)
    -> CooldownResult<CooldownRecord>;

    /// Checks and records one use as a single atomic step, following
    /// [`CooldownPolicy::acquire`].
    ///
    /// Separate [`is_in_cooldown`](Self::is_in_cooldown) and
    /// [`increase_cooldown`](Self::increase_cooldown) calls can interleave
    /// with a concurrent dispatch for the same user; gating uses goes
    /// through this method instead.
    async fn try_acquire(&self, user_id: &str, now: Option<u64>) -> CooldownResult<Acquire>;

    /// Deletes the user's record. Returns whether one existed.
    async fn delete_cooldown(&self, user_id: &str) -> CooldownResult<bool>;

    /// Deletes every record of this store.
    async fn clear(&self) -> CooldownResult<()>;
}
