//! Attaching a cooldown store to a pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use ember_core::BoxError;
use ember_framework::{Flow, Interceptor, InvocationContext};

use crate::error::CooldownError;
use crate::record::Acquire;
use crate::store::CooldownStore;

/// An interceptor that rate-limits invocations per author.
///
/// While the author is in cooldown the interceptor throws
/// [`CooldownError::Active`], which halts the pipeline and can be answered
/// by an exception handler. Otherwise it records the use and publishes it
/// in the shared data bag as `{"cooldown": {"times": n, "calledAt": ms}}`.
/// Payloads without an author pass untouched.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use ember_cooldown::{CooldownError, CooldownInterceptor, CooldownPolicy, MemoryCooldownStore};
/// use ember_framework::{Command, ExceptionFilter};
///
/// let store = Arc::new(MemoryCooldownStore::new(CooldownPolicy::default()));
/// let daily = Command::builder()
///     .name("daily")
///     .interceptor(CooldownInterceptor::new(store))
///     .on_error([ExceptionFilter::of::<CooldownError>()], |_ctx, err| async move {
///         format!("{err}")
///     })
///     .handler(|_ctx| async { "here is your reward" })
///     .build()?;
/// ```
#[derive(Clone)]
pub struct CooldownInterceptor {
    store: Arc<dyn CooldownStore>,
}

impl CooldownInterceptor {
    pub fn new(store: Arc<dyn CooldownStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CooldownStore> {
        &self.store
    }
}

#[async_trait]
impl Interceptor for CooldownInterceptor {
    async fn intercept(&self, ctx: &InvocationContext) -> Result<Flow, BoxError> {
        let Some(user_id) = ctx.payload().author_id() else {
            return Ok(Flow::proceed());
        };

        match self.store.try_acquire(user_id, None).await? {
            Acquire::Granted(record) => Ok(Flow::proceed().with_data(json!({
                "cooldown": { "times": record.times, "calledAt": record.called_at }
            }))),
            Acquire::Denied { retry_after } => {
                debug!(user_id, ?retry_after, "invocation on cooldown");
                Err(CooldownError::Active {
                    user_id: user_id.to_string(),
                    retry_after,
                }
                .into())
            }
        }
    }
}

impl std::fmt::Debug for CooldownInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownInterceptor")
            .field("policy", &self.store.policy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ember_core::{ExceptionFilter, TextPayload};
    use ember_framework::{Command, Registry};
    use parking_lot::Mutex;

    use crate::error::CooldownResult;
    use crate::memory::MemoryCooldownStore;
    use crate::record::{CooldownPolicy, CooldownRecord};

    #[tokio::test]
    async fn test_second_call_is_rejected() {
        let store = Arc::new(MemoryCooldownStore::new(CooldownPolicy {
            cooldown_ms: 60_000,
            max_times: 1,
        }));
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let rejected = Arc::new(Mutex::new(Vec::new()));

        let hits_clone = hits.clone();
        let seen_clone = seen.clone();
        let rejected_clone = rejected.clone();

        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder()
                    .name("daily")
                    .interceptor(CooldownInterceptor::new(store.clone()))
                    .on_error([ExceptionFilter::of::<CooldownError>()], move |_ctx, err| {
                        rejected_clone.lock().push(err.to_string());
                        async {}
                    })
                    .handler(move |ctx| {
                        hits_clone.fetch_add(1, Ordering::SeqCst);
                        seen_clone.lock().push(ctx.get_data("cooldown"));
                        async {}
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let call = || TextPayload::new("!daily").author("u1").boxed();
        assert!(registry.handle_message(call()).await.unwrap());
        assert!(!registry.handle_message(call()).await.unwrap());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        {
            let seen = seen.lock();
            assert_eq!(seen[0].as_ref().unwrap()["times"], 1);
            let rejected = rejected.lock();
            assert_eq!(rejected.len(), 1);
            assert!(rejected[0].contains("'u1' is on cooldown"));
        }

        // other users are unaffected
        let other = TextPayload::new("!daily").author("u2").boxed();
        assert!(registry.handle_message(other).await.unwrap());
        assert_eq!(seen.lock().len(), 2);
    }

    /// Suspends before every call, the way a networked store does.
    struct YieldingStore(MemoryCooldownStore);

    #[async_trait]
    impl CooldownStore for YieldingStore {
        fn policy(&self) -> CooldownPolicy {
            self.0.policy()
        }

        async fn get_cooldown(&self, user_id: &str) -> CooldownResult<Option<CooldownRecord>> {
            tokio::task::yield_now().await;
            self.0.get_cooldown(user_id).await
        }

        async fn is_in_cooldown(&self, user_id: &str) -> CooldownResult<bool> {
            tokio::task::yield_now().await;
            self.0.is_in_cooldown(user_id).await
        }

        async fn increase_cooldown(
            &self,
            user_id: &str,
            now: Option<u64>,
        ) -> CooldownResult<CooldownRecord> {
            tokio::task::yield_now().await;
            self.0.increase_cooldown(user_id, now).await
        }

        async fn try_acquire(&self, user_id: &str, now: Option<u64>) -> CooldownResult<Acquire> {
            tokio::task::yield_now().await;
            self.0.try_acquire(user_id, now).await
        }

        async fn delete_cooldown(&self, user_id: &str) -> CooldownResult<bool> {
            tokio::task::yield_now().await;
            self.0.delete_cooldown(user_id).await
        }

        async fn clear(&self) -> CooldownResult<()> {
            tokio::task::yield_now().await;
            self.0.clear().await
        }
    }

    #[tokio::test]
    async fn test_concurrent_calls_pass_once() {
        let store = Arc::new(YieldingStore(MemoryCooldownStore::new(CooldownPolicy {
            cooldown_ms: 60_000,
            max_times: 1,
        })));
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder()
                    .name("daily")
                    .interceptor(CooldownInterceptor::new(store.clone()))
                    .handler(move |_ctx| {
                        hits_clone.fetch_add(1, Ordering::SeqCst);
                        async {}
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let call = || TextPayload::new("!daily").author("u1").boxed();
        let (a, b) = tokio::join!(
            registry.handle_message(call()),
            registry.handle_message(call())
        );
        let passed = [a.unwrap(), b.unwrap()].into_iter().filter(|ok| *ok).count();

        assert_eq!(passed, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let record = store.get_cooldown("u1").await.unwrap().unwrap();
        assert_eq!(record.times, 1);
    }

    #[tokio::test]
    async fn test_anonymous_payload_passes() {
        let store = Arc::new(MemoryCooldownStore::new(CooldownPolicy::default()));
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder()
                    .name("ping")
                    .interceptor(CooldownInterceptor::new(store.clone()))
                    .handler(|_| async {})
                    .build()
                    .unwrap(),
            )
            .unwrap();

        for _ in 0..3 {
            assert!(registry.handle_message(TextPayload::new("!ping").boxed()).await.unwrap());
        }
        assert!(store.is_empty());
    }
}
