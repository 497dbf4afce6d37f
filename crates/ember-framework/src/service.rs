//! Tower integration.
//!
//! [`RegistryService`] exposes a shared [`Registry`] as a
//! `tower::Service<Inbound>`, so adapters can drive dispatch through Tower
//! middleware:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tower::{ServiceBuilder, ServiceExt};
//! use ember_framework::{Inbound, RegistryService};
//!
//! let service = ServiceBuilder::new()
//!     .concurrency_limit(64)
//!     .service(RegistryService::new(Arc::new(registry)));
//!
//! let handled = service.oneshot(Inbound::message(payload)).await?;
//! ```
//!
//! Time limits are left to such middleware; the pipeline itself never
//! times out.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::Service;

use ember_core::BoxedPayload;

use crate::error::DispatchError;
use crate::registry::Registry;

/// An inbound unit of platform activity.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A chat message that may contain a command.
    Message(BoxedPayload),
    /// A platform event with its type tag.
    Event { tag: String, payload: BoxedPayload },
}

impl Inbound {
    pub fn message(payload: BoxedPayload) -> Self {
        Self::Message(payload)
    }

    pub fn event(tag: impl Into<String>, payload: BoxedPayload) -> Self {
        Self::Event {
            tag: tag.into(),
            payload,
        }
    }
}

/// A [`Registry`] behind `tower::Service`.
#[derive(Debug, Clone)]
pub struct RegistryService {
    registry: Arc<Registry>,
}

impl RegistryService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl Service<Inbound> for RegistryService {
    type Response = bool;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<bool, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, inbound: Inbound) -> Self::Future {
        let registry = Arc::clone(&self.registry);
        async move {
            match inbound {
                Inbound::Message(payload) => registry.handle_message(payload).await,
                Inbound::Event { tag, payload } => registry.emit(&tag, payload).await,
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    use ember_core::TextPayload;

    use crate::command::Command;
    use crate::event::Event;

    #[tokio::test]
    async fn test_service_dispatch() {
        let mut registry = Registry::new();
        registry
            .register_command(Command::builder().name("ping").handler(|_| async { "pong" }).build().unwrap())
            .unwrap();
        registry
            .register_event(Event::builder().event_type("ready").handler(|_| async {}).build().unwrap())
            .unwrap();
        let service = RegistryService::new(Arc::new(registry));

        let handled = service
            .clone()
            .oneshot(Inbound::message(TextPayload::new("!ping").boxed()))
            .await
            .unwrap();
        assert!(handled);

        let handled = service
            .clone()
            .oneshot(Inbound::event("ready", TextPayload::default().boxed()))
            .await
            .unwrap();
        assert!(handled);

        let handled = service
            .oneshot(Inbound::message(TextPayload::new("hello").boxed()))
            .await
            .unwrap();
        assert!(!handled);
    }
}
