//! The runtime that ties configuration, logging and a [`Registry`] together.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ember_runtime::EmberRuntime;
//!
//! let mut registry = Registry::new();
//! registry.register_command(ping)?;
//!
//! let mut runtime = EmberRuntime::builder()
//!     .config_file("config/ember.toml")
//!     .registry(registry)
//!     .build()?;
//! runtime.enable_cooldown().await?;
//!
//! // from the adapter's receive loop
//! runtime.handle_message(payload).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use ember_cooldown::{CooldownInterceptor, CooldownStore, MemoryCooldownStore};
use ember_core::BoxedPayload;
use ember_framework::{Registry, RegistryService};

use crate::config::{
    ConfigError, ConfigLoader, CooldownBackend, CooldownConfig, EmberConfig, validate_config,
};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A configured registry ready to dispatch traffic.
pub struct EmberRuntime {
    config: EmberConfig,
    registry: Arc<Registry>,
}

impl EmberRuntime {
    /// Creates a runtime builder that loads configuration from the default
    /// locations.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// The command settings of `config` replace those of `registry`. Logging
    /// is left untouched.
    pub fn new(config: EmberConfig, mut registry: Registry) -> RuntimeResult<Self> {
        validate_config(&config)?;
        registry.set_settings(config.commands.clone());

        info!(
            commands = registry.commands().len(),
            events = registry.events().len(),
            prefixes = ?config.commands.prefixes,
            cooldown_backend = ?config.cooldown.backend,
            "Ember runtime ready"
        );

        Ok(Self {
            config,
            registry: Arc::new(registry),
        })
    }

    pub fn config(&self) -> &EmberConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Mutable access to the registry, while no service shares it.
    pub fn registry_mut(&mut self) -> Option<&mut Registry> {
        Arc::get_mut(&mut self.registry)
    }

    /// A `tower::Service` over the registry.
    pub fn service(&self) -> RegistryService {
        RegistryService::new(Arc::clone(&self.registry))
    }

    /// Creates the cooldown store described by the configuration.
    pub async fn cooldown_store(&self) -> RuntimeResult<Arc<dyn CooldownStore>> {
        build_cooldown_store(&self.config.cooldown).await
    }

    /// Creates the configured cooldown store and installs it as a global
    /// interceptor, so every command and event is rate limited per author.
    ///
    /// Fails with [`RuntimeError::RegistryShared`] once a service holds the
    /// registry.
    pub async fn enable_cooldown(&mut self) -> RuntimeResult<Arc<dyn CooldownStore>> {
        let store = self.cooldown_store().await?;
        let registry = self.registry_mut().ok_or(RuntimeError::RegistryShared)?;
        registry.add_interceptor(CooldownInterceptor::new(Arc::clone(&store)));
        debug!("Global cooldown interceptor installed");
        Ok(store)
    }

    /// Looks the message up among commands and dispatches it.
    pub async fn handle_message(&self, payload: BoxedPayload) -> RuntimeResult<bool> {
        Ok(self.registry.handle_message(payload).await?)
    }

    /// Dispatches a platform event tagged `tag`.
    pub async fn handle_event(&self, tag: &str, payload: BoxedPayload) -> RuntimeResult<bool> {
        Ok(self.registry.emit(tag, payload).await?)
    }
}

impl std::fmt::Debug for EmberRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmberRuntime")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Creates a cooldown store for `config`.
pub async fn build_cooldown_store(config: &CooldownConfig) -> RuntimeResult<Arc<dyn CooldownStore>> {
    let policy = config.policy();
    policy.validate()?;

    match config.backend {
        CooldownBackend::Memory => Ok(Arc::new(MemoryCooldownStore::new(policy))),
        #[cfg(feature = "redis")]
        CooldownBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| ConfigError::missing_field("cooldown.redis_url"))?;
            let store = ember_cooldown::RedisCooldownStore::connect(
                url,
                config.hash_key.as_str(),
                config.identifier.as_str(),
                policy,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        CooldownBackend::Redis => {
            if config.redis_url.is_none() {
                return Err(ConfigError::missing_field("cooldown.redis_url").into());
            }
            Err(RuntimeError::BackendDisabled("redis"))
        }
    }
}

/// Builder for [`EmberRuntime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    registry: Registry,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            registry: Registry::new(),
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge<T: Serialize>(mut self, config: T) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// The registry to run.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Whether `build` installs the global subscriber (default: true).
    pub fn logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Loads and validates the configuration, then builds the runtime.
    pub fn build(self) -> RuntimeResult<EmberRuntime> {
        let config = self.config_loader.load_validated()?;
        if self.init_logging {
            logging::init_from_config(&config.logging);
        }
        EmberRuntime::new(config, self.registry)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ember_core::TextPayload;
    use ember_framework::{Command, Event};

    fn scratch_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ember-runtime-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn builder() -> RuntimeBuilder {
        EmberRuntime::builder()
            .search_path(scratch_dir())
            .without_env()
            .logging(false)
    }

    fn counting_registry(calls: &Arc<AtomicUsize>) -> Registry {
        let mut registry = Registry::new();
        let counter = Arc::clone(calls);
        registry
            .register_command(
                Command::builder()
                    .name("ping")
                    .handler(move |_| {
                        let counter = Arc::clone(&counter);
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            "pong"
                        }
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register_event(Event::builder().event_type("ready").handler(|_| async {}).build().unwrap())
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_settings_applied() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runtime = builder()
            .merge(serde_json::json!({ "commands": { "prefixes": ["?"] } }))
            .registry(counting_registry(&calls))
            .build()
            .unwrap();

        assert_eq!(runtime.registry().settings().prefixes, ["?"]);
        assert!(!runtime.handle_message(TextPayload::new("!ping").boxed()).await.unwrap());
        assert!(runtime.handle_message(TextPayload::new("?ping").boxed()).await.unwrap());
        assert!(runtime.handle_event("ready", TextPayload::default().boxed()).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let err = builder()
            .merge(serde_json::json!({ "cooldown": { "max_times": 0 } }))
            .build()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[tokio::test]
    async fn test_global_cooldown() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut runtime = builder()
            .merge(serde_json::json!({ "cooldown": { "cooldown_ms": 60000, "max_times": 1 } }))
            .registry(counting_registry(&calls))
            .build()
            .unwrap();
        let store = runtime.enable_cooldown().await.unwrap();

        let from = |user: &str| TextPayload::new("!ping").author(user).boxed();
        assert!(runtime.handle_message(from("alice")).await.unwrap());
        assert!(!runtime.handle_message(from("alice")).await.unwrap());
        assert!(runtime.handle_message(from("bob")).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_in_cooldown("alice").await.unwrap());

        let _service = runtime.service();
        assert!(matches!(
            runtime.enable_cooldown().await,
            Err(RuntimeError::RegistryShared)
        ));
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn test_redis_backend_disabled() {
        let config = CooldownConfig {
            backend: CooldownBackend::Redis,
            redis_url: Some("redis://127.0.0.1/".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_cooldown_store(&config).await,
            Err(RuntimeError::BackendDisabled("redis"))
        ));
    }
}
