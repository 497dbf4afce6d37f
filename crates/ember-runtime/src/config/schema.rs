//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ember_cooldown::CooldownPolicy;
use ember_framework::CommandSettings;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmberConfig {
    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// How command lines are recognised.
    #[serde(default)]
    pub commands: CommandSettings,

    /// Rate limiting defaults.
    #[serde(default)]
    pub cooldown: CooldownConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON (`json-log` feature).
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to [`LoggingConfig::file_path`].
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level for every module.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file, used when `output` is `file`.
    pub file_path: Option<PathBuf>,
    pub span_events: SpanEventConfig,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include file names and line numbers.
    pub file_location: bool,
    /// Per-module levels, e.g. `ember_framework = "trace"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            filters: HashMap::new(),
        }
    }
}

// =============================================================================
// Cooldown
// =============================================================================

/// Storage used for cooldown records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CooldownBackend {
    #[default]
    Memory,
    /// Requires the `redis` feature and `redis_url`.
    Redis,
}

/// Cooldown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub backend: CooldownBackend,
    /// Window length in milliseconds.
    pub cooldown_ms: u64,
    /// Uses permitted per window.
    pub max_times: u32,
    /// Connection URL of the redis backend.
    pub redis_url: Option<String>,
    /// First segment of every redis key.
    pub hash_key: String,
    /// Second segment of every redis key, separating stores that share a server.
    pub identifier: String,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            backend: CooldownBackend::Memory,
            cooldown_ms: 1000,
            max_times: 1,
            redis_url: None,
            hash_key: "ember".to_string(),
            identifier: "default".to_string(),
        }
    }
}

impl CooldownConfig {
    pub fn policy(&self) -> CooldownPolicy {
        CooldownPolicy {
            cooldown_ms: self.cooldown_ms,
            max_times: self.max_times,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmberConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.commands.prefixes, ["!"]);
        assert!(config.commands.mention_prefix);
        assert_eq!(config.cooldown.policy(), CooldownPolicy::default());
        assert_eq!(config.cooldown.hash_key, "ember");
    }

    #[test]
    fn test_partial_deserialize() {
        let config: EmberConfig = serde_json::from_value(serde_json::json!({
            "logging": { "level": "debug", "filters": { "ember_framework": "trace" } },
            "cooldown": { "backend": "redis", "redis_url": "redis://127.0.0.1/" }
        }))
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.filters["ember_framework"], LogLevel::Trace);
        assert_eq!(config.cooldown.backend, CooldownBackend::Redis);
        assert_eq!(config.cooldown.max_times, 1);
        assert_eq!(config.commands, CommandSettings::default());
    }
}
